//! Ticket issuing commands
//!
//! Handles: ticketgate issue/render

use ticketgate_core::{FileStore, IssuedTicket, Issuer, Registry, Settings};

/// Register an invitee and write their QR image and ticket
pub fn issue(
    settings: &Settings,
    registry: &mut Registry<FileStore>,
    id: &str,
    name: &str,
    json: bool,
) -> anyhow::Result<()> {
    let issuer = Issuer::from_settings(settings);
    let ticket = issuer.issue(registry, id, name)?;
    print_ticket(&ticket, json)
}

/// Regenerate the artifacts for a registered code
pub fn render(
    settings: &Settings,
    registry: &Registry<FileStore>,
    code: &str,
    json: bool,
) -> anyhow::Result<()> {
    let issuer = Issuer::from_settings(settings);
    let ticket = issuer.reissue(registry, code)?;
    print_ticket(&ticket, json)
}

fn print_ticket(ticket: &IssuedTicket, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(ticket)?);
    } else {
        println!("QR generated: {} ({})", ticket.code, ticket.name);
        println!("  QR image: {}", ticket.qr_path.display());
        println!("  Ticket:   {}", ticket.ticket_path.display());
    }
    Ok(())
}
