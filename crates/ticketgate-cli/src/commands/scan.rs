//! Door scan command
//!
//! Handles: ticketgate scan [CODE] [--image PATH]
//!
//! With neither a code nor an image, codes are read from stdin one per
//! line, which is how keyboard-mode barcode scanners deliver them.

use std::io::{self, BufRead};
use std::path::Path;

use ticketgate_core::capture::{decode_image, normalize};
use ticketgate_core::{validate, DurableStore, Registry, ScanOutcome};

/// Exit status for a code that was already redeemed
pub const EXIT_ALREADY_USED: i32 = 2;

/// Exit status for an unknown code
pub const EXIT_INVALID: i32 = 3;

/// Execute scan command, returning the process exit status
pub fn execute<S: DurableStore>(
    registry: &mut Registry<S>,
    code: Option<&str>,
    image: Option<&Path>,
    json: bool,
) -> anyhow::Result<i32> {
    if let Some(path) = image {
        return match decode_image(path)? {
            Some(code) => scan_one(registry, &code, json),
            None => {
                println!("No QR code detected. Try a sharper, better lit photo.");
                Ok(0)
            }
        };
    }

    if let Some(code) = code {
        return match normalize(code) {
            Some(code) => scan_one(registry, &code, json),
            None => {
                println!("No code given.");
                Ok(0)
            }
        };
    }

    scan_stdin(registry, json)?;
    Ok(0)
}

fn scan_one<S: DurableStore>(
    registry: &mut Registry<S>,
    code: &str,
    json: bool,
) -> anyhow::Result<i32> {
    let outcome = validate(registry, code)?;
    print_outcome(&outcome, json)?;
    Ok(exit_status(&outcome))
}

/// Validate stdin line by line until EOF
///
/// Lines are decoded lossily: a garbled scan is reported as INVALID and
/// the session carries on.
fn scan_stdin<S: DurableStore>(registry: &mut Registry<S>, json: bool) -> anyhow::Result<()> {
    let mut input = io::stdin().lock();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let Some(code) = normalize(&line) else {
            continue;
        };
        let outcome = validate(registry, &code)?;
        print_outcome(&outcome, json)?;
    }
}

fn print_outcome(outcome: &ScanOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
        return Ok(());
    }

    match outcome.name() {
        Some(name) => println!("{}: {} - {}", outcome.label(), outcome.code(), name),
        None => println!("{}: {}", outcome.label(), outcome.code()),
    }
    Ok(())
}

fn exit_status(outcome: &ScanOutcome) -> i32 {
    match outcome {
        ScanOutcome::Valid { .. } => 0,
        ScanOutcome::AlreadyUsed { .. } => EXIT_ALREADY_USED,
        ScanOutcome::Invalid { .. } => EXIT_INVALID,
    }
}
