//! Ticket issuing: invite code, QR image and PDF ticket

pub mod pdf;
pub mod qr;

pub use pdf::PdfTemplateRenderer;

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{CheckinError, CheckinResult};
use crate::invite::{compose_code, validate_file_stem};
use crate::registry::Registry;
use crate::settings::Settings;
use crate::store::DurableStore;

/// Produces a printable ticket for a code
pub trait TicketRenderer {
    /// Render the ticket and return the path of the written file
    ///
    /// # Errors
    /// Returns `RenderFailure` if the template or an asset is missing
    fn render(&self, code: &str, name: &str) -> CheckinResult<PathBuf>;
}

/// Artifacts produced for one invitee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedTicket {
    pub code: String,
    pub name: String,
    pub qr_path: PathBuf,
    pub ticket_path: PathBuf,
}

/// Registers invitees and writes their QR image and ticket
#[derive(Debug, Clone)]
pub struct Issuer<R> {
    renderer: R,
    qr_dir: PathBuf,
}

impl Issuer<PdfTemplateRenderer> {
    /// Issuer using the configured PDF template and directories
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(PdfTemplateRenderer::from_settings(settings), settings.qr_dir())
    }
}

impl<R: TicketRenderer> Issuer<R> {
    #[must_use]
    pub fn new(renderer: R, qr_dir: PathBuf) -> Self {
        Self { renderer, qr_dir }
    }

    /// Where the QR image for `code` is written
    #[must_use]
    pub fn qr_path(&self, code: &str) -> PathBuf {
        self.qr_dir.join(format!("{code}.png"))
    }

    /// Register an invitee and produce their ticket
    ///
    /// The code is `<id>-<name without spaces>`. Nothing is written if the
    /// code already exists, and the QR image is removed again if the code
    /// cannot be stored. A render failure leaves the code registered, so
    /// the ticket can be produced later with [`Issuer::reissue`].
    ///
    /// # Errors
    /// Returns `InvalidInvitee`, `DuplicateCode`, `RenderFailure`, or an I/O error
    pub fn issue<S: DurableStore>(
        &self,
        registry: &mut Registry<S>,
        id: &str,
        name: &str,
    ) -> CheckinResult<IssuedTicket> {
        let code = compose_code(id, name)?;
        let name = name.trim();

        if registry.contains(&code) {
            tracing::warn!(code = %code, "Code already exists");
            return Err(CheckinError::DuplicateCode { code });
        }

        let qr_path = self.qr_path(&code);
        qr::write_png(&code, &qr_path)?;
        if let Err(e) = registry.register(&code, name) {
            if let Err(remove_err) = std::fs::remove_file(&qr_path) {
                tracing::warn!(
                    path = %qr_path.display(),
                    error = %remove_err,
                    "Cannot remove QR image"
                );
            }
            return Err(e);
        }
        tracing::info!(code = %code, name, "QR generated");

        let ticket_path = self.renderer.render(&code, name)?;

        Ok(IssuedTicket {
            code,
            name: name.to_string(),
            qr_path,
            ticket_path,
        })
    }

    /// Produce the QR image and ticket again for a registered code
    ///
    /// # Errors
    /// Returns `UnknownCode`, `InvalidInvitee` if the code cannot name a
    /// file, `RenderFailure`, or an I/O error
    pub fn reissue<S: DurableStore>(
        &self,
        registry: &Registry<S>,
        code: &str,
    ) -> CheckinResult<IssuedTicket> {
        let record = registry.get(code).ok_or_else(|| CheckinError::UnknownCode {
            code: code.to_string(),
        })?;
        validate_file_stem(code)?;

        let qr_path = self.qr_path(code);
        qr::write_png(code, &qr_path)?;
        let ticket_path = self.renderer.render(code, &record.name)?;

        Ok(IssuedTicket {
            code: code.to_string(),
            name: record.name.clone(),
            qr_path,
            ticket_path,
        })
    }
}
