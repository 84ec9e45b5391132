//! ticketgate core - invite registry, door validation and tickets
//!
//! This crate keeps the registry of invite codes over flat-file stores,
//! validates scanned codes, decodes QR photos, and renders PDF tickets.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod capture;
pub mod error;
pub mod invite;
pub mod registry;
pub mod settings;
pub mod store;
pub mod ticket;
pub mod validator;

pub use error::{CheckinError, CheckinResult};
pub use invite::{InviteRecord, ScanEvent};
pub use registry::{Registry, RegistryStats};
pub use settings::Settings;
pub use store::{DurableStore, FileStore, MemoryStore};
pub use ticket::{IssuedTicket, Issuer, PdfTemplateRenderer, TicketRenderer};
pub use validator::{validate, ScanOutcome};
