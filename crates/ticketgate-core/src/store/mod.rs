//! Durable storage for invite codes, redemptions and the scan log

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::CheckinResult;
use crate::invite::{ScanEvent, FIELD_SEPARATOR};

/// A `code|name` pair read from the valid-codes store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub code: String,
    pub name: String,
}

impl CodeEntry {
    /// Parse one line of the valid-codes store
    ///
    /// Lines without a separator are a bare code with an empty name.
    /// Blank lines yield `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (code, name) = line.split_once(FIELD_SEPARATOR).unwrap_or((line, ""));
        if code.is_empty() {
            return None;
        }

        Some(Self {
            code: code.to_string(),
            name: name.to_string(),
        })
    }

    /// Render as a store line (without newline)
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{}{FIELD_SEPARATOR}{}", self.code, self.name)
    }
}

/// Backing store for a [`crate::registry::Registry`]
///
/// Loads are best-effort: malformed lines are skipped, not reported.
pub trait DurableStore {
    /// Read all registered codes
    ///
    /// # Errors
    /// Returns an error if the store cannot be read at all
    fn load(&self) -> CheckinResult<Vec<CodeEntry>>;

    /// Read all codes recorded as used
    ///
    /// # Errors
    /// Returns an error if the store cannot be read at all
    fn load_used(&self) -> CheckinResult<Vec<String>>;

    /// Persist a newly registered code
    ///
    /// # Errors
    /// Returns an error if the entry cannot be written
    fn append(&mut self, entry: &CodeEntry) -> CheckinResult<()>;

    /// Persist a redemption: the used marker, then the scan-log row
    ///
    /// # Errors
    /// Returns an error if either write fails
    fn mark(&mut self, event: &ScanEvent) -> CheckinResult<()>;

    /// Read the scan log in file order
    ///
    /// # Errors
    /// Returns an error if the log cannot be read at all
    fn scan_events(&self) -> CheckinResult<Vec<ScanEvent>>;
}
