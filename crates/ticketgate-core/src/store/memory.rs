//! In-memory store (for testing and dry runs)

use crate::error::CheckinResult;
use crate::invite::ScanEvent;

use super::{CodeEntry, DurableStore};

/// Store that keeps everything in vectors
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    codes: Vec<CodeEntry>,
    used: Vec<String>,
    events: Vec<ScanEvent>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the valid-codes store with `code|name` lines
    #[must_use]
    pub fn with_lines(lines: &str) -> Self {
        Self {
            codes: lines.lines().filter_map(CodeEntry::parse).collect(),
            ..Self::default()
        }
    }

    /// Seed the used-codes store
    #[must_use]
    pub fn with_used<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.used.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Entries appended so far, including seeded ones
    #[must_use]
    pub fn codes(&self) -> &[CodeEntry] {
        &self.codes
    }

    /// Codes marked as used so far
    #[must_use]
    pub fn used(&self) -> &[String] {
        &self.used
    }

    /// Scan-log rows so far
    #[must_use]
    pub fn events(&self) -> &[ScanEvent] {
        &self.events
    }
}

impl DurableStore for MemoryStore {
    fn load(&self) -> CheckinResult<Vec<CodeEntry>> {
        Ok(self.codes.clone())
    }

    fn load_used(&self) -> CheckinResult<Vec<String>> {
        Ok(self.used.clone())
    }

    fn append(&mut self, entry: &CodeEntry) -> CheckinResult<()> {
        self.codes.push(entry.clone());
        Ok(())
    }

    fn mark(&mut self, event: &ScanEvent) -> CheckinResult<()> {
        self.used.push(event.code.clone());
        self.events.push(event.clone());
        Ok(())
    }

    fn scan_events(&self) -> CheckinResult<Vec<ScanEvent>> {
        Ok(self.events.clone())
    }
}
