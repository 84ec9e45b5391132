//! Invite code registry
//!
//! In-memory view of every registered code and its used flag, kept in
//! step with a [`DurableStore`]. Codes are only ever added, and the used
//! flag only ever goes from false to true.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{CheckinError, CheckinResult};
use crate::invite::{validate_code, validate_name, InviteRecord, ScanEvent};
use crate::store::{CodeEntry, DurableStore};

/// Counts of registered, used and remaining codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub used: usize,
    pub remaining: usize,
}

/// Registry of invite codes over a durable store
#[derive(Debug)]
pub struct Registry<S> {
    store: S,
    entries: BTreeMap<String, InviteRecord>,
}

impl<S: DurableStore> Registry<S> {
    /// Create an empty registry without reading the store
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            entries: BTreeMap::new(),
        }
    }

    /// Create a registry and load both the codes and their used flags
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn open(store: S) -> CheckinResult<Self> {
        let mut registry = Self::new(store);
        registry.load()?;
        registry.load_used()?;
        Ok(registry)
    }

    /// Load registered codes from the store. Returns the number of codes read.
    ///
    /// A code listed twice keeps the last name. Used flags already set stay set.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn load(&mut self) -> CheckinResult<usize> {
        let entries = self.store.load()?;
        let count = entries.len();

        for CodeEntry { code, name } in entries {
            let used = self.entries.get(&code).is_some_and(|r| r.used);
            let mut record = InviteRecord::new(code.clone(), name);
            record.used = used;
            self.entries.insert(code, record);
        }

        tracing::debug!(count, "Loaded invite codes");
        Ok(count)
    }

    /// Apply the used-codes store. Returns how many known codes were marked.
    ///
    /// Codes that are not registered are ignored.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read
    pub fn load_used(&mut self) -> CheckinResult<usize> {
        let mut marked = 0;
        for code in self.store.load_used()? {
            match self.entries.get_mut(&code) {
                Some(record) if !record.used => {
                    record.used = true;
                    marked += 1;
                }
                Some(_) => {}
                None => tracing::debug!(code = %code, "Ignoring used marker for unknown code"),
            }
        }

        tracing::debug!(marked, "Applied used markers");
        Ok(marked)
    }

    /// Register a new code
    ///
    /// # Errors
    /// Returns `DuplicateCode` if the code exists, `InvalidInvitee` if the
    /// code or name cannot be stored, or an I/O error from the store
    pub fn register(&mut self, code: &str, name: &str) -> CheckinResult<&InviteRecord> {
        validate_code(code)?;
        validate_name(name)?;

        if self.entries.contains_key(code) {
            return Err(CheckinError::DuplicateCode {
                code: code.to_string(),
            });
        }

        self.store.append(&CodeEntry {
            code: code.to_string(),
            name: name.to_string(),
        })?;

        tracing::info!(code, name, "Registered invite code");
        Ok(self
            .entries
            .entry(code.to_string())
            .or_insert_with(|| InviteRecord::new(code, name)))
    }

    /// Redeem a code: persist the used marker and scan-log row, then flip the flag
    ///
    /// If the store write fails the in-memory flag is left unset, so the
    /// redemption can be retried.
    ///
    /// # Errors
    /// Returns `UnknownCode`, `AlreadyUsedCode`, or an I/O error from the store
    pub fn mark_used(&mut self, code: &str) -> CheckinResult<ScanEvent> {
        let record = self
            .entries
            .get(code)
            .ok_or_else(|| CheckinError::UnknownCode {
                code: code.to_string(),
            })?;

        if record.used {
            return Err(CheckinError::AlreadyUsedCode {
                code: code.to_string(),
                name: record.name.clone(),
            });
        }

        let event = ScanEvent::now(code, record.name.clone());
        self.store.mark(&event)?;

        if let Some(record) = self.entries.get_mut(code) {
            record.used = true;
        }
        Ok(event)
    }

    /// Look up a code
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&InviteRecord> {
        self.entries.get(code)
    }

    /// Whether a code is registered
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Number of registered codes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no codes are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate records ordered by code
    pub fn iter(&self) -> impl Iterator<Item = &InviteRecord> {
        self.entries.values()
    }

    /// Registered, used and remaining counts
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let total = self.entries.len();
        let used = self.entries.values().filter(|r| r.used).count();
        RegistryStats {
            total,
            used,
            remaining: total - used,
        }
    }

    /// Most recent scan-log rows, newest first
    ///
    /// # Errors
    /// Returns an error if the scan log cannot be read
    pub fn recent_scans(&self, limit: usize) -> CheckinResult<Vec<ScanEvent>> {
        let mut events = self.store.scan_events()?;
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Memory store whose redemption writes fail while `fail_marks` is set
    struct FlakyStore {
        inner: MemoryStore,
        fail_marks: Rc<Cell<bool>>,
    }

    impl DurableStore for FlakyStore {
        fn load(&self) -> CheckinResult<Vec<CodeEntry>> {
            self.inner.load()
        }

        fn load_used(&self) -> CheckinResult<Vec<String>> {
            self.inner.load_used()
        }

        fn append(&mut self, entry: &CodeEntry) -> CheckinResult<()> {
            self.inner.append(entry)
        }

        fn mark(&mut self, event: &ScanEvent) -> CheckinResult<()> {
            if self.fail_marks.get() {
                return Err(CheckinError::Io {
                    path: PathBuf::from("entradas/registro_escaneos.csv"),
                    message: "No space left on device".to_string(),
                });
            }
            self.inner.mark(event)
        }

        fn scan_events(&self) -> CheckinResult<Vec<ScanEvent>> {
            self.inner.scan_events()
        }
    }

    #[test]
    fn test_open_applies_used_markers() {
        let store = MemoryStore::with_lines("1-Alice|Alice\n2-Bob|Bob\n")
            .with_used(["2-Bob", "9-Ghost"]);
        let registry = Registry::open(store).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(!registry.get("1-Alice").unwrap().used);
        assert!(registry.get("2-Bob").unwrap().used);
        assert!(!registry.contains("9-Ghost"));
    }

    #[test]
    fn test_duplicate_lines_keep_last_name() {
        let store = MemoryStore::with_lines("1-Alice|Alice\n1-Alice|Alice Smith\n");
        let registry = Registry::open(store).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("1-Alice").unwrap().name, "Alice Smith");
    }

    #[test]
    fn test_register_rejects_duplicates_without_writing() {
        let mut registry = Registry::open(MemoryStore::with_lines("1-Alice|Alice")).unwrap();

        let err = registry.register("1-Alice", "Someone else").unwrap_err();
        assert!(matches!(err, CheckinError::DuplicateCode { .. }));
        assert_eq!(registry.store().codes().len(), 1);
        assert_eq!(registry.get("1-Alice").unwrap().name, "Alice");
    }

    #[test]
    fn test_register_rejects_unstorable_input() {
        let mut registry = Registry::new(MemoryStore::new());
        assert!(registry.register("a|b", "x").is_err());
        assert!(registry.register("", "x").is_err());
        assert!(registry.register("1-Alice", "Alice\nBob").is_err());
        assert!(registry.is_empty());
        assert!(registry.store().codes().is_empty());
    }

    #[test]
    fn test_mark_used_once() {
        let mut registry = Registry::new(MemoryStore::new());
        registry.register("1-Alice", "Alice").unwrap();

        let event = registry.mark_used("1-Alice").unwrap();
        assert_eq!(event.code, "1-Alice");
        assert_eq!(event.name, "Alice");
        assert!(registry.get("1-Alice").unwrap().used);

        let err = registry.mark_used("1-Alice").unwrap_err();
        assert!(matches!(err, CheckinError::AlreadyUsedCode { .. }));
        assert_eq!(registry.store().used(), ["1-Alice".to_string()]);
        assert_eq!(registry.store().events().len(), 1);
    }

    #[test]
    fn test_failed_mark_leaves_code_unused_for_retry() {
        let fail_marks = Rc::new(Cell::new(true));
        let store = FlakyStore {
            inner: MemoryStore::with_lines("1-Alice|Alice"),
            fail_marks: Rc::clone(&fail_marks),
        };
        let mut registry = Registry::open(store).unwrap();

        let err = registry.mark_used("1-Alice").unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
        assert!(!registry.get("1-Alice").unwrap().used);
        assert!(registry.store().inner.events().is_empty());

        fail_marks.set(false);
        let event = registry.mark_used("1-Alice").unwrap();
        assert_eq!(event.name, "Alice");
        assert!(registry.get("1-Alice").unwrap().used);
        assert_eq!(registry.store().inner.events(), [event]);
    }

    #[test]
    fn test_mark_used_unknown() {
        let mut registry = Registry::new(MemoryStore::new());
        let err = registry.mark_used("2-Bob").unwrap_err();
        assert!(matches!(err, CheckinError::UnknownCode { .. }));
        assert!(registry.store().used().is_empty());
    }

    #[test]
    fn test_stats() {
        let store = MemoryStore::with_lines("1-Alice|Alice\n2-Bob|Bob\n3-Carol\n").with_used(["3-Carol"]);
        let registry = Registry::open(store).unwrap();

        assert_eq!(
            registry.stats(),
            RegistryStats {
                total: 3,
                used: 1,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_iter_is_sorted_by_code() {
        let registry = Registry::open(MemoryStore::with_lines("b|B\na|A\nc|C")).unwrap();
        let codes: Vec<_> = registry.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["a", "b", "c"]);
    }
}
