//! Check-in flow tests over the flat-file store
//!
//! Registration, reload and door validation against real files on disk.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use ticketgate_core::store::CodeEntry;
use ticketgate_core::{validate, CheckinError, FileStore, Registry, ScanOutcome, Settings};

fn open_registry(data_dir: &Path) -> Registry<FileStore> {
    let settings = Settings::with_data_dir(data_dir);
    Registry::open(FileStore::from_settings(&settings)).expect("Failed to open registry")
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

#[test]
fn test_door_scenario() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings::with_data_dir(temp.path());
    let mut registry = open_registry(temp.path());
    assert!(registry.is_empty());

    registry.register("1-Alice", "Alice").expect("Failed to register");

    let outcome = validate(&mut registry, "1-Alice").expect("Validation failed");
    assert_eq!(
        outcome,
        ScanOutcome::Valid {
            code: "1-Alice".to_string(),
            name: "Alice".to_string(),
        }
    );
    assert_eq!(read(&settings.used_file()), "1-Alice\n");
    let log = read(&settings.scan_log());
    assert_eq!(log.lines().count(), 1);
    assert!(log.trim_end().ends_with(",1-Alice,Alice"));

    let outcome = validate(&mut registry, "1-Alice").expect("Validation failed");
    assert!(matches!(outcome, ScanOutcome::AlreadyUsed { .. }));

    let valid_before = read(&settings.valid_file());
    let used_before = read(&settings.used_file());
    let log_before = read(&settings.scan_log());

    let outcome = validate(&mut registry, "2-Bob").expect("Validation failed");
    assert_eq!(
        outcome,
        ScanOutcome::Invalid {
            code: "2-Bob".to_string()
        }
    );
    assert_eq!(read(&settings.valid_file()), valid_before);
    assert_eq!(read(&settings.used_file()), used_before);
    assert_eq!(read(&settings.scan_log()), log_before);
    assert!(!registry.contains("2-Bob"));
}

#[test]
fn test_registration_survives_reload() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    {
        let mut registry = open_registry(temp.path());
        registry.register("1-Alice", "Alice Smith").unwrap();
        registry.register("VIP", "").unwrap();
    }

    let registry = open_registry(temp.path());
    let alice = registry.get("1-Alice").expect("Alice should be registered");
    assert_eq!(alice.name, "Alice Smith");
    assert!(!alice.used);

    let vip = registry.get("VIP").expect("VIP should be registered");
    assert_eq!(vip.name, "");
    assert!(!vip.used);
}

#[test]
fn test_hand_written_store_round_trip() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings::with_data_dir(temp.path());
    fs::create_dir_all(temp.path().join("qrs")).unwrap();

    let entry = CodeEntry {
        code: "12-Marta".to_string(),
        name: "Marta Ruiz".to_string(),
    };
    fs::write(settings.valid_file(), format!("{}\n", entry.to_line())).unwrap();

    let registry = open_registry(temp.path());
    let record = registry.get("12-Marta").unwrap();
    assert_eq!(record.name, "Marta Ruiz");
    assert!(!record.used);
}

#[test]
fn test_used_state_survives_reload() {
    let temp = TempDir::new().expect("Failed to create temp dir");

    {
        let mut registry = open_registry(temp.path());
        registry.register("1-Alice", "Alice").unwrap();
        registry.register("2-Bob", "Bob").unwrap();
        registry.mark_used("1-Alice").unwrap();
    }

    let mut registry = open_registry(temp.path());
    assert!(registry.get("1-Alice").unwrap().used);
    assert!(!registry.get("2-Bob").unwrap().used);

    let err = registry.mark_used("1-Alice").unwrap_err();
    assert!(matches!(err, CheckinError::AlreadyUsedCode { .. }));
    assert!(validate(&mut registry, "2-Bob").unwrap().is_valid());
}

#[test]
fn test_duplicate_registration_leaves_store_untouched() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings::with_data_dir(temp.path());
    let mut registry = open_registry(temp.path());

    registry.register("1-Alice", "Alice").unwrap();
    let before = read(&settings.valid_file());

    let err = registry.register("1-Alice", "Alice again").unwrap_err();
    assert_eq!(err.code(), "DUPLICATE_CODE");
    assert_eq!(read(&settings.valid_file()), before);
}

#[test]
fn test_used_file_edits_are_respected() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings::with_data_dir(temp.path());
    fs::create_dir_all(temp.path().join("qrs")).unwrap();
    fs::create_dir_all(temp.path().join("entradas")).unwrap();
    fs::write(settings.valid_file(), "1-Alice|Alice\n\n2-Bob\n").unwrap();
    fs::write(settings.used_file(), "2-Bob\n99-Nobody\n").unwrap();

    let mut registry = open_registry(temp.path());
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.stats().used, 1);

    let outcome = validate(&mut registry, "2-Bob").unwrap();
    assert_eq!(outcome.name(), Some(""));
    assert!(matches!(outcome, ScanOutcome::AlreadyUsed { .. }));
}

#[test]
fn test_recent_scans_newest_first() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings::with_data_dir(temp.path());
    fs::create_dir_all(temp.path().join("entradas")).unwrap();
    fs::write(
        settings.scan_log(),
        "2025-11-02T21:00:00,1-Alice,Alice\n2025-11-02T23:30:00,3-Carol,Carol\n2025-11-02T22:15:00,2-Bob,Bob\n",
    )
    .unwrap();

    let registry = open_registry(temp.path());
    let scans = registry.recent_scans(2).unwrap();
    let codes: Vec<_> = scans.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(codes, ["3-Carol", "2-Bob"]);
}
