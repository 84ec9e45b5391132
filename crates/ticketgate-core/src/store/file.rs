//! Flat-file store
//!
//! Three append-only text files: valid codes (`code|name`), used codes
//! (one per line) and the scan log (`timestamp,code,name`). Every write
//! opens the file in append mode, writes one line and closes it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CheckinError, CheckinResult};
use crate::invite::ScanEvent;
use crate::settings::Settings;

use super::{CodeEntry, DurableStore};

/// Store backed by the three text files
#[derive(Debug, Clone)]
pub struct FileStore {
    valid_file: PathBuf,
    used_file: PathBuf,
    scan_log: PathBuf,
}

impl FileStore {
    /// Create a store over explicit file paths. No I/O happens until first use.
    #[must_use]
    pub fn new(valid_file: PathBuf, used_file: PathBuf, scan_log: PathBuf) -> Self {
        Self {
            valid_file,
            used_file,
            scan_log,
        }
    }

    /// Create a store over the paths configured in `settings`
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.valid_file(),
            settings.used_file(),
            settings.scan_log(),
        )
    }

    /// Path of the valid-codes file
    #[must_use]
    pub fn valid_file(&self) -> &Path {
        &self.valid_file
    }

    /// Path of the used-codes file
    #[must_use]
    pub fn used_file(&self) -> &Path {
        &self.used_file
    }

    /// Path of the scan log
    #[must_use]
    pub fn scan_log(&self) -> &Path {
        &self.scan_log
    }
}

impl DurableStore for FileStore {
    fn load(&self) -> CheckinResult<Vec<CodeEntry>> {
        if !self.valid_file.exists() {
            ensure_parent(&self.valid_file)?;
            fs::write(&self.valid_file, "").map_err(|e| CheckinError::io(&self.valid_file, &e))?;
            tracing::info!(path = %self.valid_file.display(), "Created empty valid-codes store");
            return Ok(Vec::new());
        }

        let content = read_lossy(&self.valid_file)?;
        Ok(content.lines().filter_map(CodeEntry::parse).collect())
    }

    fn load_used(&self) -> CheckinResult<Vec<String>> {
        if !self.used_file.exists() {
            return Ok(Vec::new());
        }

        let content = read_lossy(&self.used_file)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn append(&mut self, entry: &CodeEntry) -> CheckinResult<()> {
        append_line(&self.valid_file, &entry.to_line())
    }

    fn mark(&mut self, event: &ScanEvent) -> CheckinResult<()> {
        append_line(&self.used_file, &event.code)?;
        append_line(&self.scan_log, &event.to_row())
    }

    fn scan_events(&self) -> CheckinResult<Vec<ScanEvent>> {
        if !self.scan_log.exists() {
            return Ok(Vec::new());
        }

        let content = read_lossy(&self.scan_log)?;
        let mut events = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match ScanEvent::from_row(line) {
                Some(event) => events.push(event),
                None => tracing::warn!(
                    path = %self.scan_log.display(),
                    line = index + 1,
                    "Skipping unreadable scan-log row"
                ),
            }
        }
        Ok(events)
    }
}

/// Read a file, replacing invalid UTF-8 rather than failing
fn read_lossy(path: &Path) -> CheckinResult<String> {
    let bytes = fs::read(path).map_err(|e| CheckinError::io(path, &e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn ensure_parent(path: &Path) -> CheckinResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CheckinError::io(parent, &e))?;
        }
    }
    Ok(())
}

fn append_line(path: &Path, line: &str) -> CheckinResult<()> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CheckinError::io(path, &e))?;
    writeln!(file, "{line}").map_err(|e| CheckinError::io(path, &e))
}
