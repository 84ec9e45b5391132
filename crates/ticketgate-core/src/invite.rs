//! Invite records, scan events and code rules

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::error::{CheckinError, CheckinResult};

/// Separator between code and name in the valid-codes store
pub const FIELD_SEPARATOR: char = '|';

/// Timestamp layout written to the scan log
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A registered invite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRecord {
    /// Unique invite code
    pub code: String,
    /// Invitee name (may be empty)
    pub name: String,
    /// Whether the code has been redeemed at the door
    pub used: bool,
}

impl InviteRecord {
    /// Create a new unused record
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            used: false,
        }
    }
}

/// A successful first-time redemption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    /// Local time of the scan
    pub timestamp: NaiveDateTime,
    /// Redeemed code
    pub code: String,
    /// Invitee name at the time of the scan
    pub name: String,
}

impl ScanEvent {
    /// Create an event stamped with the current local time
    ///
    /// The timestamp is truncated to the scan log's microsecond precision,
    /// so the event equals the row it is written as.
    #[must_use]
    pub fn now(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().naive_local().trunc_subsecs(6),
            code: code.into(),
            name: name.into(),
        }
    }

    /// Render as a `timestamp,code,name` scan-log row (without newline)
    #[must_use]
    pub fn to_row(&self) -> String {
        format!(
            "{},{},{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.code,
            self.name
        )
    }

    /// Parse a scan-log row. Returns `None` for malformed rows.
    #[must_use]
    pub fn from_row(row: &str) -> Option<Self> {
        let mut fields = row.trim().splitn(3, ',');
        let timestamp = fields.next()?.trim().parse::<NaiveDateTime>().ok()?;
        let code = fields.next()?.trim();
        if code.is_empty() {
            return None;
        }
        let name = fields.next().unwrap_or_default().trim();
        Some(Self {
            timestamp,
            code: code.to_string(),
            name: name.to_string(),
        })
    }
}

/// Build the invite code for an invitee: `<id>-<name without spaces>`
///
/// # Errors
/// Returns `InvalidInvitee` if either part is empty or the resulting
/// code cannot be used as a file name
pub fn compose_code(id: &str, name: &str) -> CheckinResult<String> {
    let id = id.trim();
    let name = name.trim();
    if id.is_empty() || name.is_empty() {
        return Err(CheckinError::InvalidInvitee(
            "Both name and identifier are required".to_string(),
        ));
    }

    let code = format!("{id}-{}", name.replace(' ', ""));
    validate_file_stem(&code)?;
    validate_code(&code)?;
    Ok(code)
}

/// Validate a code for storage in the line-oriented stores
///
/// # Errors
/// Returns `InvalidInvitee` if the code is empty or would break the file format
pub fn validate_code(code: &str) -> CheckinResult<()> {
    if code.is_empty() {
        return Err(CheckinError::InvalidInvitee("Empty code".to_string()));
    }
    if code.trim() != code {
        return Err(CheckinError::InvalidInvitee(format!(
            "Code has surrounding whitespace: '{code}'"
        )));
    }
    if code.contains(FIELD_SEPARATOR) || code.contains(',') {
        return Err(CheckinError::InvalidInvitee(format!(
            "Code contains a field separator: {code}"
        )));
    }
    if code.chars().any(char::is_control) {
        return Err(CheckinError::InvalidInvitee(
            "Code contains control characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate an invitee name for the valid-codes store
///
/// # Errors
/// Returns `InvalidInvitee` if the name spans more than one line
pub fn validate_name(name: &str) -> CheckinResult<()> {
    if name.contains('\n') || name.contains('\r') {
        return Err(CheckinError::InvalidInvitee(
            "Name cannot contain line breaks".to_string(),
        ));
    }
    Ok(())
}

/// Validate that a code can name the generated QR and PDF files
///
/// # Errors
/// Returns `InvalidInvitee` if the code contains path separators, `..`,
/// a leading dot, or characters invalid in the stores
pub fn validate_file_stem(code: &str) -> CheckinResult<()> {
    validate_code(code)?;

    if code.contains('/') || code.contains('\\') {
        return Err(CheckinError::InvalidInvitee(format!(
            "Code contains path separator: {code}"
        )));
    }
    if code.contains("..") {
        return Err(CheckinError::InvalidInvitee(format!(
            "Code contains parent directory reference: {code}"
        )));
    }
    if code.starts_with('.') {
        return Err(CheckinError::InvalidInvitee(format!(
            "Code cannot start with dot: {code}"
        )));
    }
    Ok(())
}
