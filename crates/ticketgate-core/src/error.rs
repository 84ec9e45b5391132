//! Error types for check-in operations

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for check-in operations
pub type CheckinResult<T> = Result<T, CheckinError>;

/// Errors that can occur while issuing or validating tickets
#[derive(Debug, Error)]
pub enum CheckinError {
    /// Code is already registered
    #[error("Invite code '{code}' already exists")]
    DuplicateCode { code: String },

    /// Code is not in the registry
    #[error("Unknown invite code: {code}")]
    UnknownCode { code: String },

    /// Code was redeemed before
    #[error("Invite code '{code}' was already used ({name})")]
    AlreadyUsedCode { code: String, name: String },

    /// No QR code could be read from the capture
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// Ticket artifacts could not be produced
    #[error("Render failure: {0}")]
    RenderFailure(String),

    /// Invitee id, name or code rejected
    #[error("Invalid invitee: {0}")]
    InvalidInvitee(String),

    /// File I/O error
    #[error("I/O error for {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl CheckinError {
    /// Get the error code for CLI output
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateCode { .. } => "DUPLICATE_CODE",
            Self::UnknownCode { .. } => "UNKNOWN_CODE",
            Self::AlreadyUsedCode { .. } => "ALREADY_USED",
            Self::DecodeFailure(_) => "DECODE_FAILURE",
            Self::RenderFailure(_) => "RENDER_FAILURE",
            Self::InvalidInvitee(_) => "VALIDATION_ERROR",
            Self::Io { .. } => "IO_ERROR",
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CheckinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let err = CheckinError::DuplicateCode {
            code: "1-Alice".to_string(),
        };
        assert_eq!(err.code(), "DUPLICATE_CODE");
        assert_eq!(err.to_string(), "Invite code '1-Alice' already exists");

        let err = CheckinError::UnknownCode {
            code: "2-Bob".to_string(),
        };
        assert_eq!(err.code(), "UNKNOWN_CODE");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = CheckinError::io(Path::new("entradas/usados.txt"), &io);
        assert_eq!(err.code(), "IO_ERROR");
        assert!(err.to_string().contains("entradas/usados.txt"));
    }
}
