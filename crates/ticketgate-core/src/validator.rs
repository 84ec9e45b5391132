//! Door scan validation
//!
//! Decides whether a scanned code admits entry and records the redemption.
//! Matching is exact: no case folding, no fuzzy matching, no retries.

use serde::Serialize;

use crate::capture::normalize;
use crate::error::{CheckinError, CheckinResult};
use crate::registry::Registry;
use crate::store::DurableStore;

/// Result of validating one scanned code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    /// Registered and unused; now marked used
    Valid { code: String, name: String },
    /// Registered but redeemed before
    AlreadyUsed { code: String, name: String },
    /// Not registered
    Invalid { code: String },
}

impl ScanOutcome {
    /// The scanned code
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Valid { code, .. } | Self::AlreadyUsed { code, .. } | Self::Invalid { code } => {
                code
            }
        }
    }

    /// The invitee name, if the code is registered
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Valid { name, .. } | Self::AlreadyUsed { name, .. } => Some(name),
            Self::Invalid { .. } => None,
        }
    }

    /// Whether entry is granted
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Short label for terminal output
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Valid { .. } => "VALID",
            Self::AlreadyUsed { .. } => "ALREADY USED",
            Self::Invalid { .. } => "INVALID",
        }
    }

    /// The error a rejected scan corresponds to, or `None` for a valid one
    #[must_use]
    pub fn rejection(&self) -> Option<CheckinError> {
        match self {
            Self::Valid { .. } => None,
            Self::AlreadyUsed { code, name } => Some(CheckinError::AlreadyUsedCode {
                code: code.clone(),
                name: name.clone(),
            }),
            Self::Invalid { code } => Some(CheckinError::UnknownCode { code: code.clone() }),
        }
    }
}

/// Validate a scanned code against the registry
///
/// Surrounding whitespace is trimmed. A valid code is marked used and
/// persisted before returning, so validating it again yields
/// [`ScanOutcome::AlreadyUsed`]. Rejected codes never touch the store.
///
/// # Errors
/// Returns `DecodeFailure` for empty input, or a store error if the
/// redemption cannot be persisted
pub fn validate<S: DurableStore>(
    registry: &mut Registry<S>,
    input: &str,
) -> CheckinResult<ScanOutcome> {
    let code = normalize(input)
        .ok_or_else(|| CheckinError::DecodeFailure("Scanned text is empty".to_string()))?;

    let status = registry.get(&code).map(|r| (r.used, r.name.clone()));

    let outcome = match status {
        None => ScanOutcome::Invalid { code },
        Some((true, name)) => ScanOutcome::AlreadyUsed { code, name },
        Some((false, _)) => {
            let event = registry.mark_used(&code)?;
            ScanOutcome::Valid {
                code,
                name: event.name,
            }
        }
    };

    match &outcome {
        ScanOutcome::Valid { code, name } => tracing::info!(code, name, "Valid code redeemed"),
        ScanOutcome::AlreadyUsed { code, name } => {
            tracing::warn!(code, name, "Already used code presented");
        }
        ScanOutcome::Invalid { code } => tracing::warn!(code, "Invalid code presented"),
    }

    Ok(outcome)
}
