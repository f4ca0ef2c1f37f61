use std::time::Duration;

use thiserror::Error;

/// Longest lifetime a drop may request: 24 hours.
pub const MAX_EXPIRES_IN: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors from parsing an `expires_in` request field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpiresInError {
    /// The string did not parse as a duration.
    #[error("invalid duration format (use e.g. 30m, 24h)")]
    Invalid,

    /// The duration parsed but is zero.
    #[error("expiry duration must be greater than zero")]
    Zero,

    /// The duration parsed but exceeds the 24 hour cap.
    #[error("maximum expiry is 24 hours")]
    ExceedsMax,
}

/// Parse and validate an `expires_in` duration string such as `"24h"`,
/// `"30m"`, or `"90s"`.
///
/// The duration must be strictly positive and at most [`MAX_EXPIRES_IN`].
pub fn parse_expires_in(raw: &str) -> Result<Duration, ExpiresInError> {
    let duration = humantime::parse_duration(raw.trim()).map_err(|_| ExpiresInError::Invalid)?;
    if duration.is_zero() {
        return Err(ExpiresInError::Zero);
    }
    if duration > MAX_EXPIRES_IN {
        return Err(ExpiresInError::ExceedsMax);
    }
    Ok(duration)
}
