use carefind_core::{Locale, UserMessage};
use thiserror::Error;

/// Failure reported by a platform location sensor for one fix request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location fix timed out")]
    Timeout,

    #[error("location sensor unavailable: {0}")]
    Unavailable(String),
}

/// Failure surfaced to callers of [`crate::LocationAcquirer::acquire`].
///
/// `Clone` so every waiter on a coalesced acquisition receives the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user has not granted location access. Fatal; never retried.
    #[error("location permission denied")]
    PermissionDenied,

    /// No usable fix arrived within the attempt budget.
    #[error("timed out waiting for a location fix")]
    Timeout,

    /// The device or platform has no location capability. Fatal.
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

impl LocationError {
    /// Localized, actionable text for the end user.
    #[must_use]
    pub fn user_message(&self, locale: Locale) -> &'static str {
        let message = match self {
            LocationError::PermissionDenied => UserMessage::LocationPermissionDenied,
            LocationError::Timeout => UserMessage::LocationTimeout,
            LocationError::Unavailable(_) => UserMessage::LocationUnavailable,
        };
        message.text(locale)
    }
}

impl From<SensorError> for LocationError {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::PermissionDenied => LocationError::PermissionDenied,
            SensorError::Timeout => LocationError::Timeout,
            SensorError::Unavailable(reason) => LocationError::Unavailable(reason),
        }
    }
}
