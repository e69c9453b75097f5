use thiserror::Error;
use tracing::{error, warn};

use crate::accelerator::AcceleratorParseError;

/// Portal response codes returned with every request reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Success,
    /// The user (or the confirmation policy) declined the request
    Cancelled,
    /// Unknown session, missing compositor capability, or other failure
    Other,
}

impl Response {
    pub fn code(self) -> u32 {
        match self {
            Self::Success => 0,
            Self::Cancelled => 1,
            Self::Other => 2,
        }
    }
}

/// Session lookup failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(String),
}

/// Request-level failures. These are answered before any per-shortcut work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("compositor input trigger capabilities are not available")]
    CapabilityUnavailable,

    #[error("user declined the shortcut request")]
    UserDeclined,
}

impl From<SessionError> for RequestError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(handle) => Self::SessionNotFound(handle),
        }
    }
}

impl RequestError {
    pub fn response(&self) -> Response {
        match self {
            Self::SessionNotFound(_) | Self::CapabilityUnavailable => Response::Other,
            Self::UserDeclined => Response::Cancelled,
        }
    }
}

/// Per-shortcut failures. The batch coordinator absorbs these: the shortcut is
/// simply left out of the result set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("no trigger chosen for shortcut")]
    NoTriggerChosen,

    #[error("invalid accelerator '{accelerator}': {source}")]
    AcceleratorInvalid {
        accelerator: String,
        #[source]
        source: AcceleratorParseError,
    },

    #[error("compositor rejected trigger registration")]
    TriggerRegistrationFailed,

    #[error("compositor failed to bind action")]
    ActionBindingFailed,
}

/// Why a rebind left the shortcut unbound.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("session '{0}' not found")]
    SessionNotFound(String),

    #[error("shortcut '{shortcut_id}' is not bound in session '{session}'")]
    ShortcutNotFound { session: String, shortcut_id: String },

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("session closed while the shortcut was being rebound")]
    SessionClosed,
}

/// Failures that stop the service from starting.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    #[error("Wayland connection failed: {0}")]
    Wayland(String),

    #[error("D-Bus setup failed: {0}")]
    Dbus(#[from] zbus::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GatekeeperError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the caller has nobody to report to.
///
/// # Examples
///
/// ```ignore
/// use gatekeeper::error::ResultExt;
///
/// // Client may already be gone; nothing to do about it
/// connection.call_method(..).await.warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_codes() {
        assert_eq!(Response::Success.code(), 0);
        assert_eq!(Response::Cancelled.code(), 1);
        assert_eq!(Response::Other.code(), 2);
    }

    #[test]
    fn test_request_error_responses() {
        assert_eq!(
            RequestError::SessionNotFound("/s".into()).response(),
            Response::Other
        );
        assert_eq!(RequestError::CapabilityUnavailable.response(), Response::Other);
        assert_eq!(RequestError::UserDeclined.response(), Response::Cancelled);
    }

    #[test]
    fn test_session_error_converts_to_request_error() {
        let err: RequestError = SessionError::NotFound("/s/1".into()).into();
        assert_eq!(err, RequestError::SessionNotFound("/s/1".into()));
        assert_eq!(err.response().code(), 2);
    }

    #[test]
    fn test_log_err_passes_value_through() {
        let ok: std::result::Result<u32, String> = Ok(7);
        assert_eq!(ok.log_err(), Some(7));
        let err: std::result::Result<u32, String> = Err("boom".into());
        assert_eq!(err.warn_on_err(), None);
    }
}
