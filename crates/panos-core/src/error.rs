//! The device error kind.
//!
//! The XML API reports every failure class through the same response
//! envelope, so one error kind covers the whole conversation with a device:
//! rejected credentials, malformed requests, duplicate object names,
//! dangling references and commit failures all arrive the same way.
//! Transport failures are folded into the same kind with a descriptive
//! message.

use thiserror::Error;

/// Error raised for any failure while talking to a PAN-OS device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PanDeviceError {
    message: String,
}

/// Specialized result type for device operations.
pub type Result<T> = std::result::Result<T, PanDeviceError>;

impl PanDeviceError {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Create an error from a response envelope's status line.
    ///
    /// The numeric device code, when present, is appended to the message
    /// rather than surfaced as structured data.
    #[must_use]
    pub fn from_device(code: Option<&str>, message: &str) -> Self {
        let message = message.trim();
        match (code, message.is_empty()) {
            (Some(code), false) => Self::new(format!("{message} (code {code})")),
            (Some(code), true) => Self::new(format!("device returned error code {code}")),
            (None, false) => Self::new(message),
            (None, true) => Self::new("device returned an unspecified error"),
        }
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// Conversions from external error types. All of them collapse into the
// single kind; the original cause survives only in the message text.
impl From<reqwest::Error> for PanDeviceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::new(format!("connection failed: {err}"))
        } else {
            Self::new(format!("request failed: {err}"))
        }
    }
}

impl From<url::ParseError> for PanDeviceError {
    fn from(err: url::ParseError) -> Self {
        Self::new(format!("invalid endpoint: {err}"))
    }
}

impl From<validator::ValidationErrors> for PanDeviceError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::new(format!("invalid configuration: {err}"))
    }
}
