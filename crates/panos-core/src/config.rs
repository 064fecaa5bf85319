//! Connection settings for a PAN-OS management endpoint.

use crate::error::{PanDeviceError, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::Validate;

const fn default_port() -> u16 {
    443
}

const fn default_request_timeout_secs() -> u64 {
    120
}

/// Connection settings for a single device's XML management API.
///
/// The password is held as a [`SecretString`]: it is never serialized,
/// and debug output redacts it.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeviceConfig {
    /// Hostname or IP address of the management interface
    #[validate(length(min = 1))]
    pub hostname: String,

    /// API username
    #[validate(length(min = 1))]
    pub username: String,

    /// API password
    #[serde(skip_serializing)]
    pub password: SecretString,

    /// HTTPS port of the XML API
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to verify the device TLS certificate. Appliances ship with
    /// self-signed management certificates, so verification is opt-in.
    #[serde(default)]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl DeviceConfig {
    /// Create a configuration from the three required credentials.
    ///
    /// # Errors
    ///
    /// Returns an error when the hostname or username is empty.
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            hostname: hostname.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            port: default_port(),
            tls_verify: false,
            request_timeout_secs: default_request_timeout_secs(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Set the XML API port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// The request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The password in the clear, for building an authentication request.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// The XML API endpoint for this device.
    ///
    /// # Errors
    ///
    /// Returns an error when the hostname does not form a valid URL.
    pub fn api_url(&self) -> Result<Url> {
        let url = Url::parse(&format!("https://{}:{}/api/", self.hostname, self.port))?;
        Ok(url)
    }

    /// Re-run validation, e.g. after deserializing from a file.
    ///
    /// # Errors
    ///
    /// Returns an error describing the offending fields.
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(PanDeviceError::from)
    }
}
