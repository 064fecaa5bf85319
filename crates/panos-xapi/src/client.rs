//! Asynchronous XML API session implementation.

use crate::response;
use async_trait::async_trait;
use panos_core::client::{ClientConfig, RetryPolicy, COMMIT_POLL_INTERVAL, COMMIT_SYNC_TIMEOUT};
use panos_core::config::DeviceConfig;
use panos_core::{PanDeviceError, Result};
use reqwest::{Client, ClientBuilder};
use secrecy::{ExposeSecret, SecretString};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

const USER_AGENT: &str = concat!("panos-xapi/", env!("CARGO_PKG_VERSION"));

/// The narrow capability surface a provisioning sequence needs from a
/// device: submit one configuration record, and commit.
///
/// Keeping the trait this small makes the session substitutable in tests
/// without mocking the whole XML API conversation.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Submit one configuration element at the given xpath.
    async fn create(&self, xpath: &str, element: &str) -> Result<()>;

    /// Apply the candidate configuration. When `sync` is true the call
    /// blocks until the device finishes the commit job.
    async fn commit(&self, sync: bool) -> Result<()>;
}

/// Builder for [`XapiClient`].
#[derive(Debug)]
pub struct XapiClientBuilder {
    config: DeviceConfig,
    http_config: ClientConfig,
    api_url_override: Option<Url>,
}

impl XapiClientBuilder {
    /// Create a builder from device connection settings.
    #[must_use]
    pub fn new(config: DeviceConfig) -> Self {
        let http_config = ClientConfig::new().with_timeout(config.timeout());
        Self {
            config,
            http_config,
            api_url_override: None,
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Override the transport retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config.retry_policy = retry;
        self
    }

    /// Override the API endpoint URL derived from the device config.
    /// Plain-HTTP endpoints are accepted here.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL cannot be parsed.
    pub fn with_api_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.api_url_override = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Open the session: build the HTTP client and authenticate against
    /// the device, exchanging the configured credentials for an API key.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid, the device is
    /// unreachable, or the device rejects the credentials.
    pub async fn connect(self) -> Result<XapiClient> {
        self.config.ensure_valid()?;

        let api_url = match self.api_url_override {
            Some(url) => url,
            None => self.config.api_url()?,
        };

        let mut builder = ClientBuilder::new()
            .timeout(self.http_config.timeout)
            .connect_timeout(self.http_config.connect_timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host);
        if !self.config.tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|err| PanDeviceError::new(format!("failed to build HTTP client: {err}")))?;

        let transport = Transport {
            http,
            api_url,
            hostname: self.config.hostname.clone(),
            retry_policy: self.http_config.retry_policy,
        };

        info!(host = %transport.hostname, user = %self.config.username, "authenticating");
        let body = transport
            .send(
                "keygen",
                &[
                    ("type", "keygen"),
                    ("user", &self.config.username),
                    ("password", self.config.password()),
                ],
            )
            .await?;
        let key = response::parse_key(&body)?;

        Ok(XapiClient {
            transport,
            key: SecretString::from(key),
        })
    }
}

/// One authenticated XML API session.
///
/// All operations of a run go through a single session; the API key
/// obtained at connect time is attached to every request.
#[derive(Debug)]
pub struct XapiClient {
    transport: Transport,
    key: SecretString,
}

impl XapiClient {
    /// Open a session with default transport settings.
    ///
    /// # Errors
    ///
    /// See [`XapiClientBuilder::connect`].
    pub async fn connect(config: DeviceConfig) -> Result<Self> {
        XapiClientBuilder::new(config).connect().await
    }

    /// Hostname of the connected device.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.transport.hostname
    }

    async fn send_keyed(&self, kind: &str, params: &[(&str, &str)]) -> Result<String> {
        let key = self.key.expose_secret();
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 1);
        form.extend_from_slice(params);
        form.push(("key", key));
        self.transport.send(kind, &form).await
    }

    async fn wait_for_job(&self, job: u64) -> Result<()> {
        let cmd = format!("<show><jobs><id>{job}</id></jobs></show>");
        let deadline = Instant::now() + COMMIT_SYNC_TIMEOUT;

        loop {
            let body = self.send_keyed("op", &[("type", "op"), ("cmd", &cmd)]).await?;
            let status = response::parse_job_status(&body)?;

            if status.finished {
                return match status.result.as_deref() {
                    Some("OK") => Ok(()),
                    other => Err(PanDeviceError::new(format!(
                        "commit job {job} failed: {}",
                        other.unwrap_or("no result reported")
                    ))),
                };
            }
            if Instant::now() >= deadline {
                return Err(PanDeviceError::new(format!(
                    "commit job {job} did not finish within {}s",
                    COMMIT_SYNC_TIMEOUT.as_secs()
                )));
            }

            debug!(
                job,
                progress = status.progress.as_deref().unwrap_or("0"),
                "commit in progress"
            );
            sleep(COMMIT_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl DeviceSession for XapiClient {
    async fn create(&self, xpath: &str, element: &str) -> Result<()> {
        debug!(xpath, "set");
        let body = self
            .send_keyed(
                "config-set",
                &[
                    ("type", "config"),
                    ("action", "set"),
                    ("xpath", xpath),
                    ("element", element),
                ],
            )
            .await?;
        response::ensure_success(&body)
    }

    async fn commit(&self, sync: bool) -> Result<()> {
        info!(host = %self.transport.hostname, sync, "commit");
        let body = self
            .send_keyed("commit", &[("type", "commit"), ("cmd", "<commit></commit>")])
            .await?;

        let Some(job) = response::parse_job_id(&body)? else {
            info!("no pending changes to commit");
            return Ok(());
        };
        if !sync {
            return Ok(());
        }
        self.wait_for_job(job).await
    }
}

/// HTTP transport shared by the authentication handshake and the keyed
/// session. Requests are form-encoded POSTs so that credentials and the
/// API key never appear in URLs.
#[derive(Debug)]
struct Transport {
    http: Client,
    api_url: Url,
    hostname: String,
    retry_policy: RetryPolicy,
}

impl Transport {
    /// Issue one API request, retrying transport-level failures (connect
    /// errors, timeouts, HTTP 5xx) per the retry policy. Device-level
    /// failures arrive as XML envelopes, often with 4xx statuses, and are
    /// returned to the caller for parsing without any retry.
    async fn send(&self, kind: &str, form: &[(&str, &str)]) -> Result<String> {
        let mut last_error: Option<PanDeviceError> = None;
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = self.retry_policy.delay_for_attempt(attempt);
                if delay > Duration::ZERO {
                    debug!(kind, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                    sleep(delay).await;
                }
            }
            info!(host = %self.hostname, kind, attempt, "XML API request");

            match self.http.post(self.api_url.clone()).form(&form).send().await {
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await.map_err(|err| {
                        PanDeviceError::new(format!("failed to read device response: {err}"))
                    })?;

                    if status.is_server_error() {
                        last_error =
                            Some(PanDeviceError::new(format!("device HTTP error {status}")));
                    } else {
                        return Ok(text);
                    }
                }
                Err(err) => last_error = Some(PanDeviceError::from(err)),
            }

            attempt += 1;
            if attempt > self.retry_policy.max_retries {
                break;
            }
        }

        Err(last_error
            .unwrap_or_else(|| PanDeviceError::new("request failed after exhausting retries")))
    }
}
