//! A ready-made I/O-bound task unit: URL health checks.
//!
//! Each invocation carries its own request deadline, so a stuck endpoint
//! costs one failed result, never a blocked worker. The checker holds one
//! shared blocking client and is safe to call from every worker at once.

use std::time::Duration;

use thiserror::Error;

/// Default per-request deadline, matching the usual health-check budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("client setup failed: {0}")]
    Client(String),
}

/// Successful probe of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub url: String,
    pub status: u16,
}

/// Probes URLs with a bounded per-request deadline.
pub struct HealthCheck {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HealthCheck {
    pub fn new(timeout: Duration) -> Result<Self, HealthError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HealthError::Client(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    pub fn with_default_timeout() -> Result<Self, HealthError> {
        Self::new(DEFAULT_TIMEOUT)
    }

    /// Issues one GET and classifies the response. A non-success status is
    /// a [`HealthError::Status`]; the body is not read.
    pub fn check(&self, url: &str) -> Result<HealthReport, HealthError> {
        let response = self.client.get(url).send().map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HealthError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(HealthReport {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }

    fn classify(&self, err: reqwest::Error) -> HealthError {
        if err.is_timeout() {
            HealthError::Timeout(self.timeout)
        } else {
            HealthError::Connect(err.to_string())
        }
    }
}
