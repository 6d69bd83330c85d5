use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::constants;
use crate::error::{PrintLightsError, PrinterError};

/// Raw printer state as reported by PrusaLink.
///
/// States this service does not react to (`STOPPED`, `PAUSED`, `ERROR`, ...)
/// decode as [`PrinterState::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrinterState {
    Idle,
    Printing,
    Busy,
    Finished,
    Attention,
    #[serde(other)]
    Unknown,
}

/// Temperatures and state of the machine itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrinterStatus {
    pub state: PrinterState,
    #[serde(default)]
    pub temp_bed: f64,
    #[serde(default)]
    pub target_bed: f64,
    #[serde(default)]
    pub temp_nozzle: f64,
    #[serde(default)]
    pub target_nozzle: f64,
}

/// Progress of the current job. All zero when no job is loaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobStatus {
    /// Percent complete, 0-100.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub time_remaining: f64,
    #[serde(default)]
    pub time_printing: f64,
}

/// One reading of `GET /api/v1/status`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrinterSnapshot {
    pub printer: PrinterStatus,
    #[serde(default)]
    pub job: Option<JobStatus>,
}

impl PrinterSnapshot {
    /// Job progress, or zeros when the printer reports no job.
    pub fn job_or_default(&self) -> JobStatus {
        self.job.clone().unwrap_or_default()
    }
}

/// Where printer snapshots come from.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Succeeds when the source answers with a success status.
    async fn life_check(&self) -> Result<()>;

    /// Read the current printer snapshot.
    async fn fetch_snapshot(&self) -> Result<PrinterSnapshot>;
}

/// Telemetry client for the PrusaLink local API.
///
/// Every request carries the static API key in the `X-Api-Key` header.
pub struct PrinterService {
    pub api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl PrinterService {
    /// Create a new PrinterService for a PrusaLink instance.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL of the printer (e.g., "http://printer.local")
    /// * `api_key` - PrusaLink API key
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_url,
            api_key,
            client,
        })
    }

    fn status_url(&self) -> String {
        format!("{}{}", self.api_url, constants::PRUSALINK_STATUS_PATH)
    }

    async fn get_status(&self) -> Result<reqwest::Response> {
        let endpoint = self.status_url();
        let response = self
            .client
            .get(&endpoint)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(PrintLightsError::from(PrinterError::AuthenticationFailed {
                api_url: self.api_url.clone(),
            })
            .into());
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PrintLightsError::from(PrinterError::ApiError {
                endpoint,
                status: status.as_u16(),
                message,
            })
            .into());
        }

        Ok(response)
    }
}

#[async_trait]
impl TelemetrySource for PrinterService {
    async fn life_check(&self) -> Result<()> {
        self.get_status().await?;
        Ok(())
    }

    /// Get the current printer status.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails
    /// - PrusaLink returns an error status
    /// - JSON parsing fails
    async fn fetch_snapshot(&self) -> Result<PrinterSnapshot> {
        let snapshot: PrinterSnapshot = self.get_status().await?.json().await?;
        Ok(snapshot)
    }
}
