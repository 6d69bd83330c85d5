use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::constants;
use crate::error::{LightError, PrintLightsError};
use crate::profiles::RenderCommand;

/// Where render commands go.
#[async_trait]
pub trait LightSink: Send + Sync {
    /// Succeeds when the sink answers with a success status.
    async fn life_check(&self) -> Result<()>;

    /// Apply a render command to the display.
    async fn apply(&self, command: &RenderCommand) -> Result<()>;
}

/// WLED controller client.
///
/// Speaks the WLED JSON API: `GET /json/info` for liveness and
/// `POST /json` with a full state document for rendering.
pub struct WledService {
    base_url: String,
    client: reqwest::Client,
}

impl WledService {
    /// Create a new WledService for the controller at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the controller (e.g., "http://wled.local")
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ensure_success(endpoint: String, response: &reqwest::Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(PrintLightsError::from(LightError::ApiError {
                endpoint,
                status: response.status().as_u16(),
            })
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl LightSink for WledService {
    async fn life_check(&self) -> Result<()> {
        let endpoint = format!("{}{}", self.base_url, constants::WLED_INFO_PATH);
        let response = self.client.get(&endpoint).send().await?;
        Self::ensure_success(endpoint, &response)
    }

    /// Post a state document to the controller.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails
    /// - WLED returns an error status
    async fn apply(&self, command: &RenderCommand) -> Result<()> {
        let endpoint = format!("{}{}", self.base_url, constants::WLED_STATE_PATH);
        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(command)
            .send()
            .await?;
        Self::ensure_success(endpoint, &response)
    }
}
