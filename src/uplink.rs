//! Webhook uplink - posts readings to the LABSense server

use anyhow::{anyhow, Result};
use labsense_shared::{sensors::Readings, TelemetryRecord};
use serde::Serialize;
use std::time::Duration;

/// Body posted for each upload: the stored fields plus the wind speed
#[derive(Debug, Serialize)]
pub struct UplinkPayload {
    #[serde(flatten)]
    pub record: TelemetryRecord,
    pub wind_speed: f64,
}

impl UplinkPayload {
    pub fn new(readings: &Readings, wind_speed: f64) -> Self {
        Self {
            record: readings.to_record(),
            wind_speed,
        }
    }
}

/// HTTP client for the ingestion endpoint
pub struct WebhookUplink {
    url: String,
    client: reqwest::Client,
}

impl WebhookUplink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post one payload; any non-success status is an error
    pub async fn send(&self, payload: &UplinkPayload) -> Result<()> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Webhook returned {}", status));
        }
        Ok(())
    }
}
