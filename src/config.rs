//! Node configuration, read from the environment

use anyhow::{anyhow, Result};
use labsense_shared::sensors::CALIBRATION_SAMPLES;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the sensor node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Device ID used in log lines
    pub device_id: String,
    /// Ingestion endpoint of the webhook server
    pub webhook_url: String,
    /// Period between sensor samples
    pub sample_interval: Duration,
    /// Period between uploads
    pub upload_interval: Duration,
    /// Anemometer counting window
    pub wind_interval: Duration,
    /// Per-request upload timeout
    pub upload_timeout: Duration,
    /// Clean-air reads per sensor at startup
    pub calibration_samples: usize,
    /// Pause between calibration reads
    pub calibration_delay: Duration,
    /// Simulated gas event as (first sample, sample count)
    pub gas_event: Option<(u64, u64)>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: "labsense-001".into(),
            webhook_url: "http://127.0.0.1:8080/".into(),
            sample_interval: Duration::from_millis(2000),
            upload_interval: Duration::from_millis(5000),
            wind_interval: Duration::from_millis(1000),
            upload_timeout: Duration::from_millis(5000),
            calibration_samples: CALIBRATION_SAMPLES,
            calibration_delay: Duration::from_millis(100),
            gas_event: None,
        }
    }
}

impl NodeConfig {
    /// Build from `LABSENSE_*` variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let gas_event = match lookup("LABSENSE_SIMULATE_GAS") {
            Some(raw) => Some(parse_window(&raw)?),
            None => defaults.gas_event,
        };

        Ok(Self {
            device_id: lookup("LABSENSE_DEVICE_ID").unwrap_or(defaults.device_id),
            webhook_url: lookup("LABSENSE_WEBHOOK_URL").unwrap_or(defaults.webhook_url),
            sample_interval: millis_or(&lookup, "LABSENSE_SAMPLE_INTERVAL_MS", defaults.sample_interval)?,
            upload_interval: millis_or(&lookup, "LABSENSE_UPLOAD_INTERVAL_MS", defaults.upload_interval)?,
            wind_interval: millis_or(&lookup, "LABSENSE_WIND_INTERVAL_MS", defaults.wind_interval)?,
            upload_timeout: millis_or(&lookup, "LABSENSE_UPLOAD_TIMEOUT_MS", defaults.upload_timeout)?,
            calibration_samples: parse_or(
                &lookup,
                "LABSENSE_CALIBRATION_SAMPLES",
                defaults.calibration_samples,
            )?,
            calibration_delay: Duration::from_millis(parse_or(
                &lookup,
                "LABSENSE_CALIBRATION_DELAY_MS",
                defaults.calibration_delay.as_millis() as u64,
            )?),
            gas_event,
        })
    }
}

/// `start:len`, both in samples
fn parse_window(raw: &str) -> Result<(u64, u64)> {
    let (start, len) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| anyhow!("invalid LABSENSE_SIMULATE_GAS={:?}: expected start:len", raw))?;
    let start = start.trim().parse::<u64>()?;
    let len = len.trim().parse::<u64>()?;
    Ok((start, len))
}

fn millis_or<F>(lookup: &F, name: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let ms = parse_or(lookup, name, default.as_millis() as u64)?;
    if ms == 0 {
        return Err(anyhow!("{} must be greater than zero", name));
    }
    Ok(Duration::from_millis(ms))
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {}={:?}: {}", name, raw, e)),
        None => Ok(default),
    }
}
