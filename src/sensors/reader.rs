//! Sensor Reader
//!
//! Calibrates the gas sensors once, then turns raw samples from a
//! [`SensorSource`] into derived readings.

use super::source::{read_sample, SensorSource};
use anyhow::Result;
use labsense_shared::sensors::{self, Calibration, GasSensor, Readings};
use std::time::Duration;
use tracing::{debug, info};

/// Owns the sensor source and the latest derived values
pub struct SensorReader {
    source: Box<dyn SensorSource>,
    calibration: Calibration,
    latest: Option<Readings>,
    wind_speed: f64,
}

impl SensorReader {
    pub fn new(source: Box<dyn SensorSource>) -> Self {
        Self {
            source,
            calibration: Calibration::default(),
            latest: None,
            wind_speed: 0.0,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Average `samples` clean-air reads per sensor into R0
    pub async fn calibrate(&mut self, samples: usize, delay: Duration) -> Result<Calibration> {
        for sensor in GasSensor::ALL {
            let mut counts = Vec::with_capacity(samples);
            for _ in 0..samples {
                counts.push(self.source.read_adc(sensor).await?);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            let r0 = sensors::calibrate(&counts, sensor.load_resistance());
            info!("Calibrated {}: R0={:.3} kΩ", sensor, r0);
            self.calibration.set(sensor, r0);
        }
        Ok(self.calibration)
    }

    /// Read every sensor and derive concentrations
    pub async fn sample(&mut self) -> Result<Readings> {
        let raw = read_sample(self.source.as_mut()).await?;
        let readings = Readings::from_sample(&raw, &self.calibration);
        debug!(
            "Sample: T={:.1} H={:.1} smoke={} co={} lpg={} ica={}",
            readings.temperature,
            readings.humidity,
            readings.smoke_ppm,
            readings.co_ppm,
            readings.lpg_ppm,
            readings.ica
        );
        self.latest = Some(readings);
        Ok(readings)
    }

    /// Close the current anemometer window
    pub async fn measure_wind(&mut self) -> Result<f64> {
        let pulses = self.source.take_pulses().await?;
        self.wind_speed = sensors::wind_speed(pulses);
        Ok(self.wind_speed)
    }

    pub fn latest(&self) -> Option<Readings> {
        self.latest
    }

    pub fn wind_speed(&self) -> f64 {
        self.wind_speed
    }

    pub async fn set_siren(&mut self, on: bool) -> Result<()> {
        self.source.set_siren(on).await
    }
}
