//! Sensor source abstraction for pluggable hardware backends

use anyhow::Result;
use async_trait::async_trait;
use labsense_shared::sensors::{GasSensor, RawSample};

/// A board that exposes the LABSense sensors and the siren output
#[async_trait]
pub trait SensorSource: Send {
    /// Raw ADC count from one MQ sensor
    async fn read_adc(&mut self, sensor: GasSensor) -> Result<u16>;

    /// DHT22 temperature (°C) and relative humidity (%)
    async fn read_climate(&mut self) -> Result<(f64, f64)>;

    /// Anemometer pulses since the previous call
    async fn take_pulses(&mut self) -> Result<u32>;

    /// Drive the siren output
    async fn set_siren(&mut self, on: bool) -> Result<()>;

    /// Human-readable name for this source
    fn name(&self) -> &'static str;
}

/// Read every sensor once
pub async fn read_sample<S: SensorSource + ?Sized>(source: &mut S) -> Result<RawSample> {
    let (temperature, humidity) = source.read_climate().await?;
    Ok(RawSample {
        temperature,
        humidity,
        mq2_adc: source.read_adc(GasSensor::Mq2).await?,
        mq3_adc: source.read_adc(GasSensor::Mq3).await?,
        mq7_adc: source.read_adc(GasSensor::Mq7).await?,
        mq135_adc: source.read_adc(GasSensor::Mq135).await?,
    })
}

/// Deterministic stand-in for the board, for hosts without hardware
///
/// Gas channels drift slowly around a clean-air baseline; an optional gas
/// event pulls the MQ-2 channel up for a window of samples.
pub struct SimulatedSource {
    tick: u64,
    baseline: u16,
    siren: bool,
    gas_event: Option<(u64, u64)>,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            tick: 0,
            baseline: 2048,
            siren: false,
            gas_event: None,
        }
    }

    /// Raise the MQ-2 reading for `len` climate reads starting at `start`
    pub fn with_gas_event(mut self, start: u64, len: u64) -> Self {
        self.gas_event = Some((start, start.saturating_add(len)));
        self
    }

    fn in_gas_event(&self) -> bool {
        matches!(self.gas_event, Some((start, end)) if self.tick >= start && self.tick < end)
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorSource for SimulatedSource {
    async fn read_adc(&mut self, sensor: GasSensor) -> Result<u16> {
        if sensor == GasSensor::Mq2 && self.in_gas_event() {
            // Higher voltage means lower Rs, which reads as more gas
            return Ok(3600);
        }
        let phase = self.tick as f64 / 20.0 + sensor.load_resistance();
        let drift = (phase.sin() * 24.0) as i32;
        Ok((self.baseline as i32 + drift).clamp(1, 4094) as u16)
    }

    async fn read_climate(&mut self) -> Result<(f64, f64)> {
        self.tick += 1;
        let t = self.tick as f64;
        let temperature = 22.0 + 3.0 * (t / 30.0).sin();
        let humidity = 55.0 + 10.0 * (t / 45.0).cos();
        Ok((
            (temperature * 10.0).round() / 10.0,
            (humidity * 10.0).round() / 10.0,
        ))
    }

    async fn take_pulses(&mut self) -> Result<u32> {
        Ok((self.tick % 7) as u32 * 3)
    }

    async fn set_siren(&mut self, on: bool) -> Result<()> {
        self.siren = on;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_source_is_deterministic() {
        let mut a = SimulatedSource::new();
        let mut b = SimulatedSource::new();

        for _ in 0..5 {
            assert_eq!(
                read_sample(&mut a).await.unwrap(),
                read_sample(&mut b).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_adc_stays_in_range() {
        let mut source = SimulatedSource::new();
        for _ in 0..200 {
            let sample = read_sample(&mut source).await.unwrap();
            for sensor in GasSensor::ALL {
                let adc = sample.adc(sensor);
                assert!(adc > 0 && adc < 4095);
            }
        }
    }

    #[tokio::test]
    async fn test_gas_event_window() {
        let mut source = SimulatedSource::new().with_gas_event(2, 2);

        let first = read_sample(&mut source).await.unwrap();
        let second = read_sample(&mut source).await.unwrap();
        let third = read_sample(&mut source).await.unwrap();
        let fourth = read_sample(&mut source).await.unwrap();

        assert_ne!(first.mq2_adc, 3600);
        assert_eq!(second.mq2_adc, 3600);
        assert_eq!(third.mq2_adc, 3600);
        assert_ne!(fourth.mq2_adc, 3600);
    }

    #[tokio::test]
    async fn test_gas_event_length_saturates() {
        let mut source = SimulatedSource::new().with_gas_event(1, u64::MAX);
        assert_eq!(source.gas_event, Some((1, u64::MAX)));

        let sample = read_sample(&mut source).await.unwrap();
        assert_eq!(sample.mq2_adc, 3600);
    }

    #[tokio::test]
    async fn test_siren_follows_command() {
        let mut source = SimulatedSource::new();
        source.set_siren(true).await.unwrap();
        assert!(source.siren);
        assert_eq!(source.name(), "simulated");
    }
}
