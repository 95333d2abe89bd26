//! Gas sensor math
//!
//! Converts raw ADC readings from the MQ-series sensors into concentrations
//! using the usual power-law curve `A * (Rs/R0)^B`.

use serde_json::{json, Value};

use crate::{thresholds, TelemetryRecord};

/// Board supply voltage
pub const SUPPLY_VOLTAGE: f64 = 3.3;

/// Full-scale ADC count (12-bit)
pub const ADC_RESOLUTION: f64 = 4095.0;

/// Samples averaged when calibrating R0
pub const CALIBRATION_SAMPLES: usize = 50;

/// Anemometer: km/h contributed by each pulse, scaled by 100
const WIND_FACTOR_PER_PULSE: f64 = 8.75;

/// Power-law coefficients for one gas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasCurve {
    pub a: f64,
    pub b: f64,
}

pub mod curves {
    use super::GasCurve;

    pub const LPG: GasCurve = GasCurve { a: 574.25, b: -2.222 };
    pub const SMOKE: GasCurve = GasCurve { a: 305.33, b: -3.401 };
    pub const H2: GasCurve = GasCurve { a: 98.866, b: -2.732 };
    pub const ALCOHOL: GasCurve = GasCurve { a: 0.4, b: -1.5 };
    pub const BENZENE: GasCurve = GasCurve { a: 0.2, b: -1.4 };
    pub const CO: GasCurve = GasCurve { a: 99.042, b: -1.518 };
    pub const TOLUENE: GasCurve = GasCurve { a: 4.83, b: -2.62 };
    pub const AMMONIA: GasCurve = GasCurve { a: 102.2, b: -2.473 };
    pub const CO2: GasCurve = GasCurve { a: 116.602, b: -2.769 };
}

/// The four MQ sensors on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GasSensor {
    Mq2,
    Mq3,
    Mq7,
    Mq135,
}

impl GasSensor {
    pub const ALL: [GasSensor; 4] = [GasSensor::Mq2, GasSensor::Mq3, GasSensor::Mq7, GasSensor::Mq135];

    /// Load resistor in kΩ
    pub fn load_resistance(self) -> f64 {
        match self {
            GasSensor::Mq2 => 5.0,
            GasSensor::Mq3 => 200.0,
            GasSensor::Mq7 => 10.0,
            GasSensor::Mq135 => 20.0,
        }
    }
}

impl std::fmt::Display for GasSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GasSensor::Mq2 => write!(f, "MQ-2"),
            GasSensor::Mq3 => write!(f, "MQ-3"),
            GasSensor::Mq7 => write!(f, "MQ-7"),
            GasSensor::Mq135 => write!(f, "MQ-135"),
        }
    }
}

/// Sensor resistance Rs from an ADC count. Zero volts reads as 0.
pub fn sensor_resistance(adc: u16, load_kohm: f64) -> f64 {
    let volts = adc as f64 * (SUPPLY_VOLTAGE / ADC_RESOLUTION);
    if volts == 0.0 {
        return 0.0;
    }
    load_kohm * (SUPPLY_VOLTAGE - volts) / volts
}

/// Clean-air R0: mean Rs over the calibration samples
pub fn calibrate(samples: &[u16], load_kohm: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|adc| sensor_resistance(*adc, load_kohm))
        .sum();
    sum / samples.len() as f64
}

/// Concentration for `curve`, or 0 when either resistance is unusable
pub fn concentration(curve: GasCurve, rs: f64, r0: f64) -> f64 {
    if rs <= 0.0 || r0 <= 0.0 {
        return 0.0;
    }
    curve.a * (rs / r0).powf(curve.b)
}

/// Wind speed for the pulses counted in one window
pub fn wind_speed(pulses: u32) -> f64 {
    pulses as f64 * WIND_FACTOR_PER_PULSE / 100.0
}

/// Air quality index: worst of smoke, CO, toluene and ammonia, clamped
pub fn air_quality_index(smoke: i32, co: i32, toluene: i32, ammonia: i32) -> i32 {
    smoke
        .max(co)
        .max(toluene)
        .max(ammonia)
        .clamp(0, thresholds::ICA_MAX)
}

/// R0 per sensor, captured once at startup
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Calibration {
    pub mq2: f64,
    pub mq3: f64,
    pub mq7: f64,
    pub mq135: f64,
}

impl Calibration {
    pub fn r0(&self, sensor: GasSensor) -> f64 {
        match sensor {
            GasSensor::Mq2 => self.mq2,
            GasSensor::Mq3 => self.mq3,
            GasSensor::Mq7 => self.mq7,
            GasSensor::Mq135 => self.mq135,
        }
    }

    pub fn set(&mut self, sensor: GasSensor, r0: f64) {
        match sensor {
            GasSensor::Mq2 => self.mq2 = r0,
            GasSensor::Mq3 => self.mq3 = r0,
            GasSensor::Mq7 => self.mq7 = r0,
            GasSensor::Mq135 => self.mq135 = r0,
        }
    }
}

/// One raw acquisition from the board
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawSample {
    /// DHT22 temperature in °C (NaN when the read failed)
    pub temperature: f64,
    /// DHT22 relative humidity in % (NaN when the read failed)
    pub humidity: f64,
    pub mq2_adc: u16,
    pub mq3_adc: u16,
    pub mq7_adc: u16,
    pub mq135_adc: u16,
}

impl RawSample {
    pub fn adc(&self, sensor: GasSensor) -> u16 {
        match sensor {
            GasSensor::Mq2 => self.mq2_adc,
            GasSensor::Mq3 => self.mq3_adc,
            GasSensor::Mq7 => self.mq7_adc,
            GasSensor::Mq135 => self.mq135_adc,
        }
    }
}

/// Derived readings. ppm values are truncated to whole numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    pub temperature: f64,
    pub humidity: f64,
    pub lpg_ppm: i32,
    pub h2_ppm: i32,
    pub smoke_ppm: i32,
    pub benzene_mg_l: f64,
    pub alcohol_mg_l: f64,
    pub co_ppm: i32,
    pub co2_ppm: i32,
    pub ammonia_ppm: i32,
    pub toluene_ppm: i32,
    pub ica: i32,
}

impl Readings {
    /// Evaluate every curve against a raw sample
    pub fn from_sample(sample: &RawSample, calibration: &Calibration) -> Self {
        let read = |sensor: GasSensor, curve: GasCurve| {
            let rs = sensor_resistance(sample.adc(sensor), sensor.load_resistance());
            concentration(curve, rs, calibration.r0(sensor))
        };

        let smoke_ppm = read(GasSensor::Mq2, curves::SMOKE) as i32;
        let co_ppm = read(GasSensor::Mq7, curves::CO) as i32;
        let toluene_ppm = read(GasSensor::Mq135, curves::TOLUENE) as i32;
        let ammonia_ppm = read(GasSensor::Mq135, curves::AMMONIA) as i32;

        Self {
            temperature: sample.temperature,
            humidity: sample.humidity,
            lpg_ppm: read(GasSensor::Mq2, curves::LPG) as i32,
            h2_ppm: read(GasSensor::Mq2, curves::H2) as i32,
            smoke_ppm,
            benzene_mg_l: read(GasSensor::Mq3, curves::BENZENE),
            alcohol_mg_l: read(GasSensor::Mq3, curves::ALCOHOL),
            co_ppm,
            co2_ppm: read(GasSensor::Mq135, curves::CO2) as i32,
            ammonia_ppm,
            toluene_ppm,
            ica: air_quality_index(smoke_ppm, co_ppm, toluene_ppm, ammonia_ppm),
        }
    }

    /// The telemetry record posted to the webhook
    pub fn to_record(&self) -> TelemetryRecord {
        TelemetryRecord {
            temperatura: Some(number(self.temperature)),
            humedad: Some(number(self.humidity)),
            lpg_ppm: Some(json!(self.lpg_ppm)),
            h2_ppm: Some(json!(self.h2_ppm)),
            humo_ppm: Some(json!(self.smoke_ppm)),
            benceno_mg_l: Some(number(self.benzene_mg_l)),
            alcohol_mg_l: Some(number(self.alcohol_mg_l)),
            co_ppm: Some(json!(self.co_ppm)),
            co2_ppm: Some(json!(self.co2_ppm)),
            amoniaco_ppm: Some(json!(self.ammonia_ppm)),
            tolueno_ppm: Some(json!(self.toluene_ppm)),
            ica_valor: Some(json!(self.ica)),
        }
    }
}

// NaN and infinities have no JSON form; they post as null
fn number(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_sensor_resistance() {
        // Half scale: Rs equals the load resistor
        let rs = sensor_resistance(2048, 10.0);
        assert!((rs - 10.0).abs() < 0.01);
        assert_eq!(sensor_resistance(0, 10.0), 0.0);
        assert!(sensor_resistance(4095, 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_calibrate_averages_resistance() {
        let r0 = calibrate(&[2048; CALIBRATION_SAMPLES], GasSensor::Mq7.load_resistance());
        assert!((r0 - 10.0).abs() < 0.01);
        assert_eq!(calibrate(&[], 10.0), 0.0);
    }

    #[test]
    fn test_concentration_at_clean_air_ratio_is_a() {
        assert!(approx(concentration(curves::LPG, 7.5, 7.5), curves::LPG.a));
        assert_eq!(concentration(curves::LPG, 0.0, 7.5), 0.0);
        assert_eq!(concentration(curves::LPG, 7.5, 0.0), 0.0);
    }

    #[test]
    fn test_concentration_rises_as_resistance_drops() {
        let clean = concentration(curves::CO, 10.0, 10.0);
        let dirty = concentration(curves::CO, 5.0, 10.0);
        assert!(dirty > clean);
    }

    #[test]
    fn test_air_quality_index_clamps() {
        assert_eq!(air_quality_index(40, 7, 1, 2), 40);
        assert_eq!(air_quality_index(900, 7, 1, 2), 500);
        assert_eq!(air_quality_index(-5, -1, -2, -3), 0);
    }

    #[test]
    fn test_wind_speed() {
        assert!(approx(wind_speed(0), 0.0));
        assert!(approx(wind_speed(20), 1.75));
    }

    #[test]
    fn test_readings_from_clean_air_sample() {
        let sample = RawSample {
            temperature: 21.5,
            humidity: 60.0,
            mq2_adc: 2048,
            mq3_adc: 2048,
            mq7_adc: 2048,
            mq135_adc: 2048,
        };
        let mut calibration = Calibration::default();
        for sensor in GasSensor::ALL {
            calibration.set(
                sensor,
                sensor_resistance(sample.adc(sensor), sensor.load_resistance()),
            );
        }

        let readings = Readings::from_sample(&sample, &calibration);
        assert_eq!(readings.lpg_ppm, 574);
        assert_eq!(readings.smoke_ppm, 305);
        assert_eq!(readings.co_ppm, 99);
        assert_eq!(readings.co2_ppm, 116);
        assert_eq!(readings.ica, 305);
        assert!(approx(readings.alcohol_mg_l, 0.4));
    }

    #[test]
    fn test_uncalibrated_sensors_read_zero() {
        let sample = RawSample {
            mq2_adc: 1000,
            ..Default::default()
        };
        let readings = Readings::from_sample(&sample, &Calibration::default());
        assert_eq!(readings.lpg_ppm, 0);
        assert_eq!(readings.ica, 0);
    }

    #[test]
    fn test_record_posts_nan_as_null() {
        let readings = Readings {
            temperature: f64::NAN,
            humidity: 60.0,
            ..Default::default()
        };
        let record = readings.to_record();
        assert_eq!(record.temperatura, Some(Value::Null));
        assert_eq!(record.humedad, Some(json!(60.0)));
    }
}
