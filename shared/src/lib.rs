//! LABSense Shared Types
//!
//! This crate provides the telemetry model, the JSON codec, the command table
//! and resolver used by the webhook server, plus the gas-sensor math and alarm
//! state machine used by the sensor node.

pub mod alarm;
pub mod codec;
pub mod command;
pub mod reading;
pub mod resolver;
pub mod sensors;

pub use command::{CommandEntry, CommandTable};
pub use reading::{Cell, SensorRow, TelemetryRecord};
pub use resolver::{resolve, ResolveError, ResolverOptions};

/// Row store schema, positional
pub mod schema {
    /// Telemetry field names in column order (columns 1..=12)
    pub const FIELD_NAMES: [&str; 12] = [
        "temperatura",
        "humedad",
        "lpg_ppm",
        "h2_ppm",
        "humo_ppm",
        "benceno_mgL",
        "alcohol_mgL",
        "co_ppm",
        "co2_ppm",
        "amoniaco_ppm",
        "tolueno_ppm",
        "ica_valor",
    ];

    /// Column holding the ingestion timestamp
    pub const TIMESTAMP_COLUMN: usize = 0;

    /// Total columns per row: timestamp + sensor values
    pub const COLUMN_COUNT: usize = FIELD_NAMES.len() + 1;

    /// Default deployment offset from UTC (UTC-6)
    pub const DEFAULT_UTC_OFFSET_SECS: i32 = -21_600;
}

/// Alarm thresholds evaluated by the sensor node
pub mod thresholds {
    /// Smoke level that raises the alarm (ppm)
    pub const SMOKE_PPM: i32 = 400;

    /// Carbon monoxide level that raises the alarm (ppm)
    pub const CO_PPM: i32 = 100;

    /// LPG level that raises the alarm (ppm)
    pub const LPG_PPM: i32 = 1000;

    /// Upper bound of the air quality index
    pub const ICA_MAX: i32 = 500;
}
