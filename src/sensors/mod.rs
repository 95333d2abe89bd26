//! Sensor acquisition for the node
//!
//! Provides the hardware abstraction and the reader that turns raw samples
//! into calibrated readings.

mod reader;
mod source;

pub use reader::SensorReader;
pub use source::SimulatedSource;
