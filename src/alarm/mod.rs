//! Gas alarm handling on the node

mod monitor;

pub use monitor::{AlarmAction, AlarmMonitor};
