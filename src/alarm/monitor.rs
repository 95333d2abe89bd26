//! Alarm Monitor
//!
//! Feeds each reading to the alarm state machine and turns transitions into
//! actions for the main loop.

use labsense_shared::alarm::{AlarmStateMachine, AlarmTransition};
use labsense_shared::sensors::Readings;
use tracing::{info, warn};

/// Actions the alarm monitor can trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmAction {
    /// Switch the siren output
    Siren { on: bool },
    /// Alert text for a newly raised alarm
    Notify { message: String },
}

/// Edge-triggered alarm handling
#[derive(Debug, Default)]
pub struct AlarmMonitor {
    fsm: AlarmStateMachine,
}

impl AlarmMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a reading; returns the actions to carry out
    pub fn evaluate(&mut self, readings: &Readings) -> Vec<AlarmAction> {
        match self.fsm.process(readings) {
            AlarmTransition::Raised { kind, level_ppm } => {
                let message = kind.message(level_ppm);
                warn!("[ALARM] {}", message);
                vec![AlarmAction::Siren { on: true }, AlarmAction::Notify { message }]
            }
            AlarmTransition::Cleared => {
                info!("[ALARM] Cleared");
                vec![AlarmAction::Siren { on: false }]
            }
            AlarmTransition::Sustained { .. } | AlarmTransition::Quiet => Vec::new(),
        }
    }
}
