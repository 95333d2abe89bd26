//! Gas Alarm State Machine
//!
//! Edge-triggered alarm over the derived readings: a raise is reported only
//! on the transition from clear to active.

use crate::{sensors::Readings, thresholds};

/// Which threshold tripped the alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmKind {
    Smoke,
    CarbonMonoxide,
    Lpg,
}

impl AlarmKind {
    /// Alert text sent when this alarm is raised
    pub fn message(self, level_ppm: i32) -> String {
        let label = match self {
            AlarmKind::Smoke => "¡Alerta de Humo!",
            AlarmKind::CarbonMonoxide => "¡Alerta de Monóxido de Carbono (CO)!",
            AlarmKind::Lpg => "¡Alerta de Fuga de Gas (LPG)!",
        };
        format!("⚠️ {} Nivel detectado: {} ppm", label, level_ppm)
    }
}

/// Result of feeding one reading to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlarmTransition {
    /// Alarm went from clear to active
    Raised { kind: AlarmKind, level_ppm: i32 },
    /// Alarm was already active and still is
    Sustained { kind: AlarmKind, level_ppm: i32 },
    /// Alarm went from active to clear
    Cleared,
    /// Nothing exceeded, nothing was active
    Quiet,
}

/// First exceeded threshold, checked in priority order smoke, CO, LPG
pub fn check_thresholds(readings: &Readings) -> Option<(AlarmKind, i32)> {
    if readings.smoke_ppm > thresholds::SMOKE_PPM {
        Some((AlarmKind::Smoke, readings.smoke_ppm))
    } else if readings.co_ppm > thresholds::CO_PPM {
        Some((AlarmKind::CarbonMonoxide, readings.co_ppm))
    } else if readings.lpg_ppm > thresholds::LPG_PPM {
        Some((AlarmKind::Lpg, readings.lpg_ppm))
    } else {
        None
    }
}

/// Tracks whether the siren is currently on
#[derive(Debug, Default)]
pub struct AlarmStateMachine {
    active: bool,
}

impl AlarmStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the siren output should be driven
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Process a reading and return the transition
    pub fn process(&mut self, readings: &Readings) -> AlarmTransition {
        let was_active = self.active;

        match check_thresholds(readings) {
            Some((kind, level_ppm)) => {
                self.active = true;
                if was_active {
                    AlarmTransition::Sustained { kind, level_ppm }
                } else {
                    AlarmTransition::Raised { kind, level_ppm }
                }
            }
            None => {
                self.active = false;
                if was_active {
                    AlarmTransition::Cleared
                } else {
                    AlarmTransition::Quiet
                }
            }
        }
    }
}
