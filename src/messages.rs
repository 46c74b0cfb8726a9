// Message and record types shared by the control core and the runtime

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// One independently driven degree of motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisName {
    Throttle,
    Steering,
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisName::Throttle => write!(f, "throttle"),
            AxisName::Steering => write!(f, "steering"),
        }
    }
}

/// Which transport produced a command. Only used for logging; arbitration
/// is last-writer-wins regardless of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSourceKind {
    Polled,
    Pushed,
}

/// Latest requested target per axis plus the time it was written.
/// Always replaced as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetCommand {
    pub throttle: i32,
    pub steering: i32,
    pub updated_at: Instant,
}

impl TargetCommand {
    pub fn stopped(at: Instant) -> Self {
        Self {
            throttle: 0,
            steering: 0,
            updated_at: at,
        }
    }

    pub fn get(&self, axis: AxisName) -> i32 {
        match axis {
            AxisName::Throttle => self.throttle,
            AxisName::Steering => self.steering,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.throttle == 0 && self.steering == 0
    }
}

/// Dual-direction drive for one motor: at most one side is nonzero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DutyPair {
    pub forward: u8,
    pub reverse: u8,
}

/// Per-tick output consumed by the PWM collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DutyFrame {
    pub forward_throttle: u8,
    pub reverse_throttle: u8,
    pub forward_steering: u8,
    pub reverse_steering: u8,
}

impl DutyFrame {
    pub fn new(throttle: DutyPair, steering: DutyPair) -> Self {
        Self {
            forward_throttle: throttle.forward,
            reverse_throttle: throttle.reverse,
            forward_steering: steering.forward,
            reverse_steering: steering.reverse,
        }
    }

    /// All duties zero (coast)
    pub fn coast() -> Self {
        Self::default()
    }

    /// `(forward_throttle, reverse_throttle, forward_steering, reverse_steering)`
    pub fn as_tuple(&self) -> (u8, u8, u8, u8) {
        (
            self.forward_throttle,
            self.reverse_throttle,
            self.forward_steering,
            self.reverse_steering,
        )
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}
