// Periodic slew limiter for both axes
//
//   STOPPED --nonzero target--> KICKSTARTED --> RAMPING
//      ^                                           |
//      +------------- target == 0 (hard stop) -----+
//
// Stopping is instantaneous. Starting from rest jumps straight to the
// configured kick, everything else moves at most `accel_step` per tick.
// Steering also gets a bounded full-power window: once driven longer than the
// assist window its output is held to a reduced ceiling until the target
// returns to zero.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{
    AxisConfig, MotorConfig, STEERING_ASSIST_CEILING, STEERING_ASSIST_WINDOW,
};
use crate::messages::{AxisName, TargetCommand};

/// Observable phase of one axis after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisPhase {
    #[default]
    Stopped,
    Kickstarted,
    Ramping,
}

/// Current actuation value per axis, as of the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RampState {
    pub throttle: i32,
    pub steering: i32,
}

impl RampState {
    pub fn get(&self, axis: AxisName) -> i32 {
        match axis {
            AxisName::Throttle => self.throttle,
            AxisName::Steering => self.steering,
        }
    }
}

pub struct RampEngine {
    state: RampState,
    phases: [AxisPhase; 2],
    /// Set the first tick steering leaves zero, cleared when its target is zero
    assist_started_at: Option<Instant>,
    assist_window: Duration,
    assist_ceiling: i32,
}

impl Default for RampEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RampEngine {
    pub fn new() -> Self {
        Self::with_assist(STEERING_ASSIST_WINDOW, STEERING_ASSIST_CEILING)
    }

    /// Engine with a custom steering assist window and reduced ceiling
    pub fn with_assist(window: Duration, ceiling: i32) -> Self {
        Self {
            state: RampState::default(),
            phases: [AxisPhase::Stopped; 2],
            assist_started_at: None,
            assist_window: window,
            assist_ceiling: ceiling.abs(),
        }
    }

    pub fn state(&self) -> RampState {
        self.state
    }

    pub fn phase(&self, axis: AxisName) -> AxisPhase {
        self.phases[axis as usize]
    }

    /// Advance both axes by one tick
    pub fn tick(
        &mut self,
        target: &TargetCommand,
        config: &MotorConfig,
        now: Instant,
    ) -> RampState {
        let (throttle, throttle_phase) =
            step_axis(self.state.throttle, target.throttle, &config.throttle);
        let (steering, steering_phase) =
            step_axis(self.state.steering, target.steering, &config.steering);

        let steering = self.apply_steering_assist(steering, target.steering, now);

        // Defense in depth: never exceed the configured limit
        self.state = RampState {
            throttle: config.throttle.clamp(i64::from(throttle)),
            steering: config.steering.clamp(i64::from(steering)),
        };
        self.phases = [
            settle_phase(throttle_phase, self.state.throttle),
            settle_phase(steering_phase, self.state.steering),
        ];
        self.state
    }

    fn apply_steering_assist(&mut self, current: i32, target: i32, now: Instant) -> i32 {
        if target == 0 {
            self.assist_started_at = None;
            return current;
        }

        if current != 0 && self.assist_started_at.is_none() {
            self.assist_started_at = Some(now);
        }

        match self.assist_started_at {
            Some(start) if now.saturating_duration_since(start) > self.assist_window => {
                let held = current.clamp(-self.assist_ceiling, self.assist_ceiling);
                if held != current {
                    debug!(
                        "Steering assist window elapsed, holding {} to {}",
                        current, held
                    );
                }
                held
            }
            _ => current,
        }
    }
}

/// One slew-limiter step for a single axis
fn step_axis(current: i32, target: i32, cfg: &AxisConfig) -> (i32, AxisPhase) {
    if target == 0 {
        return (0, AxisPhase::Stopped);
    }

    // Cold start. A zero kick means this axis simply slews up from rest.
    if current == 0 && cfg.start_kick > 0 {
        return (target.signum() * cfg.start_kick, AxisPhase::Kickstarted);
    }

    let delta = target - current;
    let next = if delta.abs() <= cfg.accel_step {
        target
    } else {
        current + delta.signum() * cfg.accel_step
    };
    (next, AxisPhase::Ramping)
}

fn settle_phase(phase: AxisPhase, current: i32) -> AxisPhase {
    if current == 0 {
        AxisPhase::Stopped
    } else {
        phase
    }
}
