// Staleness watchdog
// If commands stop arriving (transport failure, remote disconnect, crashed
// controller) the target is forced to zero so the ramp brings the motors to rest.

use std::time::Instant;

use tracing::{info, warn};

use super::state::SharedControl;
use crate::messages::RuntimeHealth;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogVerdict {
    /// Target was nonzero and stale, and has just been zeroed
    pub fired: bool,
    pub health: RuntimeHealth,
}

pub struct SafetyWatchdog {
    health: RuntimeHealth,
}

impl Default for SafetyWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyWatchdog {
    pub fn new() -> Self {
        Self {
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Run once per tick, before the ramp
    pub fn check(&mut self, shared: &SharedControl, now: Instant) -> WatchdogVerdict {
        let (fired, cmd_age, timeout, has_command) = shared.with(|record| {
            let timeout = record.config.control_timeout();
            let cmd_age = now.saturating_duration_since(record.target.updated_at);
            let fired = !record.target.is_zero() && cmd_age > timeout;
            if fired {
                record.target.throttle = 0;
                record.target.steering = 0;
            }
            (fired, cmd_age, timeout, record.last_source.is_some())
        });

        let health = if has_command && cmd_age <= timeout {
            RuntimeHealth::Ok
        } else {
            RuntimeHealth::CmdStale
        };

        if fired {
            warn!(
                "Command stale ({:?} old, timeout {:?}), stopping motors",
                cmd_age, timeout
            );
        } else if health != self.health && health == RuntimeHealth::Ok {
            info!("Command stream active");
        }
        self.health = health;

        WatchdogVerdict { fired, health }
    }
}
