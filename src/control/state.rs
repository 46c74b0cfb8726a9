// The one record shared between command producers, the config path and the tick.
//
// Target and config live behind a single mutex so a reader can never pair one
// axis's new value with the other axis's (or the timestamp's) old value.
// Critical sections are short and never do I/O.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::config::MotorConfig;
use crate::messages::{CommandSourceKind, TargetCommand};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ControlRecord {
    pub target: TargetCommand,
    pub config: MotorConfig,
    /// Source of the last accepted command, `None` until the first one
    pub last_source: Option<CommandSourceKind>,
}

/// Snapshot taken by the tick
#[derive(Debug, Clone, Copy)]
pub struct ControlSnapshot {
    pub target: TargetCommand,
    pub config: MotorConfig,
}

pub struct SharedControl {
    inner: Mutex<ControlRecord>,
}

impl SharedControl {
    pub fn new(config: MotorConfig, now: Instant) -> Self {
        Self {
            inner: Mutex::new(ControlRecord {
                target: TargetCommand::stopped(now),
                config,
                last_source: None,
            }),
        }
    }

    // Every write replaces whole fields; a poisoned record is still consistent
    fn lock(&self) -> MutexGuard<'_, ControlRecord> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut ControlRecord) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let record = self.lock();
        ControlSnapshot {
            target: record.target,
            config: record.config,
        }
    }

    pub fn target(&self) -> TargetCommand {
        self.lock().target
    }

    pub fn config(&self) -> MotorConfig {
        self.lock().config
    }

    /// Swap in a new config and pull the live target inside the new limits.
    /// The command timestamp is not touched.
    pub(crate) fn install_config(&self, config: MotorConfig) {
        let mut record = self.lock();
        record.config = config;
        record.target = TargetCommand {
            throttle: config.throttle.clamp(i64::from(record.target.throttle)),
            steering: config.steering.clamp(i64::from(record.target.steering)),
            updated_at: record.target.updated_at,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisConfig;

    #[test]
    fn test_install_config_reclamps_target() {
        let t0 = Instant::now();
        let shared = SharedControl::new(MotorConfig::default(), t0);
        shared.with(|r| {
            r.target = TargetCommand {
                throttle: 250,
                steering: -250,
                updated_at: t0,
            }
        });

        let lowered = MotorConfig {
            throttle: AxisConfig {
                effective_limit: 100,
                ..AxisConfig::default()
            },
            steering: AxisConfig {
                effective_limit: 120,
                ..AxisConfig::default()
            },
            ..MotorConfig::default()
        };
        shared.install_config(lowered);

        let target = shared.target();
        assert_eq!(target.throttle, 100);
        assert_eq!(target.steering, -120);
        assert_eq!(target.updated_at, t0);
        assert_eq!(shared.config(), lowered);
    }

    #[test]
    fn test_fresh_record_has_no_command() {
        let shared = SharedControl::new(MotorConfig::default(), Instant::now());
        assert!(shared.with(|r| r.last_source).is_none());
        assert!(shared.snapshot().target.is_zero());
    }
}
