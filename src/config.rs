// Timing, topics, and the persisted motor tuning record
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ControlError;
use crate::messages::AxisName;

// Ramp/control tick period
pub const RAMP_INTERVAL: Duration = Duration::from_millis(10);

// Steering motor is not rated for sustained full power: after this long at
// nonzero output it is held to STEERING_ASSIST_CEILING
pub const STEERING_ASSIST_WINDOW: Duration = Duration::from_millis(800);
pub const STEERING_ASSIST_CEILING: i32 = 150;

// 8-bit PWM resolution
pub const PWM_MAX: i32 = 255;

// Zenoh topics (relative to the topic prefix)
pub const TOPIC_CMD_TARGET: &str = "cmd/target"; // polled transport (queryable)
pub const TOPIC_CMD_PUSH: &str = "cmd/push"; // pushed transport (subscriber)
pub const TOPIC_CONFIG: &str = "config"; // config get/set (queryable)
pub const TOPIC_RT_DUTY: &str = "rt/duty"; // duty quadruple
pub const TOPIC_HEALTH: &str = "state/health"; // health status

pub const DEFAULT_TOPIC_PREFIX: &str = "rc";

// Persistence
pub const DEFAULT_STORE_DIR: &str = "./rc-store";
pub const MOTOR_CONFIG_KEY: &str = "motor-config";

// Factory defaults, used when nothing valid is persisted
pub const DEFAULT_CONTROL_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_EFFECTIVE_LIMIT: i32 = 255;
pub const DEFAULT_ACCEL_STEP: i32 = 10;
pub const DEFAULT_START_KICK: i32 = 200;

/// Tuning for one motor axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AxisConfig {
    /// Hard ceiling on |target| and |current|
    pub effective_limit: i32,
    /// Maximum change of current per tick while ramping
    pub accel_step: i32,
    /// Magnitude of the one-tick jump when starting from rest
    pub start_kick: i32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            effective_limit: DEFAULT_EFFECTIVE_LIMIT,
            accel_step: DEFAULT_ACCEL_STEP,
            start_kick: DEFAULT_START_KICK,
        }
    }
}

impl AxisConfig {
    /// Clamp a signed value into `[-effective_limit, effective_limit]`
    pub fn clamp(&self, value: i64) -> i32 {
        let limit = i64::from(self.effective_limit.max(0));
        value.clamp(-limit, limit) as i32
    }

    fn validate(&self, axis: AxisName) -> Result<(), ControlError> {
        if !(0..=PWM_MAX).contains(&self.effective_limit) {
            return Err(ControlError::invalid_config(format!(
                "{axis} effectiveLimit {} outside 0..={PWM_MAX}",
                self.effective_limit
            )));
        }
        if !(1..=PWM_MAX).contains(&self.accel_step) {
            return Err(ControlError::invalid_config(format!(
                "{axis} accelStep {} outside 1..={PWM_MAX}",
                self.accel_step
            )));
        }
        if !(0..=PWM_MAX).contains(&self.start_kick) {
            return Err(ControlError::invalid_config(format!(
                "{axis} startKick {} outside 0..={PWM_MAX}",
                self.start_kick
            )));
        }
        Ok(())
    }
}

/// Tunable actuation parameters, persisted as one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MotorConfig {
    pub control_timeout_ms: u64,
    pub throttle: AxisConfig,
    pub steering: AxisConfig,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            control_timeout_ms: DEFAULT_CONTROL_TIMEOUT_MS,
            throttle: AxisConfig::default(),
            steering: AxisConfig::default(),
        }
    }
}

impl MotorConfig {
    pub fn axis(&self, axis: AxisName) -> &AxisConfig {
        match axis {
            AxisName::Throttle => &self.throttle,
            AxisName::Steering => &self.steering,
        }
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ControlError> {
        if self.control_timeout_ms == 0 {
            return Err(ControlError::invalid_config("controlTimeoutMs must be >= 1"));
        }
        self.throttle.validate(AxisName::Throttle)?;
        self.steering.validate(AxisName::Steering)
    }

    /// Merge a partial update over this config and validate the result.
    /// `self` is left untouched.
    pub fn merged(&self, update: &MotorConfigUpdate) -> Result<MotorConfig, ControlError> {
        let mut next = *self;
        if let Some(ms) = update.control_timeout_ms {
            next.control_timeout_ms = ms;
        }
        if let Some(ref t) = update.throttle {
            t.apply_to(&mut next.throttle);
        }
        if let Some(ref s) = update.steering {
            s.apply_to(&mut next.steering);
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial update for one axis. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AxisConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_limit: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accel_step: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_kick: Option<i32>,
}

impl AxisConfigUpdate {
    fn apply_to(&self, axis: &mut AxisConfig) {
        if let Some(v) = self.effective_limit {
            axis.effective_limit = v;
        }
        if let Some(v) = self.accel_step {
            axis.accel_step = v;
        }
        if let Some(v) = self.start_kick {
            axis.start_kick = v;
        }
    }
}

/// Partial update received on the config transport
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MotorConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<AxisConfigUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steering: Option<AxisConfigUpdate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_factory_values() {
        let cfg = MotorConfig::default();
        assert_eq!(cfg.control_timeout_ms, 500);
        for axis in [cfg.throttle, cfg.steering] {
            assert_eq!(axis.effective_limit, 255);
            assert_eq!(axis.accel_step, 10);
            assert_eq!(axis.start_kick, 200);
        }
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_axis_clamp() {
        let axis = AxisConfig {
            effective_limit: 100,
            ..AxisConfig::default()
        };
        assert_eq!(axis.clamp(250), 100);
        assert_eq!(axis.clamp(-250), -100);
        assert_eq!(axis.clamp(42), 42);
        assert_eq!(axis.clamp(i64::MIN), -100);
    }

    #[test]
    fn test_partial_update_touches_only_named_fields() {
        let base = MotorConfig::default();
        let update = MotorConfigUpdate {
            control_timeout_ms: Some(750),
            steering: Some(AxisConfigUpdate {
                start_kick: Some(120),
                ..Default::default()
            }),
            ..Default::default()
        };

        let next = base.merged(&update).unwrap();
        assert_eq!(next.control_timeout_ms, 750);
        assert_eq!(next.throttle, base.throttle);
        assert_eq!(next.steering.start_kick, 120);
        assert_eq!(next.steering.accel_step, base.steering.accel_step);
        assert_eq!(next.steering.effective_limit, base.steering.effective_limit);
    }

    #[test]
    fn test_invalid_update_rejected() {
        let base = MotorConfig::default();
        let cases = [
            MotorConfigUpdate {
                control_timeout_ms: Some(0),
                ..Default::default()
            },
            MotorConfigUpdate {
                throttle: Some(AxisConfigUpdate {
                    effective_limit: Some(300),
                    ..Default::default()
                }),
                ..Default::default()
            },
            MotorConfigUpdate {
                steering: Some(AxisConfigUpdate {
                    accel_step: Some(0),
                    ..Default::default()
                }),
                ..Default::default()
            },
            MotorConfigUpdate {
                steering: Some(AxisConfigUpdate {
                    start_kick: Some(-1),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ];

        for update in cases {
            assert!(
                matches!(base.merged(&update), Err(ControlError::InvalidConfig { .. })),
                "update {:?} should be rejected",
                update
            );
        }
    }

    #[test]
    fn test_update_json_shape() {
        let update: MotorConfigUpdate =
            serde_json::from_str(r#"{"controlTimeoutMs":300,"throttle":{"accelStep":5}}"#)
                .unwrap();
        assert_eq!(update.control_timeout_ms, Some(300));
        assert_eq!(update.throttle.unwrap().accel_step, Some(5));
        assert!(update.steering.is_none());

        // Unknown keys are a malformed update, not silently ignored
        assert!(serde_json::from_str::<MotorConfigUpdate>(r#"{"timeout":300}"#).is_err());
    }
}
