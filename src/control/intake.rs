// Command intake: turns raw target pairs from any transport into the shared target

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::state::SharedControl;
use crate::error::Result;
use crate::messages::{CommandSourceKind, TargetCommand};

/// A transport that can deliver target commands.
///
/// Implementations own all wire parsing. A malformed `raw` must be rejected
/// with `ControlError::InvalidCommand` before anything reaches the intake, so
/// the shared target is either fully replaced or left alone.
pub trait CommandSource {
    type Raw: ?Sized;

    fn kind(&self) -> CommandSourceKind;

    fn accept(&self, raw: &Self::Raw) -> Result<TargetCommand>;
}

#[derive(Clone)]
pub struct CommandIntake {
    shared: Arc<SharedControl>,
}

impl CommandIntake {
    pub fn new(shared: Arc<SharedControl>) -> Self {
        Self { shared }
    }

    /// Accept a raw target pair stamped with the current time
    pub fn accept(
        &self,
        raw_throttle: i64,
        raw_steering: i64,
        source: CommandSourceKind,
    ) -> Result<TargetCommand> {
        self.accept_at(raw_throttle, raw_steering, source, Instant::now())
    }

    /// Clamp both axes to their limits and overwrite the target as one write.
    /// Later writes win regardless of source.
    pub fn accept_at(
        &self,
        raw_throttle: i64,
        raw_steering: i64,
        source: CommandSourceKind,
        now: Instant,
    ) -> Result<TargetCommand> {
        let target = self.shared.with(|record| {
            record.target = TargetCommand {
                throttle: record.config.throttle.clamp(raw_throttle),
                steering: record.config.steering.clamp(raw_steering),
                updated_at: now,
            };
            record.last_source = Some(source);
            record.target
        });

        debug!(
            "Target from {:?}: throttle={} steering={}",
            source, target.throttle, target.steering
        );
        Ok(target)
    }
}
