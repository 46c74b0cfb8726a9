// Polled transport: one "set target" request per call, answered OK / Bad Request.
// Raw input is the request's parameter string, e.g. "t=120;s=-40".

use tracing::debug;

use super::parse_axis_value;
use crate::control::{CommandIntake, CommandSource};
use crate::error::{ControlError, Result};
use crate::messages::{CommandSourceKind, TargetCommand};

pub const REPLY_OK: &str = "OK";
pub const REPLY_BAD_REQUEST: &str = "Bad Request";

#[derive(Clone)]
pub struct PolledTarget {
    intake: CommandIntake,
}

impl PolledTarget {
    pub fn new(intake: CommandIntake) -> Self {
        Self { intake }
    }

    /// Accept a request and produce the 2-state reply text
    pub fn reply(&self, parameters: &str) -> std::result::Result<&'static str, &'static str> {
        match self.accept(parameters) {
            Ok(_) => Ok(REPLY_OK),
            Err(e) => {
                debug!("Rejected target request {:?}: {}", parameters, e);
                Err(REPLY_BAD_REQUEST)
            }
        }
    }
}

/// Look up `key` in a `k=v` list separated by `;` or `&`
fn lookup<'a>(parameters: &'a str, key: &str) -> Option<&'a str> {
    parameters
        .split(['&', ';'])
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v)
}

impl CommandSource for PolledTarget {
    type Raw = str;

    fn kind(&self) -> CommandSourceKind {
        CommandSourceKind::Polled
    }

    fn accept(&self, parameters: &str) -> Result<TargetCommand> {
        let t = lookup(parameters, "t")
            .ok_or_else(|| ControlError::invalid_command("missing parameter 't'"))?;
        let s = lookup(parameters, "s")
            .ok_or_else(|| ControlError::invalid_command("missing parameter 's'"))?;

        // Both fields parse before anything is written
        let t = parse_axis_value("t", t)?;
        let s = parse_axis_value("s", s)?;
        self.intake.accept(t, s, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotorConfig;
    use crate::control::SharedControl;
    use std::sync::Arc;
    use std::time::Instant;

    fn adapter() -> (PolledTarget, Arc<SharedControl>) {
        let shared = Arc::new(SharedControl::new(MotorConfig::default(), Instant::now()));
        (PolledTarget::new(CommandIntake::new(shared.clone())), shared)
    }

    #[test]
    fn test_accepts_both_separators() {
        let (polled, shared) = adapter();

        assert_eq!(polled.reply("t=120;s=-40"), Ok(REPLY_OK));
        assert_eq!((shared.target().throttle, shared.target().steering), (120, -40));

        assert_eq!(polled.reply("s=5&t=-7"), Ok(REPLY_OK));
        assert_eq!((shared.target().throttle, shared.target().steering), (-7, 5));
    }

    #[test]
    fn test_out_of_range_is_clamped_not_rejected() {
        let (polled, shared) = adapter();
        assert_eq!(polled.reply("t=9000;s=-9000"), Ok(REPLY_OK));
        assert_eq!((shared.target().throttle, shared.target().steering), (255, -255));
    }

    #[test]
    fn test_bad_requests_leave_target_untouched() {
        let (polled, shared) = adapter();
        polled.accept("t=50;s=60").unwrap();
        let before = shared.target();

        for bad in ["", "t=10", "s=10", "t=abc;s=10", "t=10;s=", "t=1.5;s=2", "t10;s10"] {
            assert_eq!(polled.reply(bad), Err(REPLY_BAD_REQUEST), "input {:?}", bad);
            assert!(matches!(
                polled.accept(bad),
                Err(ControlError::InvalidCommand { .. })
            ));
            assert_eq!(shared.target(), before);
        }
    }
}
