// Pushed transport: "<throttle>,<steering>" text payloads with no reply channel.

use super::parse_axis_value;
use crate::control::{CommandIntake, CommandSource};
use crate::error::{ControlError, Result};
use crate::messages::{CommandSourceKind, TargetCommand};

#[derive(Clone)]
pub struct PushedTarget {
    intake: CommandIntake,
}

impl PushedTarget {
    pub fn new(intake: CommandIntake) -> Self {
        Self { intake }
    }

    /// Render a target pair in the pushed wire format
    pub fn encode(throttle: i32, steering: i32) -> String {
        format!("{throttle},{steering}")
    }
}

/// Split a payload into its two fields. Exactly one comma, nothing empty.
pub(crate) fn parse_payload(payload: &str) -> Result<(i64, i64)> {
    let (t, s) = payload
        .split_once(',')
        .ok_or_else(|| ControlError::invalid_command(format!("no ',' in payload {payload:?}")))?;
    if s.contains(',') {
        return Err(ControlError::invalid_command(format!(
            "too many fields in payload {payload:?}"
        )));
    }
    Ok((parse_axis_value("t", t)?, parse_axis_value("s", s)?))
}

impl CommandSource for PushedTarget {
    type Raw = [u8];

    fn kind(&self) -> CommandSourceKind {
        CommandSourceKind::Pushed
    }

    fn accept(&self, raw: &[u8]) -> Result<TargetCommand> {
        let payload = std::str::from_utf8(raw)
            .map_err(|e| ControlError::invalid_command(format!("payload not utf-8: {e}")))?;
        let (t, s) = parse_payload(payload)?;
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

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload("120,-40").unwrap(), (120, -40));
        assert_eq!(parse_payload(" 0 , 0\n").unwrap(), (0, 0));
        assert_eq!(parse_payload(&PushedTarget::encode(-5, 9)).unwrap(), (-5, 9));
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        for bad in ["", "120", ",", "120,", ",40", "a,b", "1,2,3", "1;2"] {
            assert!(
                matches!(parse_payload(bad), Err(ControlError::InvalidCommand { .. })),
                "payload {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_malformed_payload_keeps_previous_target() {
        let shared = Arc::new(SharedControl::new(MotorConfig::default(), Instant::now()));
        let pushed = PushedTarget::new(CommandIntake::new(shared.clone()));

        pushed.accept(b"80,-20").unwrap();
        let before = shared.target();

        assert!(pushed.accept(b"90,").is_err());
        assert!(pushed.accept(&[0xff, b',', b'1']).is_err());
        assert_eq!(shared.target(), before);
    }
}
