// Transport adapters
//
// Each adapter owns its wire format and hands the control core only
// fully-parsed values:
// - polled: request/reply "set target" (selector parameters t and s)
// - pushed: fire-and-forget "<int>,<int>" text payloads
// - settings: config get / partial set

mod polled;
mod pushed;
mod settings;

pub use polled::PolledTarget;
pub use pushed::PushedTarget;
pub use settings::{ConfigReply, ConfigRequest, handle_config_request};

use crate::error::{ControlError, Result};

/// Parse one signed integer field; surrounding whitespace is allowed
pub(crate) fn parse_axis_value(name: &str, raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().map_err(|e| {
        ControlError::invalid_command(format!("field '{name}' = {trimmed:?}: {e}"))
    })
}
