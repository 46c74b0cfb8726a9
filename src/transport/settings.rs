// Config transport: an empty request reads the config, a JSON body is a
// partial update that is persisted before it takes effect.

use crate::config::{MotorConfig, MotorConfigUpdate};
use crate::control::ConfigService;
use crate::error::ControlError;

pub const REPLY_SAVED: &str = "Saved";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigRequest {
    Get,
    Set(MotorConfigUpdate),
}

impl ConfigRequest {
    pub fn parse(payload: Option<&[u8]>) -> Result<Self, ControlError> {
        match payload {
            None => Ok(Self::Get),
            Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Self::Get),
            Some(bytes) => serde_json::from_slice(bytes)
                .map(Self::Set)
                .map_err(|e| ControlError::invalid_config(e.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum ConfigReply {
    Current(MotorConfig),
    Saved,
    Rejected(ControlError),
}

impl ConfigReply {
    /// Reply body: `Ok` for a success reply, `Err` for an error reply
    pub fn into_payload(self) -> Result<String, String> {
        match self {
            ConfigReply::Current(config) => {
                serde_json::to_string(&config).map_err(|e| e.to_string())
            }
            ConfigReply::Saved => Ok(REPLY_SAVED.to_owned()),
            ConfigReply::Rejected(e) => Err(e.to_string()),
        }
    }
}

/// Serve one config request. A set persists synchronously, so call this off
/// the control tick.
pub fn handle_config_request(service: &ConfigService, payload: Option<&[u8]>) -> ConfigReply {
    match ConfigRequest::parse(payload) {
        Ok(ConfigRequest::Get) => ConfigReply::Current(service.get_config()),
        Ok(ConfigRequest::Set(update)) => match service.set_config(&update) {
            Ok(_) => ConfigReply::Saved,
            Err(e) => ConfigReply::Rejected(e),
        },
        Err(e) => ConfigReply::Rejected(e),
    }
}
