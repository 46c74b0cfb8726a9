/// Error types for the control core and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    #[error("No stored value for '{key}'")]
    PersistenceMiss { key: String },

    #[error("Stored value for '{key}' is corrupt: {reason}")]
    PersistenceCorrupt { key: String, reason: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),
}

impl ControlError {
    pub(crate) fn invalid_command(reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
