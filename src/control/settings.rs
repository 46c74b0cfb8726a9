// Config get/set path.
// Persisting may block on I/O, so it runs outside the control lock and must
// never be called from the tick.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use super::state::SharedControl;
use crate::config::{MotorConfig, MotorConfigUpdate};
use crate::error::Result;
use crate::store::ConfigStore;

#[derive(Clone)]
pub struct ConfigService {
    shared: Arc<SharedControl>,
    store: ConfigStore,
    // Serializes concurrent updates so merge/persist/install is not interleaved
    writer: Arc<Mutex<()>>,
}

impl ConfigService {
    pub fn new(shared: Arc<SharedControl>, store: ConfigStore) -> Self {
        Self {
            shared,
            store,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn get_config(&self) -> MotorConfig {
        self.shared.config()
    }

    /// Merge, validate, persist, then install. On any failure the active
    /// config and the stored record are unchanged.
    pub fn set_config(&self, update: &MotorConfigUpdate) -> Result<MotorConfig> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let next = self.shared.config().merged(update).inspect_err(|e| {
            warn!("Rejected config update {:?}: {}", update, e);
        })?;

        self.store.save(&next).inspect_err(|e| {
            warn!("Config not applied, save failed: {}", e);
        })?;

        self.shared.install_config(next);
        info!("Motor config updated: {:?}", next);
        Ok(next)
    }
}
