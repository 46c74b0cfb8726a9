// Persisted motor configuration, stored as JSON under MOTOR_CONFIG_KEY.
// Loading never fails: a missing or unreadable record yields the factory
// defaults together with the reason they were used.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::{MOTOR_CONFIG_KEY, MotorConfig};
use crate::error::ControlError;

/// Key/value byte storage
pub trait Persistence: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    /// Replace the value under `key`. Readers observe either the previous
    /// value or the new one, never a mix.
    fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
}

/// One JSON file per key inside a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Persistence for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{key}.json.tmp"));

        // Atomic write: tmp file -> fsync -> rename
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, &path)?;
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Volatile store, nothing survives a restart
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::other("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::other("memory store lock poisoned"))?;
        entries.insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }
}

/// Where a loaded config came from
#[derive(Debug)]
pub enum ConfigSource {
    Stored,
    /// Defaults substituted; carries `PersistenceMiss` or `PersistenceCorrupt`
    Defaults(ControlError),
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: MotorConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    pub fn used_defaults(&self) -> bool {
        matches!(self.source, ConfigSource::Defaults(_))
    }
}

/// Loads and saves the motor config through a persistence backend
#[derive(Clone)]
pub struct ConfigStore {
    backend: Arc<dyn Persistence>,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn Persistence>) -> Self {
        Self { backend }
    }

    /// Load the persisted config, falling back to defaults
    pub fn load(&self) -> LoadedConfig {
        let source = match self.backend.get(MOTOR_CONFIG_KEY) {
            Ok(Some(bytes)) => match decode(&bytes) {
                Ok(config) => {
                    info!("Motor config loaded: {:?}", config);
                    return LoadedConfig {
                        config,
                        source: ConfigSource::Stored,
                    };
                }
                Err(e) => e,
            },
            Ok(None) => ControlError::PersistenceMiss {
                key: MOTOR_CONFIG_KEY.to_owned(),
            },
            Err(e) => {
                warn!("Reading motor config failed: {}", e);
                ControlError::PersistenceMiss {
                    key: MOTOR_CONFIG_KEY.to_owned(),
                }
            }
        };

        warn!("{}, using default motor config", source);
        LoadedConfig {
            config: MotorConfig::default(),
            source: ConfigSource::Defaults(source),
        }
    }

    /// Persist the full record
    pub fn save(&self, config: &MotorConfig) -> Result<(), ControlError> {
        let bytes = serde_json::to_vec(config).map_err(io::Error::other)?;
        self.backend.put(MOTOR_CONFIG_KEY, &bytes)?;
        info!("Motor config saved");
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<MotorConfig, ControlError> {
    let corrupt = |reason: String| ControlError::PersistenceCorrupt {
        key: MOTOR_CONFIG_KEY.to_owned(),
        reason,
    };

    let config: MotorConfig = serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
    config.validate().map_err(|e| corrupt(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisConfig;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_ID: AtomicU32 = AtomicU32::new(0);

    fn temp_store_dir() -> PathBuf {
        let id = DIR_ID.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "rc_drive_store_test_{}_{}",
            std::process::id(),
            id
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn tuned() -> MotorConfig {
        MotorConfig {
            control_timeout_ms: 300,
            throttle: AxisConfig {
                effective_limit: 200,
                accel_step: 5,
                start_kick: 80,
            },
            steering: AxisConfig {
                effective_limit: 180,
                accel_step: 15,
                start_kick: 120,
            },
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let store = ConfigStore::new(Arc::new(MemoryStore::new()));
        let loaded = store.load();

        assert_eq!(loaded.config, MotorConfig::default());
        assert!(matches!(
            loaded.source,
            ConfigSource::Defaults(ControlError::PersistenceMiss { .. })
        ));
    }

    #[test]
    fn test_corrupt_config_uses_defaults() {
        let backend = Arc::new(MemoryStore::new());
        let store = ConfigStore::new(backend.clone());

        // Wrong shape, truncated bytes, and out-of-range values all count as corrupt
        let payloads: [&[u8]; 3] = [
            br#"{"controlTimeoutMs":500}"#,
            br#"{"controlTimeoutMs":500,"thro"#,
            br#"{"controlTimeoutMs":500,
                "throttle":{"effectiveLimit":999,"accelStep":10,"startKick":200},
                "steering":{"effectiveLimit":255,"accelStep":10,"startKick":200}}"#,
        ];

        for payload in payloads {
            backend.put(MOTOR_CONFIG_KEY, payload).unwrap();
            let loaded = store.load();
            assert!(loaded.used_defaults());
            assert!(matches!(
                loaded.source,
                ConfigSource::Defaults(ControlError::PersistenceCorrupt { .. })
            ));
            assert_eq!(loaded.config, MotorConfig::default());
        }
    }

    #[test]
    fn test_save_then_load_memory() {
        let store = ConfigStore::new(Arc::new(MemoryStore::new()));
        store.save(&tuned()).unwrap();

        let loaded = store.load();
        assert!(!loaded.used_defaults());
        assert_eq!(loaded.config, tuned());
    }

    #[test]
    fn test_file_store_round_trip_and_no_tmp_left() {
        let dir = temp_store_dir();
        let store = ConfigStore::new(Arc::new(FileStore::open(&dir).unwrap()));

        assert!(store.load().used_defaults());

        store.save(&MotorConfig::default()).unwrap();
        store.save(&tuned()).unwrap();

        // A fresh store over the same directory sees the last full record
        let reopened = ConfigStore::new(Arc::new(FileStore::open(&dir).unwrap()));
        assert_eq!(reopened.load().config, tuned());

        let tmp_path = dir.join(format!("{MOTOR_CONFIG_KEY}.json.tmp"));
        assert!(!tmp_path.exists(), ".tmp file should be gone after rename");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_put_replaces_whole_value() {
        let dir = temp_store_dir();
        let backend = FileStore::open(&dir).unwrap();

        backend.put("record", br#"{"long":"first value"}"#).unwrap();
        backend.put("record", b"{}").unwrap();
        assert_eq!(backend.get("record").unwrap(), Some(b"{}".to_vec()));
        assert!(!dir.join("record.json.tmp").exists());
        assert_eq!(backend.get("absent").unwrap(), None);

        let _ = fs::remove_dir_all(&dir);
    }
}
