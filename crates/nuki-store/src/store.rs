use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use nuki_shared::constants::CONFIG_FILE_NAME;

use crate::config::BridgeConfiguration;
use crate::error::{Result, StoreError};

/// Where the bridge record lives. Implementations must be cheap to call
/// after every registry mutation.
pub trait ConfigStore: Send + Sync {
    /// `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<BridgeConfiguration>>;

    fn save(&self, config: &BridgeConfiguration) -> Result<()>;
}

/// `bridge.json` inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store the record in `dir`, which is created on first save.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    /// The platform data directory:
    /// - Linux:   `~/.local/share/nuki-bridge/bridge.json`
    /// - macOS:   `~/Library/Application Support/com.nuki-bridge.nuki-bridge/bridge.json`
    pub fn default_location() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "nuki-bridge", "nuki-bridge").ok_or(StoreError::NoDataDir)?;
        Ok(Self::in_dir(dirs.data_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<Option<BridgeConfiguration>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no configuration stored yet");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_slice(&raw)?;
        tracing::info!(path = %self.path.display(), "loaded configuration");
        Ok(Some(config))
    }

    fn save(&self, config: &BridgeConfiguration) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(config)?;

        // Readers only ever see a complete record.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), locks = config.locks.len(), "saved configuration");
        Ok(())
    }
}

/// In-memory store, counting saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<(Option<BridgeConfiguration>, usize)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BridgeConfiguration) -> Self {
        Self {
            inner: Mutex::new((Some(config), 0)),
        }
    }

    pub fn saves(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).1
    }

    pub fn current(&self) -> Option<BridgeConfiguration> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).0.clone()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Result<Option<BridgeConfiguration>> {
        Ok(self.current())
    }

    fn save(&self, config: &BridgeConfiguration) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.0 = Some(config.clone());
        inner.1 += 1;
        Ok(())
    }
}
