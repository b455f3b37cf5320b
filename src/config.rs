use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// Player-facing settings. The controller reads these but never writes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub key_binding: String,
    pub live_timer: bool,
    pub sound_effects: bool,
    pub flash_effects: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_binding: "Numpad5".to_string(),
            live_timer: true,
            sound_effects: true,
            flash_effects: true,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Settings {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Settings>(&bytes) {
                Ok(settings) => return settings,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            },
            Err(e) => log::debug!("no config at {}: {e}", self.path.display()),
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)
    }
}

/// Keeps settings in memory only; used when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    settings: std::cell::RefCell<Option<Settings>>,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Settings {
        self.settings.borrow().clone().unwrap_or_default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        *self.settings.borrow_mut() = Some(settings.clone());
        Ok(())
    }
}
