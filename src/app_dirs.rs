use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "sweetspot")
            .map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("sweetspot_config.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("sweetspot");
            Some(state_dir.join("sweetspot.log"))
        } else {
            ProjectDirs::from("", "", "sweetspot")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("sweetspot.log"))
        }
    }
}
