use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

static SETTINGS_FILE_NAME: &str = "settings.json";

pub struct ProjectConfig {
    pub settings: Settings,
    pub project_dirs: ProjectDirs,
}

impl ProjectConfig {
    pub async fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "worksite", "worksite-sync")
            .ok_or_else(|| anyhow!("Failed to get project directories"))?;
        for dir in [proj_dirs.config_dir(), proj_dirs.data_dir()] {
            if !dir.exists() {
                fs::create_dir_all(dir).context("Failed to create project directory")?;
            }
        }

        let settings = Settings::new(&proj_dirs.config_dir().join(SETTINGS_FILE_NAME)).await?;
        Ok(Self {
            settings,
            project_dirs: proj_dirs,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    pub sync: SyncSettings,
    pub server: ServerSettings,
}

/// Retry behavior of the sync executor. Kept in the settings file rather
/// than as constants so deployments (and tests) can tune them.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncSettings {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8720".to_string(),
        }
    }
}

impl Settings {
    pub async fn new(config_file_path: &Path) -> Result<Self> {
        match Self::load_settings_from_file(config_file_path) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(
                    "Error loading settings from file - creating default config: {}",
                    e
                );
                let default = Self::default();
                default.save_to_file(config_file_path)?;
                Ok(default)
            }
        }
    }

    pub fn load_settings_from_file(config_file_path: &Path) -> Result<Self> {
        if !config_file_path.exists() {
            return Err(anyhow!("Config file not found"));
        }
        let data = fs::read_to_string(config_file_path)?;
        let settings: Self = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, config_file_path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(config_file_path, data).context("Failed to write settings file")?;
        Ok(())
    }
}
