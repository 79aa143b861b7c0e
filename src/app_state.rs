use std::sync::Arc;

use anyhow::Result;

use crate::config::ProjectConfig;
use crate::persistency::PersistencyManager;
use crate::sync::handler_registry::RegistryFactory;
use crate::sync::sync_executor::RetryConfig;

#[derive(Clone)]
pub struct AppState {
    pub project_config: Arc<ProjectConfig>,
    pub persistency_manager: Arc<PersistencyManager>,
    pub registry_factory: Arc<dyn RegistryFactory>,
}

impl AppState {
    pub fn persistency(&self) -> &PersistencyManager {
        &self.persistency_manager
    }

    /// Retry configuration from settings, handed to each executor
    pub fn retry_config(&self) -> RetryConfig {
        let sync = &self.project_config.settings.sync;
        RetryConfig {
            max_retries: sync.max_retries,
            delay_ms: sync.retry_delay_ms,
        }
    }
}

pub async fn app_state_factory(registry_factory: Arc<dyn RegistryFactory>) -> Result<AppState> {
    let project_config = ProjectConfig::new().await?;
    let persistency_manager =
        PersistencyManager::new(project_config.project_dirs.data_dir().to_path_buf()).await?;

    Ok(AppState {
        project_config: Arc::new(project_config),
        persistency_manager: Arc::new(persistency_manager),
        registry_factory,
    })
}
