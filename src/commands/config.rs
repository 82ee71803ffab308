use crate::config::CrabCaptureConfig;
use std::sync::{Arc, RwLock};
use tauri::command;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: Arc<RwLock<CrabCaptureConfig>> = Arc::new(RwLock::new(CrabCaptureConfig::load_or_default()));
}

/// Snapshot of the global configuration for building a widget
pub(crate) fn current_config() -> Result<CrabCaptureConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.clone())
}

/// Get the current configuration
#[command]
pub async fn get_config() -> Result<CrabCaptureConfig, String> {
    current_config()
}

/// Update configuration. Takes effect on the next `initialize_widget`.
#[command]
pub async fn update_config(new_config: CrabCaptureConfig) -> Result<(), String> {
    new_config.validate()?;

    {
        let mut config = GLOBAL_CONFIG.write().map_err(|e| e.to_string())?;
        *config = new_config.clone();
    }

    new_config
        .save_to_file(CrabCaptureConfig::default_path())
        .map_err(|e| e.to_string())?;

    Ok(())
}

/// Reset configuration to defaults
#[command]
pub async fn reset_config() -> Result<CrabCaptureConfig, String> {
    let default_config = CrabCaptureConfig::default();

    {
        let mut config = GLOBAL_CONFIG
            .write()
            .map_err(|e| format!("Failed to write config: {}", e))?;
        *config = default_config.clone();
    }

    default_config
        .save_to_file(CrabCaptureConfig::default_path())
        .map_err(|e| e.to_string())?;

    Ok(default_config)
}
