//! Configuration management for CrabCapture
//!
//! Provides loading, saving and validation of the capture widget settings:
//! preferred stream resolution, artifact labelling, download location and
//! UI gating.

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrabCaptureConfig {
    pub camera: CameraConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
}

/// Stream acquisition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Preferred (not mandatory) resolution [width, height]
    pub ideal_resolution: [u32; 2],
    /// Preferred frame rate for native capture
    pub ideal_fps: u32,
    /// How long the native backend waits for a stream to come up
    pub open_timeout_ms: u64,
}

/// Recording and artifact settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// MIME type the artifact is labelled with
    pub mime_type: String,
    /// Downloaded filename prefix, followed by an ISO-8601 timestamp
    pub filename_prefix: String,
    /// Downloaded filename extension (without the dot)
    pub file_extension: String,
    /// Elapsed-time ticker period in milliseconds
    pub tick_interval_ms: u64,
}

/// Where saved recordings go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub output_directory: String,
}

/// UI gating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show the one-time acceptance gate before the widget is usable
    pub require_disclaimer: bool,
    pub disclaimer_text: String,
}

impl Default for CrabCaptureConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                ideal_resolution: [1280, 720],
                ideal_fps: 30,
                open_timeout_ms: 5000,
            },
            recording: RecordingConfig {
                mime_type: "video/mp4".to_string(),
                filename_prefix: "recording-".to_string(),
                file_extension: "mp4".to_string(),
                tick_interval_ms: 1000,
            },
            storage: StorageConfig {
                output_directory: "./recordings".to_string(),
            },
            ui: UiConfig {
                require_disclaimer: true,
                disclaimer_text:
                    "This is a disclaimer. Please read and accept before starting recording."
                        .to_string(),
            },
        }
    }
}

impl CrabCaptureConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::InitializationError(format!("Failed to read config file: {}", e))
        })?;

        let config: CrabCaptureConfig = toml::from_str(&contents).map_err(|e| {
            CameraError::InitializationError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::InitializationError(format!(
                    "Failed to create config directory: {}",
                    e
                ))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CameraError::InitializationError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CameraError::InitializationError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("crabcapture.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.ideal_resolution[0] == 0 || self.camera.ideal_resolution[1] == 0 {
            return Err("Invalid ideal resolution".to_string());
        }
        if self.camera.ideal_fps == 0 || self.camera.ideal_fps > 240 {
            return Err("Invalid ideal FPS (must be 1-240)".to_string());
        }
        if self.camera.open_timeout_ms == 0 {
            return Err("Open timeout must be positive".to_string());
        }

        if !self.recording.mime_type.contains('/') {
            return Err("MIME type must look like type/subtype".to_string());
        }
        if self.recording.file_extension.is_empty() || self.recording.file_extension.contains('.')
        {
            return Err("File extension must be non-empty and without a dot".to_string());
        }
        if self.recording.tick_interval_ms == 0 || self.recording.tick_interval_ms > 60_000 {
            return Err("Tick interval must be between 1 and 60000 ms".to_string());
        }

        if self.storage.output_directory.trim().is_empty() {
            return Err("Output directory must not be empty".to_string());
        }

        Ok(())
    }
}
