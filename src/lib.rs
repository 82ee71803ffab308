//! CrabCapture: a camera capture widget for Tauri applications
//!
//! Pick a camera, preview it, record a session and download the result.
//! The widget state machine lives in Rust; camera access, recording and
//! file emission sit behind the traits in [`platform`].
//!
//! # Features
//! - Camera discovery with a default selection and permission reporting
//! - One live stream at a time, closed before the next one opens
//! - Start / stop / restart recording with an elapsed-seconds counter
//! - Timestamped `.mp4` download of the recorded chunks
//! - Headless use through [`CaptureWidget`] and a synthetic backend
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! crabcapture = "0.1"
//! tauri = { version = "2.0", features = ["protocol-asset"] }
//! ```
//!
//! Then in your Tauri app:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(crabcapture::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
pub mod commands;
pub mod config;
pub mod errors;
pub mod permissions;
pub mod platform;
pub mod recording;
pub mod registry;
pub mod session;
pub mod timing;
pub mod types;
pub mod widget;

// Re-exports for convenience
pub use config::CrabCaptureConfig;
pub use errors::CameraError;
pub use permissions::{PermissionInfo, PermissionStatus};
pub use platform::{CaptureBackend, FileEmitter, MediaStream, RecordingSink};
pub use recording::{RecorderState, RecordingArtifact, RecordingController};
pub use registry::DeviceRegistry;
pub use session::StreamSession;
pub use types::{StreamConstraints, VideoInputDevice};
pub use widget::{CaptureWidget, WidgetState};

use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the CrabCapture plugin with all commands
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("crabcapture")
        .invoke_handler(tauri::generate_handler![
            // Widget lifecycle
            commands::widget::initialize_widget,
            commands::widget::get_widget_state,
            commands::widget::list_video_devices,
            commands::widget::select_video_device,
            commands::widget::accept_disclaimer,
            commands::widget::get_preview_frame,
            commands::widget::shutdown_widget,
            // Recording
            commands::recording::start_recording,
            commands::recording::stop_recording,
            commands::recording::save_recording,
            // Permissions
            commands::permissions::get_permission_status,
            // Configuration
            commands::config::get_config,
            commands::config::update_config,
            commands::config::reset_config,
        ])
        .build()
}

/// Initialize logging for the capture widget
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabcapture=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "crabcapture");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }
}
