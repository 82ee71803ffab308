//! Tauri command surface, driven against a synthetic widget
//!
//! The commands share one global widget, so the whole flow runs in a single
//! test.

use crabcapture::commands::*;
use crabcapture::platform::{MemoryEmitter, SyntheticBackend};
use crabcapture::{CaptureWidget, CrabCaptureConfig, PermissionStatus, RecorderState};
use std::time::Duration;

// Widget work runs on the blocking pool; a multi-threaded runtime keeps the
// worker threads free for the ticker meanwhile
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_command_flow() {
    // Nothing mounted yet
    assert!(get_widget_state().await.is_err());
    assert!(start_recording().await.is_err());
    shutdown_widget().await.unwrap();

    let backend = SyntheticBackend::with_cameras(2);
    let emitter = MemoryEmitter::new();
    let widget = CaptureWidget::new(
        Box::new(backend.clone()),
        Box::new(emitter.clone()),
        CrabCaptureConfig::default(),
    );
    let state = install_widget(widget).await.unwrap();
    assert_eq!(state.selected_device_id.as_deref(), Some("synthetic-0"));
    assert!(state.disclaimer_pending);

    // Mounting again keeps the existing widget
    let again = initialize_widget().await.unwrap();
    assert_eq!(again.selected_device_id.as_deref(), Some("synthetic-0"));
    assert_eq!(backend.sink_count(), 1);

    let devices = list_video_devices().await.unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[1].label, "Synthetic Camera 2");

    let permission = get_permission_status().await.unwrap();
    assert_eq!(permission.status, PermissionStatus::Granted);
    assert_eq!(permission.device_count, 2);

    assert!(get_preview_frame().await.unwrap().is_some());

    // Gated until the disclaimer is accepted
    let state = start_recording().await.unwrap();
    assert_eq!(state.recorder_state, RecorderState::Idle);
    assert!(!accept_disclaimer().await.unwrap().disclaimer_pending);

    let state = select_video_device("synthetic-1".to_string()).await.unwrap();
    assert_eq!(state.selected_device_id.as_deref(), Some("synthetic-1"));
    assert_eq!(backend.live_streams(), 1);

    let state = start_recording().await.unwrap();
    assert!(state.is_recording());
    let sink = backend.current_sink().unwrap();
    sink.push_chunk_of_size(1024);
    sink.push_chunk_of_size(2048);

    // The ticker was started from a blocking-pool thread and still counts
    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert!(get_widget_state().await.unwrap().elapsed_seconds >= 1);

    let state = stop_recording().await.unwrap();
    assert!(state.show_download);
    assert_eq!(state.artifact.unwrap().size, 3072);

    let file = save_recording().await.unwrap();
    assert!(file.filename.ends_with(".mp4"));
    assert_eq!(emitter.blobs().len(), 1);

    shutdown_widget().await.unwrap();
    assert_eq!(backend.live_streams(), 0);
    assert!(get_widget_state().await.is_err());
}

#[tokio::test]
async fn test_config_commands_read_validated_config() {
    let config = get_config().await.unwrap();
    assert!(config.validate().is_ok());

    let mut invalid = config.clone();
    invalid.recording.tick_interval_ms = 0;
    assert!(update_config(invalid).await.is_err());
}
