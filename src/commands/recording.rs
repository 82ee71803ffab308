//! Tauri commands for the recording controls
//!
//! Each command returns the widget state after the action so the UI can
//! re-render from a single response.

use super::widget::with_widget;
use crate::platform::EmittedFile;
use crate::widget::WidgetState;
use tauri::command;

/// Start, or restart, recording on the live camera
#[command]
pub async fn start_recording() -> Result<WidgetState, String> {
    with_widget(|widget| {
        widget.process_events();
        widget
            .start_recording()
            .map_err(|e| format!("Failed to start recording: {}", e))?;
        Ok(widget.state())
    })
    .await
}

/// Stop the current recording; the artifact becomes downloadable
#[command]
pub async fn stop_recording() -> Result<WidgetState, String> {
    with_widget(|widget| {
        widget.process_events();
        widget
            .stop_recording()
            .map_err(|e| format!("Failed to stop recording: {}", e))?;
        Ok(widget.state())
    })
    .await
}

/// Write the current recording to the configured output directory
#[command]
pub async fn save_recording() -> Result<EmittedFile, String> {
    with_widget(|widget| {
        widget.save_recording().map_err(|e| {
            log::error!("Failed to save recording: {}", e);
            format!("Failed to save recording: {}", e)
        })
    })
    .await
}
