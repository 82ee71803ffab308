use super::config::current_config;
use crate::platform::{DiskEmitter, NativeBackend};
use crate::types::PreviewFrame;
use crate::widget::{CaptureWidget, DeviceOption, WidgetState};
use std::sync::Arc;
use tauri::command;
use tokio::sync::Mutex as AsyncMutex;

// The one widget the frontend talks to
lazy_static::lazy_static! {
    static ref WIDGET: Arc<AsyncMutex<Option<CaptureWidget>>> = Arc::new(AsyncMutex::new(None));
}

/// Run `f` against the mounted widget.
///
/// Widget calls block on the camera (stream handshakes, thread joins, file
/// writes), so they run on the blocking pool with the slot lock held.
pub(crate) async fn with_widget<T, F>(f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&mut CaptureWidget) -> Result<T, String> + Send + 'static,
{
    with_slot(move |slot| match slot.as_mut() {
        Some(widget) => f(widget),
        None => Err("Widget not initialized".to_string()),
    })
    .await
}

async fn with_slot<T, F>(f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&mut Option<CaptureWidget>) -> Result<T, String> + Send + 'static,
{
    let mut slot = WIDGET.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || f(&mut *slot))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
}

/// Mount `widget`, replacing (and shutting down) any widget already mounted.
///
/// `initialize_widget` builds the native widget; hosts embedding another
/// backend mount theirs through this.
pub async fn install_widget(widget: CaptureWidget) -> Result<WidgetState, String> {
    with_slot(move |slot| Ok(mount(slot, widget))).await
}

fn mount(slot: &mut Option<CaptureWidget>, mut widget: CaptureWidget) -> WidgetState {
    if let Some(mut previous) = slot.take() {
        previous.shutdown();
    }
    widget.initialize();
    let state = widget.state();
    *slot = Some(widget);
    state
}

/// Mount the widget on the native camera backend: discover cameras and
/// open a preview on the first one. Returns the existing state when
/// already mounted.
#[command]
pub async fn initialize_widget() -> Result<WidgetState, String> {
    with_slot(|slot| {
        if let Some(widget) = slot.as_ref() {
            log::debug!("Widget already mounted");
            return Ok(widget.state());
        }

        let config = current_config()?;
        let backend = NativeBackend::from_config(&config);
        let emitter = DiskEmitter::new(&config.storage.output_directory);
        let widget = CaptureWidget::new(Box::new(backend), Box::new(emitter), config);

        let state = mount(slot, widget);
        log::info!(
            "Widget mounted: {} cameras, permission granted: {}",
            state.devices.len(),
            state.permission_granted
        );
        Ok(state)
    })
    .await
}

/// Current widget state, with pending recorder output applied
#[command]
pub async fn get_widget_state() -> Result<WidgetState, String> {
    with_widget(|widget| {
        widget.process_events();
        Ok(widget.state())
    })
    .await
}

/// Cameras for the device picker
#[command]
pub async fn list_video_devices() -> Result<Vec<DeviceOption>, String> {
    with_widget(|widget| Ok(widget.state().devices)).await
}

/// Switch the preview, and any recording, to another camera
#[command]
pub async fn select_video_device(device_id: String) -> Result<WidgetState, String> {
    log::info!("Selecting camera {}", device_id);
    with_widget(move |widget| {
        widget.process_events();
        widget.select_device(&device_id);
        Ok(widget.state())
    })
    .await
}

/// Dismiss the acceptance gate
#[command]
pub async fn accept_disclaimer() -> Result<WidgetState, String> {
    with_widget(|widget| {
        widget.accept_disclaimer();
        Ok(widget.state())
    })
    .await
}

/// Latest preview frame of the live camera, if any
#[command]
pub async fn get_preview_frame() -> Result<Option<PreviewFrame>, String> {
    with_widget(|widget| Ok(widget.preview_frame())).await
}

/// Unmount the widget, releasing the camera. Safe to call when nothing is
/// mounted.
#[command]
pub async fn shutdown_widget() -> Result<(), String> {
    with_slot(|slot| {
        if let Some(mut widget) = slot.take() {
            widget.shutdown();
            log::info!("Widget unmounted");
        }
        Ok(())
    })
    .await
}
