//! The capture widget: registry, live session and recorder wired together
//!
//! `CaptureWidget` is what a UI mounts. `initialize()` stands in for the
//! mount hook and `shutdown()` for unmount; dropping the widget runs the
//! same teardown.

mod state;

pub use state::{DeviceOption, WidgetState};

use crate::config::CrabCaptureConfig;
use crate::errors::CameraError;
use crate::permissions::PermissionInfo;
use crate::platform::{CaptureBackend, EmittedFile, FileEmitter};
use crate::recording::{RecorderSettings, RecordingController};
use crate::registry::DeviceRegistry;
use crate::session::StreamSession;
use crate::types::{PreviewFrame, StreamConstraints, VideoInputDevice};

pub struct CaptureWidget {
    backend: Box<dyn CaptureBackend>,
    emitter: Box<dyn FileEmitter>,
    config: CrabCaptureConfig,
    registry: DeviceRegistry,
    session: Option<StreamSession>,
    recorder: RecordingController,
    disclaimer_accepted: bool,
    session_error: Option<String>,
    initialized: bool,
}

impl CaptureWidget {
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        emitter: Box<dyn FileEmitter>,
        config: CrabCaptureConfig,
    ) -> Self {
        let recorder = RecordingController::new(RecorderSettings::from_config(&config));
        Self {
            backend,
            emitter,
            config,
            registry: DeviceRegistry::new(),
            session: None,
            recorder,
            disclaimer_accepted: false,
            session_error: None,
            initialized: false,
        }
    }

    /// Discover cameras and open a session on the default one.
    ///
    /// Runs once; later calls return immediately. Failures are logged and
    /// reflected in [`state()`](Self::state), never returned.
    pub fn initialize(&mut self) {
        if self.initialized {
            log::debug!("Widget already initialized");
            return;
        }
        self.initialized = true;
        log::info!("Initializing capture widget with {} backend", self.backend.name());

        if let Err(e) = self.registry.discover_devices(self.backend.as_mut()) {
            log::warn!("Camera unavailable: {}", e);
            return;
        }

        match self.registry.selected_device_id().map(str::to_string) {
            Some(device_id) => self.open_session(device_id),
            None => log::info!("No camera selected; preview stays unavailable"),
        }
    }

    /// Switch to another camera. The current session, and any recording on
    /// it, is closed before the new stream is requested.
    pub fn select_device(&mut self, device_id: &str) {
        if self.registry.selected_device_id() == Some(device_id) && self.session.is_some() {
            log::debug!("Camera {} already active", device_id);
            return;
        }

        self.registry.select_device(device_id);
        self.close_session();
        self.open_session(device_id.to_string());
    }

    fn open_session(&mut self, device_id: String) {
        let [width, height] = self.config.camera.ideal_resolution;
        let constraints = StreamConstraints::new(device_id).with_ideal_resolution(width, height);

        match StreamSession::open(self.backend.as_mut(), &constraints) {
            Ok(session) => {
                self.session = Some(session);
                self.session_error = None;
            }
            Err(e) => {
                log::error!("Failed to open camera {}: {}", constraints.device_id, e);
                self.session_error = Some(e.to_string());
            }
        }
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = self.recorder.stop(Some(session)) {
                log::warn!("Error stopping recording before closing session: {}", e);
            }
            // The sink may have gone idle on its own without a stop signal
            self.recorder.abandon(session.sink_mime_type());
            session.close();
        }
        self.session = None;
    }

    /// Dismiss the one-time acceptance gate
    pub fn accept_disclaimer(&mut self) {
        if !self.disclaimer_accepted {
            log::info!("Disclaimer accepted");
        }
        self.disclaimer_accepted = true;
    }

    pub fn disclaimer_pending(&self) -> bool {
        self.config.ui.require_disclaimer && !self.disclaimer_accepted
    }

    /// Start, or restart, recording on the live session.
    ///
    /// Ignored while the disclaimer is pending or when no session is open.
    pub fn start_recording(&mut self) -> Result<(), CameraError> {
        if self.disclaimer_pending() {
            log::warn!("Start ignored: disclaimer not yet accepted");
            return Ok(());
        }
        self.recorder.start(self.session.as_mut())
    }

    pub fn stop_recording(&mut self) -> Result<(), CameraError> {
        self.recorder.stop(self.session.as_mut())
    }

    /// Emit the current recording as a timestamped file
    pub fn save_recording(&mut self) -> Result<EmittedFile, CameraError> {
        self.process_events();
        let file = self.recorder.save(self.emitter.as_mut())?;
        log::info!("Saved recording as {} ({} bytes)", file.filename, file.size);
        Ok(file)
    }

    /// Apply chunks and stop notifications the sink delivered since the
    /// last call
    pub fn process_events(&mut self) {
        if let Some(session) = self.session.as_mut() {
            self.recorder.process_events(session);
        }
    }

    /// Stop any recording, release the stream and cancel the ticker.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.session.is_some() {
            log::info!("Shutting down capture widget");
        }
        self.close_session();
        self.recorder.teardown();
    }

    pub fn state(&self) -> WidgetState {
        let devices = self
            .registry
            .devices()
            .iter()
            .enumerate()
            .map(|(i, device)| DeviceOption {
                id: device.id.clone(),
                label: device.display_label(i),
            })
            .collect();

        WidgetState {
            devices,
            selected_device_id: self.registry.selected_device_id().map(str::to_string),
            permission_granted: self.registry.permission_granted(),
            permission_status: self.registry.permission_status(),
            stream_live: self.session.as_ref().is_some_and(StreamSession::is_open),
            recorder_state: self.recorder.state(),
            elapsed_seconds: self.recorder.elapsed_seconds(),
            record_button_label: self.recorder.record_button_label().to_string(),
            show_download: self.recorder.show_download(),
            disclaimer_pending: self.disclaimer_pending(),
            disclaimer_text: self.config.ui.disclaimer_text.clone(),
            session_error: self.session_error.clone(),
            artifact: self.recorder.artifact().map(|a| a.summary()),
        }
    }

    pub fn devices(&self) -> &[VideoInputDevice] {
        self.registry.devices()
    }

    pub fn permission_info(&self) -> PermissionInfo {
        self.registry.permission_info()
    }

    pub fn preview_frame(&self) -> Option<PreviewFrame> {
        self.session.as_ref()?.preview_frame()
    }

    pub fn session(&self) -> Result<&StreamSession, CameraError> {
        self.session.as_ref().ok_or(CameraError::NoActiveSession)
    }

    pub fn recorder(&self) -> &RecordingController {
        &self.recorder
    }

    pub fn config(&self) -> &CrabCaptureConfig {
        &self.config
    }
}

impl Drop for CaptureWidget {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for CaptureWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureWidget")
            .field("backend", &self.backend.name())
            .field("registry", &self.registry)
            .field("session", &self.session)
            .field("recorder", &self.recorder)
            .field("disclaimer_accepted", &self.disclaimer_accepted)
            .finish()
    }
}
