//! Scripted in-memory capture backend
//!
//! Stands in for real hardware in tests and in the CLI's `--synthetic` mode.
//! The backend handle is cheap to clone; all clones observe the same
//! devices, open streams and sinks, so a test can keep one handle while the
//! widget owns another.

use super::{CaptureBackend, MediaStream, RecordingSink, SinkEvent, SinkEvents, SinkState};
use crate::errors::CameraError;
use crate::types::{
    DeviceList, PreviewFrame, StreamConstraints, TrackInfo, TrackKind, VideoInputDevice,
};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// How discovery should behave
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Grant,
    Deny,
    Unsupported,
}

/// Stream lifecycle as seen by the backend, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Opened(String),
    Closed(String),
}

#[derive(Debug)]
struct BackendState {
    devices: DeviceList,
    discovery: DiscoveryOutcome,
    failing_devices: HashSet<String>,
    sink_mime: Option<String>,
    live_streams: usize,
    max_live_streams: usize,
    history: Vec<StreamEvent>,
    sinks: Vec<SyntheticSinkHandle>,
    frames_served: u64,
}

#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    state: Arc<Mutex<BackendState>>,
}

impl SyntheticBackend {
    pub fn new(devices: DeviceList) -> Self {
        Self {
            state: Arc::new(Mutex::new(BackendState {
                devices,
                discovery: DiscoveryOutcome::Grant,
                failing_devices: HashSet::new(),
                sink_mime: None,
                live_streams: 0,
                max_live_streams: 0,
                history: Vec::new(),
                sinks: Vec::new(),
                frames_served: 0,
            })),
        }
    }

    /// Backend with `count` cameras named "Synthetic Camera N"
    pub fn with_cameras(count: usize) -> Self {
        let devices = (0..count)
            .map(|i| {
                VideoInputDevice::new(
                    format!("synthetic-{}", i),
                    format!("Synthetic Camera {}", i + 1),
                )
            })
            .collect();
        Self::new(devices)
    }

    pub fn set_discovery(&self, outcome: DiscoveryOutcome) {
        self.lock().discovery = outcome;
    }

    /// Make stream acquisition fail for `device_id`, as if the device were busy
    pub fn fail_device(&self, device_id: impl Into<String>) {
        self.lock().failing_devices.insert(device_id.into());
    }

    /// Encoding the sinks claim to produce
    pub fn set_sink_mime(&self, mime: impl Into<String>) {
        self.lock().sink_mime = Some(mime.into());
    }

    pub fn live_streams(&self) -> usize {
        self.lock().live_streams
    }

    /// Highest number of streams that were ever live at the same time
    pub fn max_live_streams(&self) -> usize {
        self.lock().max_live_streams
    }

    pub fn history(&self) -> Vec<StreamEvent> {
        self.lock().history.clone()
    }

    /// Handle to the most recently created sink
    pub fn current_sink(&self) -> Option<SyntheticSinkHandle> {
        self.lock().sinks.last().cloned()
    }

    pub fn sink_count(&self) -> usize {
        self.lock().sinks.len()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CaptureBackend for SyntheticBackend {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn discover_devices(&mut self) -> Result<DeviceList, CameraError> {
        let state = self.lock();
        match state.discovery {
            DiscoveryOutcome::Grant => Ok(state.devices.clone()),
            DiscoveryOutcome::Deny => Err(CameraError::PermissionDenied(
                "synthetic camera access denied".to_string(),
            )),
            DiscoveryOutcome::Unsupported => Err(CameraError::Unsupported(
                "synthetic host has no media devices".to_string(),
            )),
        }
    }

    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        let mut state = self.lock();
        if state.failing_devices.contains(&constraints.device_id) {
            return Err(CameraError::CaptureError(format!(
                "device {} is busy",
                constraints.device_id
            )));
        }
        if !state.devices.iter().any(|d| d.id == constraints.device_id) {
            return Err(CameraError::CaptureError(format!(
                "no device satisfies exact id {}",
                constraints.device_id
            )));
        }

        state.live_streams += 1;
        state.max_live_streams = state.max_live_streams.max(state.live_streams);
        state
            .history
            .push(StreamEvent::Opened(constraints.device_id.clone()));
        drop(state);

        Ok(Box::new(SyntheticStream {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: constraints.device_id.clone(),
            width: constraints.ideal_width,
            height: constraints.ideal_height,
            live: true,
            backend: self.clone(),
        }))
    }
}

struct SyntheticStream {
    id: String,
    device_id: String,
    width: u32,
    height: u32,
    live: bool,
    backend: SyntheticBackend,
}

impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        vec![TrackInfo {
            id: format!("{}-video", self.id),
            kind: TrackKind::Video,
            live: self.live,
        }]
    }

    fn stop_tracks(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        let mut state = self.backend.lock();
        state.live_streams = state.live_streams.saturating_sub(1);
        state.history.push(StreamEvent::Closed(self.device_id.clone()));
    }

    fn create_sink(&mut self) -> Result<(Box<dyn RecordingSink>, SinkEvents), CameraError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.backend.lock();
        let handle = SyntheticSinkHandle {
            shared: Arc::new(Mutex::new(SinkShared {
                state: SinkState::Inactive,
                tx,
                final_chunk: None,
                mime: state.sink_mime.clone(),
                failure: None,
            })),
        };
        state.sinks.push(handle.clone());
        Ok((Box::new(SyntheticSink { handle }), rx))
    }

    fn preview_frame(&self) -> Option<PreviewFrame> {
        if !self.live {
            return None;
        }
        let frame_number = {
            let mut state = self.backend.lock();
            state.frames_served += 1;
            state.frames_served
        };
        Some(synthetic_preview_frame(frame_number, self.width, self.height))
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

/// Gradient RGB frame that shifts with every frame number
pub fn synthetic_preview_frame(frame_number: u64, width: u32, height: u32) -> PreviewFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];
    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }
    PreviewFrame {
        width,
        height,
        format: "RGB8".to_string(),
        data,
    }
}

#[derive(Debug)]
struct SinkShared {
    state: SinkState,
    tx: mpsc::UnboundedSender<SinkEvent>,
    final_chunk: Option<Bytes>,
    mime: Option<String>,
    /// Set once the recorder is broken; start and stop then fail
    failure: Option<String>,
}

/// Test-side control over a synthetic sink
#[derive(Debug, Clone)]
pub struct SyntheticSinkHandle {
    shared: Arc<Mutex<SinkShared>>,
}

impl SyntheticSinkHandle {
    /// Deliver a chunk as the platform recorder would. Chunks are only
    /// delivered while recording; returns whether it was delivered.
    pub fn push_chunk(&self, data: impl Into<Bytes>) -> bool {
        let shared = self.lock();
        if shared.state != SinkState::Recording {
            return false;
        }
        shared.tx.send(SinkEvent::DataAvailable(data.into())).is_ok()
    }

    /// Deliver a chunk of `size` filler bytes
    pub fn push_chunk_of_size(&self, size: usize) -> bool {
        self.push_chunk(vec![0xAB; size])
    }

    /// Chunk flushed right before the stop notification
    pub fn set_final_chunk(&self, data: impl Into<Bytes>) {
        self.lock().final_chunk = Some(data.into());
    }

    /// Make every later `start` and `stop` fail, as a recorder whose
    /// device went away would
    pub fn break_recorder(&self, reason: impl Into<String>) {
        self.lock().failure = Some(reason.into());
    }

    pub fn state(&self) -> SinkState {
        self.lock().state
    }

    fn lock(&self) -> MutexGuard<'_, SinkShared> {
        self.shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct SyntheticSink {
    handle: SyntheticSinkHandle,
}

impl RecordingSink for SyntheticSink {
    fn start(&mut self) -> Result<(), CameraError> {
        let mut shared = self.handle.lock();
        if let Some(reason) = &shared.failure {
            return Err(CameraError::CaptureError(reason.clone()));
        }
        if shared.state == SinkState::Recording {
            return Err(CameraError::CaptureError(
                "recorder is already recording".to_string(),
            ));
        }
        shared.state = SinkState::Recording;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        let mut shared = self.handle.lock();
        if shared.state != SinkState::Recording {
            return Ok(());
        }
        if let Some(reason) = &shared.failure {
            return Err(CameraError::CaptureError(reason.clone()));
        }
        shared.state = SinkState::Stopped;
        if let Some(chunk) = shared.final_chunk.take() {
            let _ = shared.tx.send(SinkEvent::DataAvailable(chunk));
        }
        let _ = shared.tx.send(SinkEvent::Stopped);
        Ok(())
    }

    fn state(&self) -> SinkState {
        self.handle.state()
    }

    fn mime_type(&self) -> Option<String> {
        self.handle.lock().mime.clone()
    }
}
