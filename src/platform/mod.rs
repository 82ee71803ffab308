//! Host capability seams
//!
//! The widget never talks to a camera directly. Device discovery, stream
//! acquisition, the recording sink and file emission are all behind the
//! traits below, with a nokhwa-backed native implementation, a scripted
//! synthetic implementation and a disk emitter.

pub mod emitter;
pub mod native;
pub mod synthetic;

use crate::errors::CameraError;
use crate::types::{DeviceList, PreviewFrame, StreamConstraints, TrackInfo};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use emitter::{DiskEmitter, EmittedFile, FileEmitter, MemoryEmitter};
pub use native::NativeBackend;
pub use synthetic::{SyntheticBackend, SyntheticSinkHandle};

/// Recorder state as reported by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkState {
    Inactive,
    Recording,
    Stopped,
}

/// Notifications a sink delivers to whoever subscribed to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A chunk of encoded media; may be empty
    DataAvailable(Bytes),
    /// The sink has flushed its last chunk and stopped
    Stopped,
}

/// Receiving end of a sink's event channel
pub type SinkEvents = mpsc::UnboundedReceiver<SinkEvent>;

/// Device discovery and stream acquisition
pub trait CaptureBackend: Send {
    /// Short backend name for logs and diagnostics
    fn name(&self) -> &str;

    /// Request camera access and enumerate video inputs.
    ///
    /// Fails with `Unsupported` when the host has no capture capability and
    /// with `PermissionDenied` on denial or any other failure.
    fn discover_devices(&mut self) -> Result<DeviceList, CameraError>;

    /// Acquire a live stream for exactly `constraints.device_id`
    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// A live capture stream
pub trait MediaStream: Send {
    fn id(&self) -> &str;

    fn device_id(&self) -> &str;

    fn tracks(&self) -> Vec<TrackInfo>;

    /// Stop every constituent track. Safe to call more than once.
    fn stop_tracks(&mut self);

    fn is_live(&self) -> bool {
        self.tracks().iter().any(|t| t.live)
    }

    /// Build the recording sink for this stream together with its event
    /// channel. Called once per stream.
    fn create_sink(&mut self) -> Result<(Box<dyn RecordingSink>, SinkEvents), CameraError>;

    fn preview_frame(&self) -> Option<PreviewFrame> {
        None
    }
}

/// Media recorder bound to one stream
pub trait RecordingSink: Send {
    fn start(&mut self) -> Result<(), CameraError>;

    /// Stop recording. The sink delivers any pending chunk followed by
    /// `SinkEvent::Stopped` before this returns.
    fn stop(&mut self) -> Result<(), CameraError>;

    fn state(&self) -> SinkState;

    /// Encoding the sink actually produces, when it knows
    fn mime_type(&self) -> Option<String> {
        None
    }
}
