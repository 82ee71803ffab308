//! Stream session: one live stream plus the recording sink attached to it

use crate::errors::CameraError;
use crate::platform::{CaptureBackend, MediaStream, RecordingSink, SinkEvent, SinkEvents, SinkState};
use crate::types::{PreviewFrame, PreviewState, StreamConstraints, TrackInfo};

/// Exclusive owner of a live stream and its sink
///
/// Dropping the session closes it.
pub struct StreamSession {
    stream: Box<dyn MediaStream>,
    sink: Box<dyn RecordingSink>,
    events: SinkEvents,
    preview: PreviewState,
    closed: bool,
}

impl StreamSession {
    /// Acquire a stream for exactly `constraints.device_id`, start muted
    /// inline preview and attach a fresh recording sink.
    pub fn open(
        backend: &mut dyn CaptureBackend,
        constraints: &StreamConstraints,
    ) -> Result<Self, CameraError> {
        log::info!(
            "Opening stream for camera {} via {}",
            constraints.device_id,
            backend.name()
        );

        let mut stream = backend.open_stream(constraints).map_err(|e| match e {
            CameraError::CaptureError(_) => e,
            other => CameraError::CaptureError(other.to_string()),
        })?;

        let (sink, events) = match stream.create_sink() {
            Ok(pair) => pair,
            Err(e) => {
                stream.stop_tracks();
                return Err(CameraError::CaptureError(format!(
                    "Failed to attach recorder: {}",
                    e
                )));
            }
        };

        Ok(Self {
            stream,
            sink,
            events,
            preview: PreviewState {
                playing: true,
                ..PreviewState::default()
            },
            closed: false,
        })
    }

    /// Stop any recording in progress, then every track. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if self.sink.state() == SinkState::Recording {
            if let Err(e) = self.sink.stop() {
                log::warn!("Error stopping recorder during close: {}", e);
            }
        }
        self.stream.stop_tracks();
        self.preview.playing = false;
        self.closed = true;
        log::info!("Closed stream for camera {}", self.stream.device_id());
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    pub fn device_id(&self) -> &str {
        self.stream.device_id()
    }

    pub fn stream_id(&self) -> &str {
        self.stream.id()
    }

    pub fn tracks(&self) -> Vec<TrackInfo> {
        self.stream.tracks()
    }

    pub fn preview(&self) -> PreviewState {
        self.preview
    }

    pub fn preview_frame(&self) -> Option<PreviewFrame> {
        if self.closed {
            return None;
        }
        self.stream.preview_frame()
    }

    pub fn sink_state(&self) -> SinkState {
        self.sink.state()
    }

    pub fn sink_mime_type(&self) -> Option<String> {
        self.sink.mime_type()
    }

    pub(crate) fn sink_mut(&mut self) -> &mut dyn RecordingSink {
        self.sink.as_mut()
    }

    /// Next pending sink notification, if any
    pub(crate) fn try_next_event(&mut self) -> Option<SinkEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("stream_id", &self.stream.id())
            .field("device_id", &self.stream.device_id())
            .field("sink_state", &self.sink.state())
            .field("closed", &self.closed)
            .finish()
    }
}
