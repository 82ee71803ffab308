//! Recording controller: start / stop / save on top of the live session

use super::artifact::{recording_filename, ChunkBuffer, RecordingArtifact};
use crate::config::CrabCaptureConfig;
use crate::errors::CameraError;
use crate::platform::{EmittedFile, FileEmitter, SinkEvent, SinkState};
use crate::session::StreamSession;
use crate::timing::{ElapsedCounter, ElapsedTicker};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recorder lifecycle as the UI sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecorderState {
    /// Nothing recorded on this session yet
    Idle,
    Recording,
    /// Stopped, with an artifact ready to download
    IdleWithArtifact,
}

/// Artifact labelling and ticker settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderSettings {
    pub mime_type: String,
    pub filename_prefix: String,
    pub file_extension: String,
    pub tick_interval: Duration,
}

impl RecorderSettings {
    pub fn from_config(config: &CrabCaptureConfig) -> Self {
        Self {
            mime_type: config.recording.mime_type.clone(),
            filename_prefix: config.recording.filename_prefix.clone(),
            file_extension: config.recording.file_extension.clone(),
            tick_interval: Duration::from_millis(config.recording.tick_interval_ms),
        }
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self::from_config(&CrabCaptureConfig::default())
    }
}

#[derive(Debug)]
pub struct RecordingController {
    settings: RecorderSettings,
    state: RecorderState,
    buffer: ChunkBuffer,
    artifact: Option<RecordingArtifact>,
    elapsed: ElapsedCounter,
    ticker: Option<ElapsedTicker>,
}

impl RecordingController {
    pub fn new(settings: RecorderSettings) -> Self {
        Self {
            settings,
            state: RecorderState::Idle,
            buffer: ChunkBuffer::new(),
            artifact: None,
            elapsed: ElapsedCounter::new(),
            ticker: None,
        }
    }

    /// Begin a new recording on `session`.
    ///
    /// Without a session this does nothing. Otherwise the sink starts, then
    /// any previous chunks and artifact are discarded and the elapsed counter
    /// restarts from 0 under a fresh ticker. If the sink refuses to start the
    /// previous artifact is kept.
    pub fn start(&mut self, session: Option<&mut StreamSession>) -> Result<(), CameraError> {
        let Some(session) = session else {
            log::debug!("Start ignored: no active stream session");
            return Ok(());
        };

        if session.sink_state() == SinkState::Recording {
            log::warn!("Start ignored: already recording");
            return Ok(());
        }

        // Leftovers from the previous recording belong to nobody now
        while session.try_next_event().is_some() {}

        session.sink_mut().start()?;
        self.buffer.clear();
        self.artifact = None;

        self.ticker = None;
        match ElapsedTicker::start(self.elapsed.clone(), self.settings.tick_interval) {
            Ok(ticker) => self.ticker = Some(ticker),
            Err(e) => {
                self.elapsed.reset();
                log::warn!("Recording without elapsed ticker: {}", e);
            }
        }

        self.state = RecorderState::Recording;
        log::info!("Recording started on camera {}", session.device_id());
        Ok(())
    }

    /// Stop the current recording. Does nothing unless the sink is recording.
    pub fn stop(&mut self, session: Option<&mut StreamSession>) -> Result<(), CameraError> {
        let Some(session) = session else {
            return Ok(());
        };
        if session.sink_state() != SinkState::Recording {
            return Ok(());
        }

        if let Err(e) = session.sink_mut().stop() {
            self.process_events(session);
            self.abandon(session.sink_mime_type());
            return Err(e);
        }
        self.ticker = None;
        self.process_events(session);

        if self.state == RecorderState::Recording {
            // Sink stopped without telling us; finish from what we have
            log::warn!("Recorder stopped without a completion signal");
            self.finish(session.sink_mime_type());
        }
        Ok(())
    }

    /// Apply every pending sink notification
    pub fn process_events(&mut self, session: &mut StreamSession) {
        while let Some(event) = session.try_next_event() {
            match event {
                SinkEvent::DataAvailable(chunk) => {
                    if self.state != RecorderState::Recording {
                        log::debug!("Dropping {} byte chunk outside a recording", chunk.len());
                        continue;
                    }
                    let size = chunk.len();
                    if !self.buffer.push(chunk) {
                        log::trace!("Skipped empty chunk");
                    } else {
                        log::trace!("Appended {} byte chunk ({} total)", size, self.buffer.len());
                    }
                }
                SinkEvent::Stopped => {
                    if self.state == RecorderState::Recording {
                        self.finish(session.sink_mime_type());
                    }
                }
            }
        }
    }

    /// Give up on a recording whose sink cannot be stopped cleanly.
    ///
    /// The ticker is cancelled and whatever chunks arrived become the
    /// artifact. Does nothing unless recording.
    pub fn abandon(&mut self, reported_mime: Option<String>) {
        if self.state != RecorderState::Recording {
            return;
        }
        log::warn!(
            "Abandoning recording with {} chunks received",
            self.buffer.len()
        );
        self.finish(reported_mime);
    }

    fn finish(&mut self, reported_mime: Option<String>) {
        self.ticker = None;
        self.elapsed.reset();

        let artifact =
            RecordingArtifact::from_chunks(&self.buffer, self.settings.mime_type.clone(), reported_mime);
        if artifact.is_mislabeled() {
            log::warn!(
                "Recording labelled {} but recorder produced {}",
                artifact.mime_type,
                artifact.reported_mime.as_deref().unwrap_or("unknown")
            );
        }
        log::info!(
            "Recording stopped: {} chunks, {} bytes",
            artifact.chunk_count,
            artifact.size()
        );

        self.artifact = Some(artifact);
        self.state = RecorderState::IdleWithArtifact;
    }

    /// Hand the accumulated chunks to `emitter` as one timestamped file.
    ///
    /// Saving before any recording completed emits an empty blob.
    pub fn save(&self, emitter: &mut dyn FileEmitter) -> Result<EmittedFile, CameraError> {
        if self.artifact.is_none() {
            log::warn!("Saving before a recording has completed");
        }

        let blob = self.buffer.concat();
        let filename = recording_filename(
            &self.settings.filename_prefix,
            &self.settings.file_extension,
            chrono::Utc::now(),
        );
        emitter.emit(&blob, &self.settings.mime_type, &filename)
    }

    /// Return to `Idle`, dropping ticker, chunks and artifact
    pub fn teardown(&mut self) {
        self.ticker = None;
        self.elapsed.reset();
        self.buffer.clear();
        self.artifact = None;
        self.state = RecorderState::Idle;
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.get()
    }

    pub fn artifact(&self) -> Option<&RecordingArtifact> {
        self.artifact.as_ref()
    }

    pub fn chunks(&self) -> &ChunkBuffer {
        &self.buffer
    }

    pub fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn record_button_label(&self) -> &'static str {
        if self.buffer.is_empty() {
            "Start Recording"
        } else {
            "Restart Recording"
        }
    }

    pub fn show_download(&self) -> bool {
        self.artifact.is_some() && !self.is_recording()
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }
}

impl Default for RecordingController {
    fn default() -> Self {
        Self::new(RecorderSettings::default())
    }
}
