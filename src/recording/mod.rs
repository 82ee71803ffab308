//! Recording lifecycle for the capture widget
//!
//! The controller drives a platform recording sink:
//! - chunks arrive over the sink's event channel and accumulate in order
//! - stopping turns the chunks into a [`RecordingArtifact`]
//! - saving hands the blob to a [`FileEmitter`](crate::platform::FileEmitter)
//!
//! # Example
//! ```rust,ignore
//! use crabcapture::recording::RecordingController;
//!
//! let mut controller = RecordingController::default();
//! controller.start(Some(&mut session))?;
//! // ... chunks arrive ...
//! controller.stop(Some(&mut session))?;
//! let file = controller.save(&mut emitter)?;
//! ```

mod artifact;
mod controller;

pub use artifact::{recording_filename, ArtifactSummary, ChunkBuffer, RecordingArtifact};
pub use controller::{RecorderSettings, RecorderState, RecordingController};
