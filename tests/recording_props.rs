//! Property-based tests for the recorder and session invariants
//!
//! These tests drive the widget with proptest-generated chunk streams and
//! device selections on the synthetic backend.

use crabcapture::platform::{MemoryEmitter, SyntheticBackend};
use crabcapture::{CaptureWidget, CrabCaptureConfig, RecorderState};
use proptest::prelude::*;

fn widget_on(backend: &SyntheticBackend) -> CaptureWidget {
    let mut config = CrabCaptureConfig::default();
    config.ui.require_disclaimer = false;
    let mut widget = CaptureWidget::new(
        Box::new(backend.clone()),
        Box::new(MemoryEmitter::new()),
        config,
    );
    widget.initialize();
    widget
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
}

proptest! {
    /// Zero-size chunks never reach the buffer; everything else is kept in order
    #[test]
    fn empty_chunks_are_filtered(sizes in prop::collection::vec(0usize..512, 0..40)) {
        let rt = runtime();
        let _guard = rt.enter();

        let backend = SyntheticBackend::with_cameras(1);
        let mut widget = widget_on(&backend);
        widget.start_recording().unwrap();

        let sink = backend.current_sink().unwrap();
        for (i, size) in sizes.iter().enumerate() {
            sink.push_chunk(vec![(i % 251) as u8; *size]);
        }
        widget.stop_recording().unwrap();

        let non_empty: Vec<usize> = sizes.iter().copied().filter(|s| *s > 0).collect();
        let artifact = widget.recorder().artifact().unwrap();
        prop_assert_eq!(artifact.chunk_count, non_empty.len());
        prop_assert_eq!(artifact.size(), non_empty.iter().sum::<usize>());

        let lengths: Vec<usize> = widget
            .recorder()
            .chunks()
            .chunks()
            .iter()
            .map(|c| c.len())
            .collect();
        prop_assert_eq!(lengths, non_empty);
    }

    /// However the selection changes, at most one stream is ever live
    #[test]
    fn one_stream_at_a_time(
        picks in prop::collection::vec(0usize..4, 1..25),
        record_on in prop::collection::vec(any::<bool>(), 25),
    ) {
        let rt = runtime();
        let _guard = rt.enter();

        let backend = SyntheticBackend::with_cameras(3);
        let mut widget = widget_on(&backend);

        for (pick, record) in picks.iter().zip(record_on.iter()) {
            // Index 3 names a camera that does not exist
            widget.select_device(&format!("synthetic-{}", pick));
            if *record {
                widget.start_recording().unwrap();
            }
            prop_assert!(backend.live_streams() <= 1);
        }
        prop_assert!(backend.max_live_streams() <= 1);

        widget.shutdown();
        prop_assert_eq!(backend.live_streams(), 0);
    }

    /// Stop is idempotent: repeating it never changes the artifact
    #[test]
    fn repeated_stop_is_noop(chunk in 1usize..4096, repeats in 1usize..5) {
        let rt = runtime();
        let _guard = rt.enter();

        let backend = SyntheticBackend::with_cameras(1);
        let mut widget = widget_on(&backend);
        widget.start_recording().unwrap();
        backend.current_sink().unwrap().push_chunk_of_size(chunk);
        widget.stop_recording().unwrap();
        let first = widget.state().artifact;

        for _ in 0..repeats {
            widget.stop_recording().unwrap();
        }
        prop_assert_eq!(widget.state().recorder_state, RecorderState::IdleWithArtifact);
        prop_assert_eq!(widget.state().artifact, first);
    }
}
