//! Chunk accumulation and the finished recording

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Ordered, append-only buffer of recorder chunks
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Bytes>,
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are dropped; returns whether it was kept.
    pub fn push(&mut self, chunk: Bytes) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.total_bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn chunks(&self) -> &[Bytes] {
        &self.chunks
    }

    /// All chunks as one contiguous blob, in arrival order
    pub fn concat(&self) -> Bytes {
        let mut blob = BytesMut::with_capacity(self.total_bytes);
        for chunk in &self.chunks {
            blob.extend_from_slice(chunk);
        }
        blob.freeze()
    }
}

/// The finished output of one recording
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    pub data: Bytes,
    /// Label the artifact is downloaded with
    pub mime_type: String,
    /// What the recorder said it produced, when it said anything
    pub reported_mime: Option<String>,
    pub chunk_count: usize,
    pub finished_at: DateTime<Utc>,
}

impl RecordingArtifact {
    pub fn from_chunks(
        buffer: &ChunkBuffer,
        mime_type: impl Into<String>,
        reported_mime: Option<String>,
    ) -> Self {
        Self {
            data: buffer.concat(),
            mime_type: mime_type.into(),
            reported_mime,
            chunk_count: buffer.len(),
            finished_at: Utc::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// True when the label differs from what the recorder reported
    pub fn is_mislabeled(&self) -> bool {
        self.reported_mime
            .as_deref()
            .is_some_and(|reported| !reported.eq_ignore_ascii_case(&self.mime_type))
    }

    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            size: self.size() as u64,
            chunk_count: self.chunk_count,
            mime_type: self.mime_type.clone(),
            reported_mime: self.reported_mime.clone(),
            finished_at: self.finished_at.to_rfc3339(),
        }
    }
}

/// Serializable view of an artifact for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub size: u64,
    pub chunk_count: usize,
    pub mime_type: String,
    pub reported_mime: Option<String>,
    pub finished_at: String,
}

/// `<prefix><ISO-8601 UTC timestamp, millisecond precision>.<extension>`
pub fn recording_filename(prefix: &str, extension: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}{}.{}",
        prefix,
        at.to_rfc3339_opts(SecondsFormat::Millis, true),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_zero_size_chunks_are_dropped() {
        let mut buffer = ChunkBuffer::new();
        assert!(buffer.push(Bytes::from_static(b"abc")));
        assert!(!buffer.push(Bytes::new()));
        assert!(buffer.push(Bytes::from_static(b"de")));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.total_bytes(), 5);
        assert_eq!(&buffer.concat()[..], b"abcde");
    }

    #[test]
    fn test_clear_resets_totals() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(Bytes::from_static(b"abc"));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.total_bytes(), 0);
        assert!(buffer.concat().is_empty());
    }

    #[test]
    fn test_filename_uses_iso_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 5).unwrap();
        assert_eq!(
            recording_filename("recording-", "mp4", at),
            "recording-2026-10-16T09:30:05.000Z.mp4"
        );
    }

    #[test]
    fn test_mislabel_detection() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(Bytes::from_static(b"x"));

        let labeled = RecordingArtifact::from_chunks(&buffer, "video/mp4", None);
        assert!(!labeled.is_mislabeled());

        let webm =
            RecordingArtifact::from_chunks(&buffer, "video/mp4", Some("video/webm".to_string()));
        assert!(webm.is_mislabeled());
        assert_eq!(webm.summary().reported_mime.as_deref(), Some("video/webm"));
    }
}
