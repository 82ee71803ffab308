//! File emission: turning a finished recording into a downloadable file

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// What was handed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedFile {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    /// Where the file ended up, if the emitter knows
    pub location: Option<String>,
}

/// Host "download this blob" capability
pub trait FileEmitter: Send {
    fn emit(&mut self, data: &[u8], mime_type: &str, filename: &str)
        -> Result<EmittedFile, CameraError>;
}

/// Replace characters most filesystems reject (the ISO timestamp carries ':')
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}

/// Writes recordings into a directory
#[derive(Debug, Clone)]
pub struct DiskEmitter {
    directory: PathBuf,
}

impl DiskEmitter {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl FileEmitter for DiskEmitter {
    fn emit(
        &mut self,
        data: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<EmittedFile, CameraError> {
        fs::create_dir_all(&self.directory).map_err(|e| {
            CameraError::IoError(format!(
                "Failed to create output directory {:?}: {}",
                self.directory, e
            ))
        })?;

        let path = self.directory.join(sanitize_filename(filename));
        fs::write(&path, data)
            .map_err(|e| CameraError::IoError(format!("Failed to write {:?}: {}", path, e)))?;

        log::info!("Saved {} bytes ({}) to {:?}", data.len(), mime_type, path);

        Ok(EmittedFile {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size: data.len() as u64,
            location: Some(path.to_string_lossy().to_string()),
        })
    }
}

/// A blob captured by [`MemoryEmitter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedBlob {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Keeps emitted blobs in memory; clones share the same store
#[derive(Debug, Clone, Default)]
pub struct MemoryEmitter {
    blobs: Arc<Mutex<Vec<EmittedBlob>>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blobs(&self) -> Vec<EmittedBlob> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl FileEmitter for MemoryEmitter {
    fn emit(
        &mut self,
        data: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> Result<EmittedFile, CameraError> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(EmittedBlob {
                filename: filename.to_string(),
                mime_type: mime_type.to_string(),
                data: data.to_vec(),
            });
        Ok(EmittedFile {
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
            size: data.len() as u64,
            location: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("recording-2026-10-16T09:30:00.000Z.mp4"),
            "recording-2026-10-16T09-30-00.000Z.mp4"
        );
        assert_eq!(sanitize_filename("a/b\\c"), "a-b-c");
    }

    #[test]
    fn test_disk_emitter_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut emitter = DiskEmitter::new(dir.path().join("nested"));

        let emitted = emitter
            .emit(&[1, 2, 3, 4], "video/mp4", "recording-12:00.mp4")
            .unwrap();

        assert_eq!(emitted.size, 4);
        let location = emitted.location.unwrap();
        assert!(location.ends_with("recording-12-00.mp4"));
        assert_eq!(fs::read(location).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_memory_emitter_shares_store() {
        let emitter = MemoryEmitter::new();
        let mut writer = emitter.clone();
        writer.emit(b"abc", "video/mp4", "x.mp4").unwrap();
        assert_eq!(emitter.blobs().len(), 1);
        assert_eq!(emitter.blobs()[0].data, b"abc".to_vec());
    }
}
