//! Core data types shared by the registry, the stream session and the recorder

use serde::{Deserialize, Serialize};

/// A permission-granted video input source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInputDevice {
    /// Opaque platform device identifier
    pub id: String,
    /// Human-readable name, may be empty
    pub label: String,
}

impl VideoInputDevice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }

    /// Label shown in the device picker. Falls back to "Camera N" (1-based)
    /// for devices that report no name.
    pub fn display_label(&self, index: usize) -> String {
        if self.label.is_empty() {
            format!("Camera {}", index + 1)
        } else {
            self.label.clone()
        }
    }
}

/// Devices in discovery order
pub type DeviceList = Vec<VideoInputDevice>;

/// Constraints for acquiring a live stream
///
/// The device id is exact; the resolution is a preference the backend
/// may not honor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConstraints {
    pub device_id: String,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl StreamConstraints {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            ideal_width: 1280,
            ideal_height: 720,
        }
    }

    pub fn with_ideal_resolution(mut self, width: u32, height: u32) -> Self {
        self.ideal_width = width;
        self.ideal_height = height;
        self
    }
}

/// Kind of a constituent stream track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Snapshot of one track of a live stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub kind: TrackKind,
    pub live: bool,
}

/// Most recent frame shown on the preview surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewFrame {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub data: Vec<u8>,
}

/// How the preview surface plays the bound stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewState {
    pub playing: bool,
    pub muted: bool,
    pub inline: bool,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self {
            playing: false,
            muted: true,
            inline: true,
        }
    }
}
