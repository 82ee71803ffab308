use crate::permissions::PermissionStatus;
use crate::recording::{ArtifactSummary, RecorderState};
use serde::{Deserialize, Serialize};

/// One entry of the device picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOption {
    pub id: String,
    /// Device label, or "Camera N" when the device reports none
    pub label: String,
}

/// Snapshot of everything the widget UI renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetState {
    pub devices: Vec<DeviceOption>,
    pub selected_device_id: Option<String>,
    pub permission_granted: bool,
    pub permission_status: PermissionStatus,
    pub stream_live: bool,
    pub recorder_state: RecorderState,
    pub elapsed_seconds: u64,
    pub record_button_label: String,
    pub show_download: bool,
    pub disclaimer_pending: bool,
    pub disclaimer_text: String,
    /// Why the last stream acquisition failed, cleared by the next success
    pub session_error: Option<String>,
    pub artifact: Option<ArtifactSummary>,
}

impl WidgetState {
    pub fn is_recording(&self) -> bool {
        self.recorder_state == RecorderState::Recording
    }

    /// Placeholder text when there is no preview to show
    pub fn unavailable_message(&self) -> Option<&'static str> {
        if !self.permission_granted {
            Some("Unable to get camera permission")
        } else if self.session_error.is_some() {
            Some("Unable to open the selected camera")
        } else {
            None
        }
    }
}
