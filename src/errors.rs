use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Camera access refused by the user or the OS
    PermissionDenied(String),
    /// The host has no device discovery / capture capability at all
    Unsupported(String),
    /// Stream acquisition failed (device busy, constraints unsatisfiable, ...)
    CaptureError(String),
    /// Operation attempted with no open stream session
    NoActiveSession,
    InitializationError(String),
    IoError(String),
}

impl CameraError {
    /// Whether the UI should fold this error into "permission not granted"
    pub fn is_permission_related(&self) -> bool {
        matches!(
            self,
            CameraError::PermissionDenied(_) | CameraError::Unsupported(_)
        )
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CameraError::PermissionDenied(msg) => write!(f, "Permission denied error: {}", msg),
            CameraError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            CameraError::CaptureError(msg) => write!(f, "Capture error: {}", msg),
            CameraError::NoActiveSession => write!(f, "No active stream session"),
            CameraError::InitializationError(msg) => {
                write!(f, "Camera initialization error: {}", msg)
            }
            CameraError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<std::io::Error> for CameraError {
    fn from(e: std::io::Error) -> Self {
        CameraError::IoError(e.to_string())
    }
}
