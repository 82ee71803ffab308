use crate::errors::CameraError;

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted and at least one camera visible
    Granted,
    /// Permission denied
    Denied,
    /// Not asked yet, or asked but no camera was found
    NotDetermined,
    /// The host has no camera capability at all
    Unsupported,
}

impl PermissionStatus {
    /// Coarse flag the UI uses to decide between the preview and the
    /// "Unable to get camera permission" placeholder.
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }

    /// Derive the status from a discovery outcome
    pub fn from_discovery(result: &Result<usize, CameraError>) -> Self {
        match result {
            Ok(0) => PermissionStatus::NotDetermined,
            Ok(_) => PermissionStatus::Granted,
            Err(CameraError::Unsupported(_)) => PermissionStatus::Unsupported,
            Err(_) => PermissionStatus::Denied,
        }
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub device_count: usize,
}

impl PermissionInfo {
    pub fn new(status: PermissionStatus, device_count: usize) -> Self {
        let message = match status {
            PermissionStatus::Granted => format!("Camera access granted ({} found)", device_count),
            PermissionStatus::Denied => "Unable to get camera permission".to_string(),
            PermissionStatus::NotDetermined => {
                "No cameras found - permission may not be granted".to_string()
            }
            PermissionStatus::Unsupported => {
                "Camera capture is not supported on this device".to_string()
            }
        };
        Self {
            status,
            message,
            device_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_discovery() {
        assert_eq!(
            PermissionStatus::from_discovery(&Ok(2)),
            PermissionStatus::Granted
        );
        assert_eq!(
            PermissionStatus::from_discovery(&Ok(0)),
            PermissionStatus::NotDetermined
        );
        assert_eq!(
            PermissionStatus::from_discovery(&Err(CameraError::Unsupported("x".into()))),
            PermissionStatus::Unsupported
        );
        assert_eq!(
            PermissionStatus::from_discovery(&Err(CameraError::PermissionDenied("x".into()))),
            PermissionStatus::Denied
        );
    }

    #[test]
    fn test_only_granted_is_granted() {
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Denied.is_granted());
        assert!(!PermissionStatus::NotDetermined.is_granted());
        assert!(!PermissionStatus::Unsupported.is_granted());
    }

    #[test]
    fn test_display() {
        assert_eq!(PermissionStatus::NotDetermined.to_string(), "not_determined");
        let info = PermissionInfo::new(PermissionStatus::Granted, 3);
        assert!(info.message.contains('3'));
    }
}
