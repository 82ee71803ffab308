#[cfg(test)]
mod error_tests {
    use crabcapture::errors::CameraError;
    use std::error::Error;

    #[test]
    fn test_camera_error_permission_denied() {
        let error = CameraError::PermissionDenied("Access denied".to_string());
        assert!(error.to_string().contains("Permission denied"));
        assert!(error.to_string().contains("Access denied"));
        assert!(error.is_permission_related());
    }

    #[test]
    fn test_camera_error_unsupported() {
        let error = CameraError::Unsupported("no media devices".to_string());
        assert_eq!(error.to_string(), "Unsupported: no media devices");
        assert!(error.is_permission_related());
    }

    #[test]
    fn test_camera_error_display_trait() {
        let error = CameraError::CaptureError("Display test".to_string());
        assert_eq!(format!("{}", error), "Capture error: Display test");
        assert!(!error.is_permission_related());
    }

    #[test]
    fn test_camera_error_implements_error_trait() {
        let error = CameraError::NoActiveSession;
        let _error_trait: &dyn Error = &error;
        assert!(error.source().is_none());
        assert_eq!(error.to_string(), "No active stream session");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing dir");
        let error: CameraError = io.into();
        assert!(matches!(error, CameraError::IoError(ref msg) if msg.contains("missing dir")));
    }

    #[test]
    fn test_all_error_variants() {
        let errors = vec![
            CameraError::InitializationError("Init error".to_string()),
            CameraError::PermissionDenied("Permission error".to_string()),
            CameraError::Unsupported("Unsupported error".to_string()),
            CameraError::CaptureError("Capture error".to_string()),
            CameraError::NoActiveSession,
            CameraError::IoError("IO error".to_string()),
        ];

        for error in errors {
            assert!(!error.to_string().is_empty());
            assert!(!format!("{:?}", error).is_empty());
            assert_eq!(error.clone(), error);
        }
    }
}
