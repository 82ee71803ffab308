//! Device registry: which cameras exist and which one is active

use crate::errors::CameraError;
use crate::permissions::{PermissionInfo, PermissionStatus};
use crate::platform::CaptureBackend;
use crate::types::{DeviceList, VideoInputDevice};

#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: DeviceList,
    selected: Option<String>,
    permission_granted: bool,
    status: Option<PermissionStatus>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request camera access and enumerate video inputs.
    ///
    /// A non-empty result replaces the list, selects its first entry and
    /// marks permission as granted. An empty result leaves the list empty
    /// and the flag unset.
    pub fn discover_devices(
        &mut self,
        backend: &mut dyn CaptureBackend,
    ) -> Result<&[VideoInputDevice], CameraError> {
        let result = backend.discover_devices();
        self.status = Some(PermissionStatus::from_discovery(
            &result.as_ref().map(|d| d.len()).map_err(Clone::clone),
        ));

        let devices = match result {
            Ok(devices) => devices,
            Err(e) => {
                self.permission_granted = false;
                log::error!("Camera discovery via {} failed: {}", backend.name(), e);
                return Err(e);
            }
        };

        if devices.is_empty() {
            log::warn!("No video input devices found via {}", backend.name());
            return Ok(&self.devices);
        }

        log::info!("Found {} video input devices", devices.len());
        for (i, device) in devices.iter().enumerate() {
            log::debug!("Camera: {} - {}", device.id, device.display_label(i));
        }

        self.selected = Some(devices[0].id.clone());
        self.devices = devices;
        self.permission_granted = true;
        Ok(&self.devices)
    }

    /// Set the active device. Membership is not checked; an unknown id
    /// simply yields a session that fails to open.
    pub fn select_device(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.devices.iter().any(|d| d.id == id) {
            log::warn!("Selecting unknown camera id {}", id);
        }
        self.selected = Some(id);
    }

    pub fn devices(&self) -> &[VideoInputDevice] {
        &self.devices
    }

    pub fn selected_device_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_device(&self) -> Option<&VideoInputDevice> {
        let id = self.selected.as_deref()?;
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    /// Status of the last discovery, `NotDetermined` before the first one
    pub fn permission_status(&self) -> PermissionStatus {
        self.status.unwrap_or(PermissionStatus::NotDetermined)
    }

    pub fn permission_info(&self) -> PermissionInfo {
        PermissionInfo::new(self.permission_status(), self.devices.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::synthetic::{DiscoveryOutcome, SyntheticBackend};

    #[test]
    fn test_first_device_is_default() {
        let mut backend = SyntheticBackend::new(vec![
            VideoInputDevice::new("a", "Front"),
            VideoInputDevice::new("b", ""),
        ]);
        let mut registry = DeviceRegistry::new();

        let devices = registry.discover_devices(&mut backend).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(registry.selected_device_id(), Some("a"));
        assert!(registry.permission_granted());
        assert_eq!(registry.permission_status(), PermissionStatus::Granted);
        assert_eq!(registry.devices()[1].display_label(1), "Camera 2");
    }

    #[test]
    fn test_empty_list_keeps_permission_unset() {
        let mut backend = SyntheticBackend::new(Vec::new());
        let mut registry = DeviceRegistry::new();

        assert!(registry.discover_devices(&mut backend).unwrap().is_empty());
        assert!(!registry.permission_granted());
        assert_eq!(registry.selected_device_id(), None);
        assert_eq!(registry.permission_status(), PermissionStatus::NotDetermined);
    }

    #[test]
    fn test_denied_and_unsupported() {
        let mut backend = SyntheticBackend::with_cameras(1);
        let mut registry = DeviceRegistry::new();

        backend.set_discovery(DiscoveryOutcome::Deny);
        assert!(matches!(
            registry.discover_devices(&mut backend),
            Err(CameraError::PermissionDenied(_))
        ));
        assert!(!registry.permission_granted());
        assert_eq!(registry.permission_status(), PermissionStatus::Denied);

        backend.set_discovery(DiscoveryOutcome::Unsupported);
        assert!(matches!(
            registry.discover_devices(&mut backend),
            Err(CameraError::Unsupported(_))
        ));
        assert_eq!(registry.permission_status(), PermissionStatus::Unsupported);
    }

    #[test]
    fn test_select_does_not_validate() {
        let mut backend = SyntheticBackend::with_cameras(2);
        let mut registry = DeviceRegistry::new();
        registry.discover_devices(&mut backend).unwrap();

        registry.select_device("synthetic-1");
        assert_eq!(registry.selected_device().unwrap().label, "Synthetic Camera 2");

        registry.select_device("ghost");
        assert_eq!(registry.selected_device_id(), Some("ghost"));
        assert!(registry.selected_device().is_none());
    }
}
