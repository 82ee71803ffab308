//! Native capture backend built on nokhwa
//!
//! Each opened stream owns one capture thread holding the camera. The thread
//! feeds the preview slot continuously and, while the sink is recording,
//! forwards every captured frame buffer to the sink's subscriber as a chunk.

use super::{CaptureBackend, MediaStream, RecordingSink, SinkEvent, SinkEvents, SinkState};
use crate::errors::CameraError;
use crate::types::{
    DeviceList, PreviewFrame, StreamConstraints, TrackInfo, TrackKind, VideoInputDevice,
};
use bytes::Bytes;
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
    CallbackCamera, NokhwaError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long the OS access prompt may stay unanswered
const PERMISSION_TIMEOUT: Duration = Duration::from_secs(60);

pub struct NativeBackend {
    ideal_fps: u32,
    open_timeout: Duration,
    permission_timeout: Duration,
}

impl NativeBackend {
    pub fn new(ideal_fps: u32, open_timeout: Duration) -> Self {
        Self {
            ideal_fps,
            open_timeout,
            permission_timeout: PERMISSION_TIMEOUT,
        }
    }

    pub fn from_config(config: &crate::config::CrabCaptureConfig) -> Self {
        Self::new(
            config.camera.ideal_fps,
            Duration::from_millis(config.camera.open_timeout_ms),
        )
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new(30, Duration::from_secs(5))
    }
}

fn camera_index(device_id: &str) -> CameraIndex {
    match device_id.parse::<u32>() {
        Ok(index) => CameraIndex::Index(index),
        Err(_) => CameraIndex::String(device_id.to_string()),
    }
}

fn discovery_error(e: NokhwaError) -> CameraError {
    match e {
        NokhwaError::UnsupportedOperationError(_) | NokhwaError::NotImplementedError(_) => {
            CameraError::Unsupported(format!("Camera enumeration unsupported: {}", e))
        }
        other => CameraError::PermissionDenied(format!("Failed to query cameras: {}", other)),
    }
}

/// Ask the OS for camera access, blocking until the user answers.
///
/// Only macOS actually prompts; elsewhere nokhwa reports success at once.
fn request_access(timeout: Duration) -> Result<(), CameraError> {
    if nokhwa::nokhwa_check() {
        return Ok(());
    }

    log::info!("Requesting camera access");
    let (tx, rx) = std_mpsc::channel();
    nokhwa::nokhwa_initialize(move |granted| {
        let _ = tx.send(granted);
    });
    await_access(&rx, timeout)
}

fn await_access(rx: &std_mpsc::Receiver<bool>, timeout: Duration) -> Result<(), CameraError> {
    match rx.recv_timeout(timeout) {
        Ok(true) => {
            log::info!("Camera access granted");
            Ok(())
        }
        Ok(false) => Err(CameraError::PermissionDenied(
            "Camera access denied by user".to_string(),
        )),
        Err(_) => Err(CameraError::PermissionDenied(
            "Camera permission request timed out".to_string(),
        )),
    }
}

/// Linux has no prompt; access is membership of the group owning the
/// device nodes, so try opening the first one.
#[cfg(target_os = "linux")]
fn check_device_nodes() -> Result<(), CameraError> {
    let Some(node) = (0..10)
        .map(|i| std::path::PathBuf::from(format!("/dev/video{}", i)))
        .find(|path| path.exists())
    else {
        // Nothing to open; enumeration will report an empty list
        return Ok(());
    };

    match std::fs::File::open(&node) {
        Ok(_) => Ok(()),
        Err(e) => match device_node_error(&node.display().to_string(), &e) {
            Some(denied) => Err(denied),
            None => {
                log::warn!("Could not open {}: {}", node.display(), e);
                Ok(())
            }
        },
    }
}

#[cfg(not(target_os = "linux"))]
fn check_device_nodes() -> Result<(), CameraError> {
    Ok(())
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn device_node_error(node: &str, e: &std::io::Error) -> Option<CameraError> {
    (e.kind() == std::io::ErrorKind::PermissionDenied).then(|| {
        CameraError::PermissionDenied(format!(
            "Cannot open {}. Add your user to the video group (run: sudo usermod -a -G video $USER)",
            node
        ))
    })
}

/// MIME type of what the sink forwards, derived from the camera's own
/// frame format
fn source_mime(format: FrameFormat) -> String {
    match format {
        FrameFormat::MJPEG => "video/x-motion-jpeg".to_string(),
        other => format!("video/x-raw;format={:?}", other),
    }
}

impl CaptureBackend for NativeBackend {
    fn name(&self) -> &str {
        "nokhwa"
    }

    fn discover_devices(&mut self) -> Result<DeviceList, CameraError> {
        if !cfg!(any(
            target_os = "windows",
            target_os = "macos",
            target_os = "linux"
        )) {
            return Err(CameraError::Unsupported(
                "No native camera backend for this platform".to_string(),
            ));
        }

        request_access(self.permission_timeout)?;
        check_device_nodes()?;

        let cameras = query(ApiBackend::Auto).map_err(discovery_error)?;
        let devices: DeviceList = cameras
            .into_iter()
            .map(|info| VideoInputDevice::new(info.index().to_string(), info.human_name()))
            .collect();

        log::debug!("nokhwa reported {} video inputs", devices.len());
        Ok(devices)
    }

    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        let stop = Arc::new(AtomicBool::new(false));
        let live = Arc::new(AtomicBool::new(false));
        let preview = Arc::new(Mutex::new(None));
        let sink = Arc::new(Mutex::new(SinkShared {
            state: SinkState::Inactive,
            tx: None,
            source_mime: None,
        }));

        let (ready_tx, ready_rx) = std_mpsc::channel();
        let worker = CaptureWorker {
            index: camera_index(&constraints.device_id),
            requested: RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                nokhwa::utils::CameraFormat::new(
                    Resolution::new(constraints.ideal_width, constraints.ideal_height),
                    FrameFormat::MJPEG,
                    self.ideal_fps,
                ),
            )),
            stop: stop.clone(),
            live: live.clone(),
            preview: preview.clone(),
            sink: sink.clone(),
        };

        let thread = std::thread::Builder::new()
            .name(format!("crabcapture-capture-{}", constraints.device_id))
            .spawn(move || worker.run(ready_tx))
            .map_err(|e| CameraError::CaptureError(format!("spawn failed: {}", e)))?;

        match ready_rx.recv_timeout(self.open_timeout) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                // Leave the thread to notice the flag on its own; joining could hang.
                stop.store(true, Ordering::Relaxed);
                return Err(CameraError::CaptureError(format!(
                    "Timed out opening camera {}",
                    constraints.device_id
                )));
            }
        }

        log::info!(
            "Opened native stream for camera {} (ideal {}x{})",
            constraints.device_id,
            constraints.ideal_width,
            constraints.ideal_height
        );

        Ok(Box::new(NativeStream {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: constraints.device_id.clone(),
            stop,
            live,
            preview,
            sink,
            thread: Some(thread),
        }))
    }
}

struct SinkShared {
    state: SinkState,
    tx: Option<mpsc::UnboundedSender<SinkEvent>>,
    /// Set from the first captured frame
    source_mime: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct CaptureWorker {
    index: CameraIndex,
    requested: RequestedFormat<'static>,
    stop: Arc<AtomicBool>,
    live: Arc<AtomicBool>,
    preview: Arc<Mutex<Option<PreviewFrame>>>,
    sink: Arc<Mutex<SinkShared>>,
}

impl CaptureWorker {
    fn run(self, ready: std_mpsc::Sender<Result<(), CameraError>>) {
        let mut camera = match CallbackCamera::new(self.index.clone(), self.requested, |_| {}) {
            Ok(camera) => camera,
            Err(e) => {
                let _ = ready.send(Err(CameraError::CaptureError(format!(
                    "Failed to initialize camera: {}",
                    e
                ))));
                return;
            }
        };

        if let Err(e) = camera.open_stream() {
            let _ = ready.send(Err(CameraError::CaptureError(format!(
                "Failed to start stream: {}",
                e
            ))));
            return;
        }

        self.live.store(true, Ordering::Relaxed);
        let _ = ready.send(Ok(()));

        while !self.stop.load(Ordering::Relaxed) {
            let frame = match camera.poll_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Camera {} stopped delivering frames: {}", self.index, e);
                    break;
                }
            };

            let resolution = frame.resolution();
            let source_format = frame.source_frame_format();
            let data = frame.buffer();

            {
                // Checked under the lock so no chunk can follow the Stopped event
                let mut sink = lock(&self.sink);
                if sink.source_mime.is_none() {
                    sink.source_mime = Some(source_mime(source_format));
                }
                if sink.state == SinkState::Recording {
                    if let Some(tx) = &sink.tx {
                        let _ = tx.send(SinkEvent::DataAvailable(Bytes::copy_from_slice(data)));
                    }
                }
            }

            *lock(&self.preview) = Some(PreviewFrame {
                width: resolution.width_x,
                height: resolution.height_y,
                format: format!("{:?}", source_format),
                data: data.to_vec(),
            });
        }

        if let Err(e) = camera.stop_stream() {
            log::warn!("Failed to stop camera {} cleanly: {}", self.index, e);
        }
        self.live.store(false, Ordering::Relaxed);
        log::debug!("Capture thread for camera {} exited", self.index);
    }
}

struct NativeStream {
    id: String,
    device_id: String,
    stop: Arc<AtomicBool>,
    live: Arc<AtomicBool>,
    preview: Arc<Mutex<Option<PreviewFrame>>>,
    sink: Arc<Mutex<SinkShared>>,
    thread: Option<JoinHandle<()>>,
}

impl MediaStream for NativeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn tracks(&self) -> Vec<TrackInfo> {
        vec![TrackInfo {
            id: format!("{}-video", self.id),
            kind: TrackKind::Video,
            live: self.live.load(Ordering::Relaxed),
        }]
    }

    fn stop_tracks(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Capture thread for camera {} panicked", self.device_id);
            }
            log::info!("Stopped native stream for camera {}", self.device_id);
        }
        self.live.store(false, Ordering::Relaxed);
    }

    fn create_sink(&mut self) -> Result<(Box<dyn RecordingSink>, SinkEvents), CameraError> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut shared = lock(&self.sink);
            shared.state = SinkState::Inactive;
            shared.tx = Some(tx);
        }
        Ok((
            Box::new(NativeSink {
                shared: self.sink.clone(),
                live: self.live.clone(),
            }),
            rx,
        ))
    }

    fn preview_frame(&self) -> Option<PreviewFrame> {
        lock(&self.preview).clone()
    }
}

impl Drop for NativeStream {
    fn drop(&mut self) {
        self.stop_tracks();
    }
}

struct NativeSink {
    shared: Arc<Mutex<SinkShared>>,
    live: Arc<AtomicBool>,
}

impl RecordingSink for NativeSink {
    fn start(&mut self) -> Result<(), CameraError> {
        if !self.live.load(Ordering::Relaxed) {
            return Err(CameraError::CaptureError(
                "stream is no longer live".to_string(),
            ));
        }
        let mut shared = lock(&self.shared);
        if shared.state == SinkState::Recording {
            return Err(CameraError::CaptureError(
                "recorder is already recording".to_string(),
            ));
        }
        shared.state = SinkState::Recording;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        let mut shared = lock(&self.shared);
        if shared.state != SinkState::Recording {
            return Ok(());
        }
        shared.state = SinkState::Stopped;
        if let Some(tx) = &shared.tx {
            let _ = tx.send(SinkEvent::Stopped);
        }
        Ok(())
    }

    fn state(&self) -> SinkState {
        lock(&self.shared).state
    }

    fn mime_type(&self) -> Option<String> {
        lock(&self.shared).source_mime.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_index_from_id() {
        assert_eq!(camera_index("2"), CameraIndex::Index(2));
        assert_eq!(
            camera_index("usb-0000:00:14.0-1"),
            CameraIndex::String("usb-0000:00:14.0-1".to_string())
        );
    }

    #[test]
    fn test_unsupported_errors_map_to_unsupported() {
        let err = discovery_error(NokhwaError::NotImplementedError("query".to_string()));
        assert!(matches!(err, CameraError::Unsupported(_)));

        let err = discovery_error(NokhwaError::GeneralError("denied".to_string()));
        assert!(matches!(err, CameraError::PermissionDenied(_)));
    }

    #[test]
    fn test_sink_state_transitions_without_hardware() {
        let shared = Arc::new(Mutex::new(SinkShared {
            state: SinkState::Inactive,
            tx: None,
            source_mime: None,
        }));
        let live = Arc::new(AtomicBool::new(true));
        let mut sink = NativeSink {
            shared: shared.clone(),
            live: live.clone(),
        };

        sink.start().unwrap();
        assert_eq!(sink.state(), SinkState::Recording);
        assert!(sink.start().is_err());
        sink.stop().unwrap();
        assert_eq!(sink.state(), SinkState::Stopped);
        assert_eq!(sink.mime_type(), None);

        shared.lock().unwrap().source_mime = Some(source_mime(FrameFormat::YUYV));
        assert_eq!(sink.mime_type().as_deref(), Some("video/x-raw;format=YUYV"));

        live.store(false, Ordering::Relaxed);
        assert!(sink.start().is_err());
    }

    #[test]
    fn test_source_mime_follows_frame_format() {
        assert_eq!(source_mime(FrameFormat::MJPEG), "video/x-motion-jpeg");
        assert_eq!(source_mime(FrameFormat::NV12), "video/x-raw;format=NV12");
    }

    #[test]
    fn test_access_answer_maps_to_permission() {
        let (tx, rx) = std_mpsc::channel();
        tx.send(true).unwrap();
        assert!(await_access(&rx, Duration::from_millis(10)).is_ok());

        tx.send(false).unwrap();
        let err = await_access(&rx, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, CameraError::PermissionDenied(ref m) if m.contains("denied")));

        let err = await_access(&rx, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, CameraError::PermissionDenied(ref m) if m.contains("timed out")));

        drop(tx);
        assert!(await_access(&rx, Duration::from_millis(10)).is_err());
    }

    #[test]
    fn test_unreadable_device_node_is_permission_denied() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = device_node_error("/dev/video0", &denied).unwrap();
        assert!(err.is_permission_related());
        assert!(err.to_string().contains("usermod"));

        let busy = std::io::Error::from(std::io::ErrorKind::Other);
        assert!(device_node_error("/dev/video0", &busy).is_none());
    }

    #[test]
    #[ignore = "Requires camera hardware and OS permissions - run manually"]
    fn test_native_discovery() {
        let mut backend = NativeBackend::default();
        let devices = backend.discover_devices().unwrap();
        for device in devices {
            println!("{}: {}", device.id, device.label);
        }
    }
}
