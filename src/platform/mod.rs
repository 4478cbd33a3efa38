use std::sync::Arc;

use crate::source::CaptureBackend;
#[cfg(not(target_os = "windows"))]
use crate::error::{CaptureError, CaptureResult};
#[cfg(not(target_os = "windows"))]
use crate::monitor::MonitorInfo;
#[cfg(not(target_os = "windows"))]
use crate::source::OutputSource;

#[cfg(target_os = "windows")]
pub(crate) mod windows;

#[cfg(not(target_os = "windows"))]
fn unsupported_error() -> CaptureError {
    CaptureError::BackendUnavailable("desktop duplication is only supported on Windows".into())
}

#[cfg(not(target_os = "windows"))]
struct UnsupportedBackend;

#[cfg(not(target_os = "windows"))]
impl CaptureBackend for UnsupportedBackend {
    fn enumerate_monitors(&self) -> CaptureResult<Vec<MonitorInfo>> {
        Err(unsupported_error())
    }

    fn open_output(&self, _monitor: &MonitorInfo) -> CaptureResult<Box<dyn OutputSource>> {
        Err(unsupported_error())
    }
}

#[cfg(target_os = "windows")]
pub(crate) fn build_backend() -> crate::error::CaptureResult<Arc<dyn CaptureBackend>> {
    Ok(Arc::new(windows::DxgiBackend::new()?))
}

#[cfg(not(target_os = "windows"))]
pub(crate) fn build_backend() -> crate::error::CaptureResult<Arc<dyn CaptureBackend>> {
    Ok(Arc::new(UnsupportedBackend))
}
