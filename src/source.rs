use std::sync::Arc;
use std::time::Duration;

use crate::cursor::{PointerEvent, PointerShapeInfo};
use crate::error::CaptureResult;
use crate::frame::Frame;
use crate::geometry::DisplayMode;
use crate::monitor::MonitorInfo;

/// Result of waiting for the next desktop frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// A frame was copied into the caller's buffer and is held until
    /// [`OutputSource::release_frame`].
    Acquired { pointer: PointerEvent },
    /// Nothing new was presented within the timeout.
    Timeout,
}

/// An opened duplication session on one output.
pub trait OutputSource: Send {
    /// Monitor info as observed when the session was opened.
    fn monitor_info(&self) -> &MonitorInfo;

    fn display_mode(&self) -> DisplayMode;

    /// Wait up to `timeout` for a frame and copy the raw (unrotated)
    /// desktop image into `desktop`.
    fn acquire_frame(
        &mut self,
        timeout: Duration,
        desktop: &mut Frame,
    ) -> CaptureResult<AcquireOutcome>;

    /// Fill `buffer` with the current pointer shape. Only valid while a
    /// frame is held.
    fn cursor_shape(&mut self, buffer: &mut [u8]) -> CaptureResult<PointerShapeInfo>;

    fn release_frame(&mut self) -> CaptureResult<()>;
}

pub trait CaptureBackend: Send + Sync {
    fn enumerate_monitors(&self) -> CaptureResult<Vec<MonitorInfo>>;

    fn open_output(&self, monitor: &MonitorInfo) -> CaptureResult<Box<dyn OutputSource>>;
}

pub fn default_backend() -> CaptureResult<Arc<dyn CaptureBackend>> {
    crate::platform::build_backend()
}
