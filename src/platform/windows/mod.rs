pub(crate) mod d3d11;
pub(crate) mod duplication;
pub(crate) mod monitor;

use std::sync::Once;

use windows::Win32::UI::HiDpi::{PROCESS_PER_MONITOR_DPI_AWARE, SetProcessDpiAwareness};

use crate::error::CaptureResult;
use crate::monitor::MonitorInfo;
use crate::source::{CaptureBackend, OutputSource};

static DPI_AWARENESS: Once = Once::new();

/// Desktop coordinates reported by DXGI are only physical pixels when the
/// process is per-monitor DPI aware.
fn ensure_dpi_awareness() {
    DPI_AWARENESS.call_once(|| {
        if let Err(err) = unsafe { SetProcessDpiAwareness(PROCESS_PER_MONITOR_DPI_AWARE) } {
            // Already set by a manifest or an earlier call.
            log::debug!("SetProcessDpiAwareness failed: {err}");
        }
    });
}

pub(crate) struct DxgiBackend;

impl DxgiBackend {
    pub(crate) fn new() -> CaptureResult<Self> {
        ensure_dpi_awareness();
        Ok(Self)
    }
}

impl CaptureBackend for DxgiBackend {
    fn enumerate_monitors(&self) -> CaptureResult<Vec<MonitorInfo>> {
        Ok(monitor::enumerate_resolved()?
            .into_iter()
            .map(|output| output.info)
            .collect())
    }

    fn open_output(&self, monitor: &MonitorInfo) -> CaptureResult<Box<dyn OutputSource>> {
        let resolved = monitor::resolve_output(monitor)?;
        Ok(Box::new(duplication::DxgiOutputSource::open(&resolved)?))
    }
}
