pub mod capture_session;
pub mod compose;
pub(crate) mod convert;
pub mod cursor;
pub(crate) mod env_config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod monitor;
mod platform;
pub mod render;
pub mod sink;
pub mod source;

use std::path::Path;

use error::CaptureResult;

pub use capture_session::{CaptureConfig, CaptureOutcome, CaptureSession, CaptureSessionBuilder};
pub use error::{CaptureError, CaptureErrorClass};
pub use frame::Frame;
pub use geometry::{FrameBounds, FrameSize, Rotation, RotationMode, SizingPolicy};
pub use monitor::MonitorInfo;
pub use sink::ContainerFormat;

/// Configure a fresh session with the default backend and write one
/// frame to `path`.
pub fn capture_once(config: CaptureConfig, path: impl AsRef<Path>) -> CaptureResult<CaptureOutcome> {
    let session = CaptureSession::new()?;
    session.set_config(config)?;
    let outcome = session.capture_to_file(path);
    session.terminate();
    outcome
}
