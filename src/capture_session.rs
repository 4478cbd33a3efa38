use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::compose::blend_cursor;
use crate::cursor::{CursorBuffer, CursorState, PointerEvent, decode_shape, orient_cursor};
use crate::env_config::{self, DISABLE_CURSOR_ENV, define_env_flag};
use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;
use crate::geometry::{self, FrameSize, RendererInfo, RotationMode, SizingPolicy};
use crate::monitor::MonitorInfo;
use crate::render::render_canvas;
use crate::sink::{ContainerFormat, ImageFileSink, ImageSink};
use crate::source::{self, AcquireOutcome, CaptureBackend, OutputSource};

define_env_flag!(enabled_unless(cursor_overlay_enabled, DISABLE_CURSOR_ENV));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Index into the enumerated monitor list.
    pub monitor: i32,
    pub show_cursor: bool,
    pub rotation: RotationMode,
    pub sizing: SizingPolicy,
    /// Requested canvas size; ignored under [`SizingPolicy::AutoSize`].
    pub output_size: FrameSize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            monitor: 0,
            show_cursor: true,
            rotation: RotationMode::Auto,
            sizing: SizingPolicy::AutoSize,
            output_size: FrameSize::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// `render_duration` runs from frame acquisition to the finished
    /// canvas and excludes encoding.
    Captured { render_duration: Duration },
    /// No frame was presented within the acquire timeout.
    Timeout,
}

impl CaptureOutcome {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

pub struct CaptureSessionBuilder {
    backend_override: Option<Arc<dyn CaptureBackend>>,
    sink: Arc<dyn ImageSink>,
    acquire_timeout: Duration,
}

impl CaptureSessionBuilder {
    pub fn new() -> Self {
        Self {
            backend_override: None,
            sink: Arc::new(ImageFileSink),
            acquire_timeout: env_config::acquire_timeout(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn CaptureBackend>) -> Self {
        self.backend_override = Some(backend);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ImageSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Upper bound on the wait for a new desktop frame.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn build(self) -> CaptureResult<CaptureSession> {
        let backend = match self.backend_override {
            Some(b) => b,
            None => source::default_backend()?,
        };
        Ok(CaptureSession {
            backend,
            sink: self.sink,
            acquire_timeout: self.acquire_timeout,
            state: Mutex::new(SessionState::default()),
        })
    }
}

impl Default for CaptureSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-monitor still capture.
///
/// Every public entry point holds the session lock for its whole
/// duration, so configuration changes never race a capture.
pub struct CaptureSession {
    backend: Arc<dyn CaptureBackend>,
    sink: Arc<dyn ImageSink>,
    acquire_timeout: Duration,
    state: Mutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    active: Option<ActiveOutput>,
}

/// Everything owned by one configured output. Dropping it closes the
/// duplication session and frees the cursor buffers.
struct ActiveOutput {
    config: CaptureConfig,
    monitor: MonitorInfo,
    source: Box<dyn OutputSource>,
    renderer: RendererInfo,
    desktop: Frame,
    canvas: Frame,
    cursor: CursorState,
    cursor_buffer: CursorBuffer,
}

impl CaptureSession {
    pub fn builder() -> CaptureSessionBuilder {
        CaptureSessionBuilder::new()
    }

    pub fn new() -> CaptureResult<Self> {
        Self::builder().build()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn monitors(&self) -> CaptureResult<Vec<MonitorInfo>> {
        let _guard = self.lock();
        self.backend.enumerate_monitors()
    }

    pub fn find_monitor(&self, index: i32) -> CaptureResult<MonitorInfo> {
        let _guard = self.lock();
        self.lookup_monitor(index)
    }

    fn lookup_monitor(&self, index: i32) -> CaptureResult<MonitorInfo> {
        let wanted = u32::try_from(index).map_err(|_| CaptureError::InvalidTarget(index))?;
        self.backend
            .enumerate_monitors()?
            .into_iter()
            .find(|monitor| monitor.index() == wanted)
            .ok_or(CaptureError::InvalidTarget(index))
    }

    /// Tear down the current output and open the one `config` names.
    pub fn set_config(&self, config: CaptureConfig) -> CaptureResult<()> {
        let mut state = self.lock();
        if state.active.take().is_some() {
            log::debug!("closed previous output before reconfiguring");
        }

        let monitor = self.lookup_monitor(config.monitor)?;
        let source = self.backend.open_output(&monitor)?;
        if source.monitor_info() != &monitor {
            log::warn!(
                "monitor changed while opening: enumerated '{}', opened '{}'",
                monitor,
                source.monitor_info()
            );
            return Err(CaptureError::MonitorLost);
        }

        let mode = source.display_mode();
        let renderer = geometry::resolve(&mode, config.sizing, config.rotation, config.output_size)?;

        let mut desktop = Frame::empty();
        desktop.ensure_capacity(renderer.source.width as u32, renderer.source.height as u32)?;

        log::info!(
            "capturing '{}' ({:?}, {}deg) into {}x{} canvas, sizing {:?}, cursor {}",
            monitor,
            mode.format,
            renderer.rotation_degrees,
            renderer.output_size.width,
            renderer.output_size.height,
            config.sizing,
            if config.show_cursor { "on" } else { "off" },
        );

        state.active = Some(ActiveOutput {
            config,
            monitor,
            source,
            renderer,
            desktop,
            canvas: Frame::empty(),
            cursor: CursorState::new(),
            cursor_buffer: CursorBuffer::new(),
        });
        Ok(())
    }

    pub fn config(&self) -> Option<CaptureConfig> {
        self.lock().active.as_ref().map(|active| active.config)
    }

    pub fn renderer_info(&self) -> Option<RendererInfo> {
        self.lock().active.as_ref().map(|active| active.renderer)
    }

    /// Capture one frame and render the output canvas into `frame`.
    pub fn capture_into(&self, frame: &mut Frame) -> CaptureResult<CaptureOutcome> {
        let mut state = self.lock();
        let active = state.active.as_mut().ok_or(CaptureError::NotConfigured)?;
        active.capture(self.acquire_timeout, frame)
    }

    /// Capture one frame and encode it to `path`. The container is picked
    /// from the extension, which is checked before any capture work.
    pub fn capture_to_file(&self, path: impl AsRef<Path>) -> CaptureResult<CaptureOutcome> {
        let path = path.as_ref();
        let format = ContainerFormat::from_path(path)?;

        let mut state = self.lock();
        let active = state.active.as_mut().ok_or(CaptureError::NotConfigured)?;

        let mut canvas = std::mem::take(&mut active.canvas);
        let result = active.capture(self.acquire_timeout, &mut canvas);
        let written = match &result {
            Ok(CaptureOutcome::Captured { .. }) => self.sink.write(path, format, &canvas),
            _ => Ok(()),
        };
        active.canvas = canvas;

        let outcome = result?;
        written?;
        if let CaptureOutcome::Captured { render_duration } = outcome {
            log::info!(
                "saved {} in {:.3} ms (render only)",
                path.display(),
                render_duration.as_secs_f64() * 1000.0
            );
        }
        Ok(outcome)
    }

    /// Close the active output and release all per-session buffers.
    pub fn terminate(&self) {
        if self.lock().active.take().is_some() {
            log::info!("capture session terminated");
        }
    }
}

impl ActiveOutput {
    fn capture(&mut self, timeout: Duration, canvas: &mut Frame) -> CaptureResult<CaptureOutcome> {
        self.renderer.validate()?;

        let pointer = match self.source.acquire_frame(timeout, &mut self.desktop)? {
            AcquireOutcome::Acquired { pointer } => pointer,
            AcquireOutcome::Timeout => {
                log::debug!("no new frame from '{}' within {:?}", self.monitor, timeout);
                return Ok(CaptureOutcome::Timeout);
            }
        };
        let started = Instant::now();

        let Self {
            config,
            monitor,
            source,
            renderer,
            desktop,
            cursor,
            cursor_buffer,
            ..
        } = self;

        let mut lease = FrameLease {
            source: source.as_mut(),
            held: true,
        };
        if config.show_cursor && cursor_overlay_enabled() {
            overlay_cursor(&mut *lease.source, monitor, cursor, cursor_buffer, desktop, &pointer)?;
        }
        lease.release()?;

        render_canvas(desktop, renderer, canvas)?;
        let render_duration = started.elapsed();
        log::debug!(
            "rendered {}x{} canvas in {:.3} ms",
            canvas.width(),
            canvas.height(),
            render_duration.as_secs_f64() * 1000.0
        );
        Ok(CaptureOutcome::Captured { render_duration })
    }
}

fn overlay_cursor(
    source: &mut dyn OutputSource,
    monitor: &MonitorInfo,
    cursor: &mut CursorState,
    buffer: &mut CursorBuffer,
    desktop: &mut Frame,
    pointer: &PointerEvent,
) -> CaptureResult<()> {
    cursor.update(pointer, monitor.origin(), |shape| source.cursor_shape(shape))?;
    if !cursor.visible() || !cursor.has_shape() {
        return Ok(());
    }

    if let Err(err) = decode_shape(cursor.shape(), cursor.shape_info(), cursor.position(), buffer)
    {
        // Keep the position; the next reported shape replaces it.
        cursor.release_shape();
        return Err(err);
    }
    let bounds = monitor.bounds();
    orient_cursor(buffer, monitor.rotation(), bounds.width, bounds.height);
    blend_cursor(desktop, buffer);
    Ok(())
}

/// Holds an acquired frame; releases it on drop unless
/// [`release`](Self::release) already did.
struct FrameLease<'a> {
    source: &'a mut dyn OutputSource,
    held: bool,
}

impl FrameLease<'_> {
    fn release(mut self) -> CaptureResult<()> {
        self.held = false;
        self.source.release_frame()
    }
}

impl Drop for FrameLease<'_> {
    fn drop(&mut self) {
        if self.held {
            if let Err(err) = self.source.release_frame() {
                log::warn!("failed to release duplicated frame: {err}");
            }
        }
    }
}
