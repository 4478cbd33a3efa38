use super::PointerShapeInfo;
use crate::error::{CaptureError, CaptureResult};

/// Pointer metadata delivered with one acquired frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerEvent {
    /// Zero when the frame carries no pointer update.
    pub timestamp: i64,
    /// Position in virtual-desktop coordinates.
    pub position: (i32, i32),
    pub visible: bool,
    /// Non-zero when a new shape is available for this frame.
    pub shape_buffer_size: u32,
    /// Output that reported the event.
    pub monitor: u32,
}

/// Cursor visibility, position and shape shared across the outputs of
/// one capture session.
///
/// Each duplicated output reports pointer events even when the cursor is
/// on another display, so position updates are arbitrated by which
/// output last wrote them and by timestamp.
#[derive(Debug, Default)]
pub struct CursorState {
    visible: bool,
    position: (i32, i32),
    last_update: i64,
    owner: Option<u32>,
    shape: Vec<u8>,
    shape_len: usize,
    shape_info: PointerShapeInfo,
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Position relative to the owning output's desktop origin.
    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    pub fn owner(&self) -> Option<u32> {
        self.owner
    }

    pub fn has_shape(&self) -> bool {
        self.shape_len > 0
    }

    pub fn shape(&self) -> &[u8] {
        &self.shape[..self.shape_len]
    }

    pub fn shape_info(&self) -> &PointerShapeInfo {
        &self.shape_info
    }

    pub fn shape_capacity(&self) -> usize {
        self.shape.capacity()
    }

    /// Fold `event` into the state.
    ///
    /// `desktop_origin` is the top-left of the reporting output in
    /// virtual-desktop coordinates. `fetch_shape` is only called when the
    /// event announces a new shape; if it fails the shape buffer is
    /// released and the error returned, while the position update stays.
    pub fn update<F>(
        &mut self,
        event: &PointerEvent,
        desktop_origin: (i32, i32),
        fetch_shape: F,
    ) -> CaptureResult<()>
    where
        F: FnOnce(&mut [u8]) -> CaptureResult<PointerShapeInfo>,
    {
        if event.timestamp == 0 {
            return Ok(());
        }

        let foreign_owner = self.owner != Some(event.monitor);
        let stale = if !event.visible {
            foreign_owner
        } else {
            foreign_owner && self.visible && self.last_update >= event.timestamp
        };

        if !stale {
            self.position = (
                event.position.0 - desktop_origin.0,
                event.position.1 - desktop_origin.1,
            );
            self.owner = Some(event.monitor);
            self.last_update = event.timestamp;
            self.visible = event.visible;
        }

        if event.shape_buffer_size == 0 {
            return Ok(());
        }

        let size = event.shape_buffer_size as usize;
        if size > self.shape.len() {
            self.shape
                .try_reserve(size - self.shape.len())
                .map_err(|_| CaptureError::OutOfMemory)?;
            self.shape.resize(size, 0);
        }

        match fetch_shape(&mut self.shape[..size]) {
            Ok(info) => {
                self.shape_len = size;
                self.shape_info = info;
                Ok(())
            }
            Err(err) => {
                self.release_shape();
                Err(err)
            }
        }
    }

    /// Free the shape buffer and forget all pointer state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drop a cached shape that could not be used. Position state is kept.
    pub fn release_shape(&mut self) {
        self.shape = Vec::new();
        self.shape_len = 0;
        self.shape_info = PointerShapeInfo::default();
    }
}
