//! Hardware cursor overlay: shape decoding, re-orientation to the raw
//! surface layout, and pointer state tracking across outputs.

pub mod orient;
pub mod shape;
pub mod state;

pub use orient::{orient_cursor, rotate_pixels_in_place};
pub use shape::decode_shape;
pub use state::{CursorState, PointerEvent};

use crate::error::{CaptureError, CaptureResult};
use crate::geometry::FrameBounds;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    /// 1bpp AND mask stacked on top of a 1bpp XOR mask.
    Monochrome,
    /// 32bpp BGRA with per-pixel alpha.
    Color,
    /// 32bpp BGRA where the alpha byte selects XOR vs. replace.
    MaskedColor,
}

impl ShapeKind {
    pub const MONOCHROME_CODE: u32 = 1;
    pub const COLOR_CODE: u32 = 2;
    pub const MASKED_COLOR_CODE: u32 = 4;

    pub fn from_code(code: u32) -> CaptureResult<Self> {
        match code {
            Self::MONOCHROME_CODE => Ok(Self::Monochrome),
            Self::COLOR_CODE => Ok(Self::Color),
            Self::MASKED_COLOR_CODE => Ok(Self::MaskedColor),
            other => Err(CaptureError::InvalidArgument(format!(
                "unknown cursor shape type {other}"
            ))),
        }
    }

    pub const fn code(self) -> u32 {
        match self {
            Self::Monochrome => Self::MONOCHROME_CODE,
            Self::Color => Self::COLOR_CODE,
            Self::MaskedColor => Self::MASKED_COLOR_CODE,
        }
    }
}

/// Cursor shape metadata as reported by the output source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerShapeInfo {
    /// Raw shape type code; see [`ShapeKind`].
    pub kind: u32,
    pub width: u32,
    /// For monochrome shapes this covers both masks.
    pub height: u32,
    /// Bytes per row of the shape blob.
    pub pitch: u32,
    pub hotspot_x: i32,
    pub hotspot_y: i32,
}

/// Decoded cursor image in `0xAARRGGBB` pixels, positioned in output
/// coordinates.
///
/// The pixel storage only grows; reusing one buffer across captures
/// keeps the largest allocation seen so far.
#[derive(Clone, Debug, Default)]
pub struct CursorBuffer {
    pixels: Vec<u32>,
    bounds: FrameBounds,
    pitch: usize,
}

impl CursorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(&self) -> FrameBounds {
        self.bounds
    }

    /// Bytes per row, always `width * 4`.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn capacity(&self) -> usize {
        self.pixels.capacity()
    }

    /// The `width * height` pixels of the current image.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels[..self.pixel_len()]
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u32] {
        let len = self.pixel_len();
        &mut self.pixels[..len]
    }

    pub(crate) fn set_bounds(&mut self, bounds: FrameBounds) {
        self.bounds = bounds;
        self.pitch = bounds.width.max(0) as usize * 4;
    }

    fn pixel_len(&self) -> usize {
        self.bounds.width.max(0) as usize * self.bounds.height.max(0) as usize
    }

    /// Make room for `len` pixels without touching the current contents.
    pub(crate) fn reserve_pixels(&mut self, len: usize) -> CaptureResult<()> {
        if len > self.pixels.len() {
            self.pixels
                .try_reserve(len - self.pixels.len())
                .map_err(|_| CaptureError::OutOfMemory)?;
            self.pixels.resize(len, 0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_codes_round_trip_and_reject_unknown() {
        for kind in [ShapeKind::Monochrome, ShapeKind::Color, ShapeKind::MaskedColor] {
            assert_eq!(ShapeKind::from_code(kind.code()).ok(), Some(kind));
        }
        assert!(matches!(
            ShapeKind::from_code(3),
            Err(CaptureError::InvalidArgument(_))
        ));
    }

    #[test]
    fn reserve_keeps_existing_pixels() -> CaptureResult<()> {
        let mut buffer = CursorBuffer::new();
        buffer.reserve_pixels(4)?;
        buffer.set_bounds(FrameBounds::new(0, 0, 2, 2));
        buffer.pixels_mut().copy_from_slice(&[1, 2, 3, 4]);
        buffer.reserve_pixels(64)?;
        assert_eq!(buffer.pixels(), &[1, 2, 3, 4]);
        assert_eq!(buffer.pitch(), 8);
        Ok(())
    }
}
