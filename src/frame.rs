use crate::error::{CaptureError, CaptureResult};
use crate::geometry::FrameSize;

/// Tightly packed 32bpp BGRA image.
///
/// Pixels are stored as `u32` values in `0xAARRGGBB` order, which is the
/// little-endian reading of B, G, R, A bytes. The backing buffer grows on
/// demand and is never shrunk, so a frame reused across captures stops
/// allocating once it has seen the largest canvas.
#[derive(Clone, Default)]
pub struct Frame {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
}

impl Frame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> CaptureResult<Self> {
        let expected = pixel_count(width, height)?;
        if pixels.len() != expected {
            return Err(CaptureError::InvalidArgument(format!(
                "pixel count mismatch: got {}, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width as i32, self.height as i32)
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.width as usize * 4
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn as_bgra_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn as_mut_bgra_bytes(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.pixels)
    }

    pub fn capacity(&self) -> usize {
        self.pixels.capacity()
    }

    /// Resize to `width` x `height`. Existing pixel values are unspecified
    /// afterwards; callers overwrite or [`fill`](Self::fill) them.
    pub fn ensure_capacity(&mut self, width: u32, height: u32) -> CaptureResult<()> {
        let len = pixel_count(width, height)?;
        if len > self.pixels.len() {
            self.pixels
                .try_reserve(len - self.pixels.len())
                .map_err(|_| CaptureError::OutOfMemory)?;
        }
        self.pixels.resize(len, 0);
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn fill(&mut self, value: u32) {
        self.pixels.fill(value);
    }
}

fn pixel_count(width: u32, height: u32) -> CaptureResult<usize> {
    let w = usize::try_from(width).map_err(|_| CaptureError::BufferOverflow)?;
    let h = usize::try_from(height).map_err(|_| CaptureError::BufferOverflow)?;
    let px = w.checked_mul(h).ok_or(CaptureError::BufferOverflow)?;
    // Byte views must stay addressable.
    px.checked_mul(4).ok_or(CaptureError::BufferOverflow)?;
    Ok(px)
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("capacity", &self.pixels.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_never_reduced() -> CaptureResult<()> {
        let mut frame = Frame::empty();
        frame.ensure_capacity(64, 32)?;
        let grown = frame.capacity();
        frame.ensure_capacity(4, 4)?;
        assert_eq!(frame.pixels().len(), 16);
        assert!(frame.capacity() >= grown);
        Ok(())
    }

    #[test]
    fn byte_view_is_little_endian_bgra() -> CaptureResult<()> {
        let frame = Frame::from_pixels(1, 1, vec![0x80_10_20_30])?;
        assert_eq!(frame.as_bgra_bytes(), &[0x30, 0x20, 0x10, 0x80]);
        assert_eq!(frame.pitch(), 4);
        Ok(())
    }

    #[test]
    fn mismatched_pixel_count_is_rejected() {
        let err = Frame::from_pixels(2, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidArgument(_)));
    }
}
