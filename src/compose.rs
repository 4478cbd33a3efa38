use crate::cursor::CursorBuffer;
use crate::frame::Frame;

const RB_MASK: u32 = 0x00FF_00FF;
const AG_MASK: u32 = 0xFF00_FF00;

/// Blend one cursor pixel over one surface pixel, both `0xAARRGGBB`.
///
/// Red/blue and alpha/green pairs are weighted together; the
/// `0x0100_0000` term keeps the result alpha near opaque.
#[inline]
pub fn blend_pixel(surface: u32, cursor: u32) -> u32 {
    let alpha = cursor >> 24;
    let inv = 255 - alpha;
    let rb = ((inv * (surface & RB_MASK)) + (alpha * (cursor & RB_MASK))) >> 8;
    let ag = (inv * ((surface & AG_MASK) >> 8))
        + (alpha * (0x0100_0000 | ((cursor & 0x0000_FF00) >> 8)));
    (rb & RB_MASK) | (ag & AG_MASK)
}

/// Alpha-blend `cursor` onto `surface` at the cursor's bounds, clipped
/// to the surface on both axes.
pub fn blend_cursor(surface: &mut Frame, cursor: &CursorBuffer) {
    let bounds = cursor.bounds();
    if bounds.width <= 0 || bounds.height <= 0 {
        return;
    }
    let surface_w = i64::from(surface.width());
    let surface_h = i64::from(surface.height());

    let left = i64::from(bounds.x);
    let top = i64::from(bounds.y);
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = (left + i64::from(bounds.width)).min(surface_w);
    let y1 = (top + i64::from(bounds.height)).min(surface_h);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let cursor_w = bounds.width as usize;
    let src = cursor.pixels();
    let dst_w = surface_w as usize;
    let crop_x = (x0 - left) as usize;
    let crop_y = (y0 - top) as usize;
    let span = (x1 - x0) as usize;
    let dst = surface.pixels_mut();

    for row in 0..(y1 - y0) as usize {
        let src_start = (crop_y + row) * cursor_w + crop_x;
        let dst_start = (y0 as usize + row) * dst_w + x0 as usize;
        let src_row = &src[src_start..src_start + span];
        let dst_row = &mut dst[dst_start..dst_start + span];
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            *d = blend_pixel(*d, *s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{PointerShapeInfo, ShapeKind, decode_shape};
    use crate::error::CaptureResult;

    const BACKGROUND: u32 = 0xFF10_2030;

    fn surface(width: u32, height: u32) -> CaptureResult<Frame> {
        Frame::from_pixels(width, height, vec![BACKGROUND; (width * height) as usize])
    }

    fn solid_cursor(x: i32, y: i32, w: u32, h: u32, pixel: u32) -> CaptureResult<CursorBuffer> {
        let shape: Vec<u8> = std::iter::repeat_n(pixel.to_le_bytes(), (w * h) as usize)
            .flatten()
            .collect();
        let info = PointerShapeInfo {
            kind: ShapeKind::Color.code(),
            width: w,
            height: h,
            pitch: w * 4,
            ..PointerShapeInfo::default()
        };
        let mut cursor = CursorBuffer::new();
        decode_shape(&shape, &info, (x, y), &mut cursor)?;
        Ok(cursor)
    }

    #[test]
    fn half_alpha_white_regression() {
        assert_eq!(blend_pixel(0xFF10_2030, 0x80FF_FFFF), 0xFE87_8F97);
    }

    #[test]
    fn transparent_cursor_pixel_keeps_colour_channels() {
        // 255/256 attenuation of the surface, cursor colour ignored.
        assert_eq!(blend_pixel(0xFF10_2030, 0x00AB_CDEF), 0xFE0F_1F2F);
    }

    #[test]
    fn off_surface_cursor_writes_nothing() -> CaptureResult<()> {
        let mut frame = surface(8, 8)?;
        for (x, y) in [(18, 0), (0, 18), (-20, 2), (2, -20)] {
            blend_cursor(&mut frame, &solid_cursor(x, y, 4, 4, 0xFFFF_FFFF)?);
        }
        assert!(frame.pixels().iter().all(|px| *px == BACKGROUND));
        Ok(())
    }

    #[test]
    fn negative_origin_crops_leading_edge() -> CaptureResult<()> {
        let mut frame = surface(4, 4)?;
        blend_cursor(&mut frame, &solid_cursor(-2, -3, 3, 4, 0xFFFF_FFFF)?);
        let covered: Vec<usize> = frame
            .pixels()
            .iter()
            .enumerate()
            .filter(|(_, px)| **px != BACKGROUND)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(covered, vec![0]);
        Ok(())
    }

    #[test]
    fn trailing_edge_is_cropped() -> CaptureResult<()> {
        let mut frame = surface(4, 4)?;
        blend_cursor(&mut frame, &solid_cursor(3, 2, 4, 4, 0xFFFF_FFFF)?);
        let covered: Vec<usize> = frame
            .pixels()
            .iter()
            .enumerate()
            .filter(|(_, px)| **px != BACKGROUND)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(covered, vec![11, 15]);
        Ok(())
    }

    #[test]
    fn oversized_cursor_crops_both_edges() -> CaptureResult<()> {
        let mut frame = surface(3, 2)?;
        blend_cursor(&mut frame, &solid_cursor(-5, -5, 20, 20, 0xFF00_0000)?);
        let expected = blend_pixel(BACKGROUND, 0xFF00_0000);
        assert!(frame.pixels().iter().all(|px| *px == expected));
        Ok(())
    }
}
