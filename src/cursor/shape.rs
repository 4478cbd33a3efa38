use super::{CursorBuffer, PointerShapeInfo, ShapeKind};
use crate::error::{CaptureError, CaptureResult};
use crate::geometry::FrameBounds;

const OPAQUE: u32 = 0xFF00_0000;
const WHITE: u32 = 0xFFFF_FFFF;

/// Decode a raw cursor shape blob into `out`, placed at `position`.
///
/// Everything is validated and `out` is grown before the first write, so
/// on error the buffer keeps its previous image.
pub fn decode_shape(
    shape: &[u8],
    info: &PointerShapeInfo,
    position: (i32, i32),
    out: &mut CursorBuffer,
) -> CaptureResult<()> {
    let kind = ShapeKind::from_code(info.kind)?;
    let width = info.width as usize;
    let pitch = info.pitch as usize;

    let (out_height, row_bytes) = match kind {
        ShapeKind::Monochrome => (info.height as usize / 2, width.div_ceil(8)),
        ShapeKind::Color | ShapeKind::MaskedColor => (info.height as usize, width * 4),
    };
    let rows_read = info.height as usize;

    if width > i32::MAX as usize || out_height > i32::MAX as usize {
        return Err(CaptureError::InvalidArgument(format!(
            "cursor shape {}x{} is too large",
            info.width, info.height
        )));
    }
    if rows_read > 0 && width > 0 {
        if pitch < row_bytes {
            return Err(CaptureError::InvalidArgument(format!(
                "cursor pitch {pitch} is smaller than a {row_bytes}-byte row"
            )));
        }
        let required = (rows_read - 1)
            .checked_mul(pitch)
            .and_then(|bytes| bytes.checked_add(row_bytes))
            .ok_or(CaptureError::BufferOverflow)?;
        if shape.len() < required {
            return Err(CaptureError::InvalidArgument(format!(
                "cursor shape holds {} bytes, {required} required",
                shape.len()
            )));
        }
    }

    let len = width
        .checked_mul(out_height)
        .ok_or(CaptureError::BufferOverflow)?;
    out.reserve_pixels(len)?;
    out.set_bounds(FrameBounds::new(
        position.0,
        position.1,
        width as i32,
        out_height as i32,
    ));
    if len == 0 {
        return Ok(());
    }

    let pixels = out.pixels_mut();
    match kind {
        ShapeKind::Color => copy_color_rows(shape, pitch, width, pixels, |px| px),
        ShapeKind::MaskedColor => copy_color_rows(shape, pitch, width, pixels, |px| px | OPAQUE),
        ShapeKind::Monochrome => {
            let xor_offset = out_height * pitch;
            for (row, dst) in pixels.chunks_exact_mut(width).enumerate() {
                let src = &shape[xor_offset + row * pitch..];
                for (col, px) in dst.iter_mut().enumerate() {
                    let mask = 0x80u8 >> (col % 8);
                    *px = if src[col / 8] & mask != 0 { WHITE } else { 0 };
                }
            }
        }
    }

    Ok(())
}

fn copy_color_rows(
    shape: &[u8],
    pitch: usize,
    width: usize,
    pixels: &mut [u32],
    map: impl Fn(u32) -> u32,
) {
    for (row, dst) in pixels.chunks_exact_mut(width).enumerate() {
        let src = &shape[row * pitch..row * pitch + width * 4];
        for (px, bytes) in dst.iter_mut().zip(src.chunks_exact(4)) {
            *px = map(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(kind: ShapeKind, width: u32, height: u32, pitch: u32) -> PointerShapeInfo {
        PointerShapeInfo {
            kind: kind.code(),
            width,
            height,
            pitch,
            ..PointerShapeInfo::default()
        }
    }

    #[test]
    fn color_rows_skip_pitch_padding() -> CaptureResult<()> {
        // 2x2 with 4 bytes of padding per row.
        let mut shape = vec![0u8; 12 * 2];
        shape[0..4].copy_from_slice(&0x11223344u32.to_le_bytes());
        shape[4..8].copy_from_slice(&0x55667788u32.to_le_bytes());
        shape[8..12].fill(0xEE);
        shape[12..16].copy_from_slice(&0x99AABBCCu32.to_le_bytes());
        shape[16..20].copy_from_slice(&0x00000001u32.to_le_bytes());

        let mut out = CursorBuffer::new();
        decode_shape(&shape, &info(ShapeKind::Color, 2, 2, 12), (5, -3), &mut out)?;
        assert_eq!(out.bounds(), FrameBounds::new(5, -3, 2, 2));
        assert_eq!(out.pitch(), 8);
        assert_eq!(out.pixels(), &[0x11223344, 0x55667788, 0x99AABBCC, 0x00000001]);
        Ok(())
    }

    #[test]
    fn masked_color_forces_opaque_alpha() -> CaptureResult<()> {
        let shape = [0x10u8, 0x20, 0x30, 0x00, 0x01, 0x02, 0x03, 0xFF];
        let mut out = CursorBuffer::new();
        decode_shape(&shape, &info(ShapeKind::MaskedColor, 2, 1, 8), (0, 0), &mut out)?;
        assert_eq!(out.pixels(), &[0xFF302010, 0xFF030201]);
        Ok(())
    }

    #[test]
    fn monochrome_reads_xor_half_msb_first() -> CaptureResult<()> {
        // 10 px wide, 2 rows per mask, pitch 2. AND mask is all ones.
        let shape = [
            0xFF, 0xFF, // AND row 0
            0xFF, 0xFF, // AND row 1
            0b1000_0001, 0b0100_0000, // XOR row 0
            0b0000_0000, 0b1000_0000, // XOR row 1
        ];
        let mut out = CursorBuffer::new();
        decode_shape(&shape, &info(ShapeKind::Monochrome, 10, 4, 2), (1, 2), &mut out)?;
        assert_eq!(out.bounds(), FrameBounds::new(1, 2, 10, 2));

        let white = |cols: &[usize], row: usize| {
            (0..10)
                .map(|c| if cols.contains(&c) { WHITE } else { 0 })
                .collect::<Vec<_>>()
                == out.pixels()[row * 10..(row + 1) * 10]
        };
        assert!(white(&[0, 7, 9], 0));
        assert!(white(&[8], 1));
        Ok(())
    }

    #[test]
    fn monochrome_without_xor_bits_is_transparent() -> CaptureResult<()> {
        let mut shape = vec![0xFFu8; 4 * 32];
        shape[4 * 16..].fill(0);
        let mut out = CursorBuffer::new();
        decode_shape(&shape, &info(ShapeKind::Monochrome, 32, 32, 4), (0, 0), &mut out)?;
        assert_eq!(out.bounds().height, 16);
        assert!(out.pixels().iter().all(|px| *px == 0));
        Ok(())
    }

    #[test]
    fn unknown_kind_leaves_buffer_untouched() -> CaptureResult<()> {
        let mut out = CursorBuffer::new();
        decode_shape(&[1, 2, 3, 4], &info(ShapeKind::Color, 1, 1, 4), (7, 8), &mut out)?;
        let before = (out.bounds(), out.pixels().to_vec());

        let bogus = PointerShapeInfo {
            kind: 8,
            ..info(ShapeKind::Color, 1, 1, 4)
        };
        let err = decode_shape(&[9; 4], &bogus, (0, 0), &mut out).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidArgument(_)));
        assert_eq!((out.bounds(), out.pixels().to_vec()), before);
        Ok(())
    }

    #[test]
    fn truncated_blob_is_rejected_before_writing() {
        let mut out = CursorBuffer::new();
        let err = decode_shape(&[0; 15], &info(ShapeKind::Color, 2, 2, 8), (0, 0), &mut out)
            .unwrap_err();
        assert!(matches!(err, CaptureError::InvalidArgument(_)));
        assert_eq!(out.bounds(), FrameBounds::default());
    }
}
