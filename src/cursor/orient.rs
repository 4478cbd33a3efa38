//! Re-orients a decoded cursor from logical desktop coordinates into the
//! physical layout of the raw duplicated surface.

use super::CursorBuffer;
use crate::geometry::{FrameBounds, Rotation};

/// Rotate a `width` x `height` row-major image in place.
///
/// `Rotate90` counter-rotates (`new(i, j) = old(j, W-1-i)`), `Rotate270`
/// rotates clockwise (`new(i, j) = old(H-1-j, i)`); both leave a
/// `height` x `width` image. Quarter turns follow permutation cycles, so
/// every pixel is moved exactly once and no scratch image is needed.
pub fn rotate_pixels_in_place(pixels: &mut [u32], width: usize, height: usize, rotation: Rotation) {
    let len = width * height;
    let pixels = &mut pixels[..len];
    match rotation {
        Rotation::Identity => {}
        Rotation::Rotate180 => pixels.reverse(),
        Rotation::Rotate90 => permute(pixels, |idx| {
            let (r, c) = (idx / width, idx % width);
            (width - 1 - c) * height + r
        }),
        Rotation::Rotate270 => permute(pixels, |idx| {
            let (r, c) = (idx / width, idx % width);
            c * height + (height - 1 - r)
        }),
    }
}

/// Apply the permutation "element at `i` moves to `dest(i)`".
fn permute(pixels: &mut [u32], dest: impl Fn(usize) -> usize) {
    for start in 0..pixels.len() {
        // Only the smallest index of a cycle walks it.
        let mut next = dest(start);
        while next > start {
            next = dest(next);
        }
        if next < start {
            continue;
        }

        let mut carried = pixels[start];
        let mut cur = dest(start);
        while cur != start {
            std::mem::swap(&mut carried, &mut pixels[cur]);
            cur = dest(cur);
        }
        pixels[start] = carried;
    }
}

/// Rotate `buffer` to match a desktop rotated by `rotation` and remap its
/// origin. `desktop_width`/`desktop_height` are the logical (rotated)
/// desktop dimensions of the output.
pub fn orient_cursor(
    buffer: &mut CursorBuffer,
    rotation: Rotation,
    desktop_width: i32,
    desktop_height: i32,
) {
    let old = buffer.bounds();
    let (w, h) = (old.width.max(0) as usize, old.height.max(0) as usize);
    rotate_pixels_in_place(buffer.pixels_mut(), w, h, rotation);

    let bounds = match rotation {
        Rotation::Identity => return,
        Rotation::Rotate90 => FrameBounds::new(
            old.y,
            desktop_width - (old.x + old.width),
            old.height,
            old.width,
        ),
        Rotation::Rotate180 => FrameBounds::new(
            desktop_width - (old.x + old.width),
            desktop_height - (old.y + old.height),
            old.width,
            old.height,
        ),
        Rotation::Rotate270 => FrameBounds::new(
            desktop_height - (old.y + old.height),
            old.x,
            old.height,
            old.width,
        ),
    };
    buffer.set_bounds(bounds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{PointerShapeInfo, ShapeKind, decode_shape};
    use crate::error::CaptureResult;

    fn numbered(len: usize) -> Vec<u32> {
        (0..len as u32).collect()
    }

    #[test]
    fn quarter_turn_matches_index_formula() {
        // 3 wide, 2 tall:
        // 0 1 2
        // 3 4 5
        let mut px = numbered(6);
        rotate_pixels_in_place(&mut px, 3, 2, Rotation::Rotate90);
        // new(i, j) = old(j, 2 - i), 2 wide x 3 tall
        assert_eq!(px, vec![2, 5, 1, 4, 0, 3]);

        let mut px = numbered(6);
        rotate_pixels_in_place(&mut px, 3, 2, Rotation::Rotate270);
        // new(i, j) = old(1 - j, i)
        assert_eq!(px, vec![3, 0, 4, 1, 5, 2]);
    }

    #[test]
    fn four_applications_restore_any_buffer() {
        for (w, h) in [(3, 2), (7, 5), (1, 9), (32, 17), (4, 4)] {
            let original = numbered(w * h);
            for rotation in [
                Rotation::Identity,
                Rotation::Rotate90,
                Rotation::Rotate180,
                Rotation::Rotate270,
            ] {
                let mut px = original.clone();
                let (mut cw, mut ch) = (w, h);
                for _ in 0..4 {
                    rotate_pixels_in_place(&mut px, cw, ch, rotation);
                    if rotation.swaps_axes() {
                        std::mem::swap(&mut cw, &mut ch);
                    }
                }
                assert_eq!(px, original, "{w}x{h} {rotation:?}");
            }
        }
    }

    #[test]
    fn opposite_quarter_turns_cancel() {
        let original = numbered(6 * 4);
        let mut px = original.clone();
        rotate_pixels_in_place(&mut px, 6, 4, Rotation::Rotate90);
        rotate_pixels_in_place(&mut px, 4, 6, Rotation::Rotate270);
        assert_eq!(px, original);
    }

    #[test]
    fn half_turn_reverses() {
        let mut px = numbered(6);
        rotate_pixels_in_place(&mut px, 3, 2, Rotation::Rotate180);
        assert_eq!(px, vec![5, 4, 3, 2, 1, 0]);
    }

    fn cursor_at(x: i32, y: i32, w: u32, h: u32) -> CaptureResult<CursorBuffer> {
        let shape: Vec<u8> = (0..w * h).flat_map(|i| i.to_le_bytes()).collect();
        let info = PointerShapeInfo {
            kind: ShapeKind::Color.code(),
            width: w,
            height: h,
            pitch: w * 4,
            ..PointerShapeInfo::default()
        };
        let mut buffer = CursorBuffer::new();
        decode_shape(&shape, &info, (x, y), &mut buffer)?;
        Ok(buffer)
    }

    #[test]
    fn bounds_follow_desktop_rotation() -> CaptureResult<()> {
        let (dw, dh) = (1080, 1920);

        let mut c = cursor_at(100, 200, 32, 16)?;
        orient_cursor(&mut c, Rotation::Rotate90, dw, dh);
        assert_eq!(c.bounds(), FrameBounds::new(200, 1080 - 132, 16, 32));
        assert_eq!(c.pitch(), 64);

        let mut c = cursor_at(100, 200, 32, 16)?;
        orient_cursor(&mut c, Rotation::Rotate180, dw, dh);
        assert_eq!(c.bounds(), FrameBounds::new(1080 - 132, 1920 - 216, 32, 16));

        let mut c = cursor_at(100, 200, 32, 16)?;
        orient_cursor(&mut c, Rotation::Rotate270, dw, dh);
        assert_eq!(c.bounds(), FrameBounds::new(1920 - 216, 100, 16, 32));

        let mut c = cursor_at(100, 200, 32, 16)?;
        let before = c.pixels().to_vec();
        orient_cursor(&mut c, Rotation::Identity, dw, dh);
        assert_eq!(c.bounds(), FrameBounds::new(100, 200, 32, 16));
        assert_eq!(c.pixels(), before.as_slice());
        Ok(())
    }
}
