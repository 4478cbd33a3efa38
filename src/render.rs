//! Lays the composited desktop out on the output canvas.
//!
//! The destination rectangle is rotated about the canvas centre and then
//! scaled about the canvas centre, over an opaque black background.
//! Sampling walks the canvas and maps each pixel centre back through the
//! inverse transform, filtering the source bilinearly with clamped edges.

use image::{ImageBuffer, Rgba, imageops};

use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;
use crate::geometry::{Rotation, RendererInfo};

pub const BACKGROUND: u32 = 0xFF00_0000;

/// Render `desktop` into `canvas` according to `info`. The canvas is
/// resized to the output size.
pub fn render_canvas(
    desktop: &Frame,
    info: &RendererInfo,
    canvas: &mut Frame,
) -> CaptureResult<()> {
    let out = info.output_size;
    if !out.is_positive() {
        return Err(CaptureError::DegenerateGeometry(format!(
            "output size {}x{}",
            out.width, out.height
        )));
    }
    if info.scale_x == 0.0 || info.scale_y == 0.0 {
        return Err(CaptureError::DegenerateGeometry(format!(
            "scale {}x{}",
            info.scale_x, info.scale_y
        )));
    }

    canvas.ensure_capacity(out.width as u32, out.height as u32)?;
    canvas.fill(BACKGROUND);

    let (sin, cos) = match info.rotation() {
        Rotation::Identity => (0.0f64, 1.0f64),
        Rotation::Rotate90 => (1.0, 0.0),
        Rotation::Rotate180 => (0.0, -1.0),
        Rotation::Rotate270 => (-1.0, 0.0),
    };
    let cx = f64::from(out.width) / 2.0;
    let cy = f64::from(out.height) / 2.0;
    let inv_sx = 1.0 / f64::from(info.scale_x);
    let inv_sy = 1.0 / f64::from(info.scale_y);

    let dst = info.destination;
    let src = info.source;
    let ratio_x = f64::from(src.width) / f64::from(dst.width);
    let ratio_y = f64::from(src.height) / f64::from(dst.height);
    // Channel order is irrelevant to the filter, so BGRA bytes pass as Rgba.
    let view: ImageBuffer<Rgba<u8>, &[u8]> =
        ImageBuffer::from_raw(desktop.width(), desktop.height(), desktop.as_bgra_bytes())
            .ok_or_else(|| {
                CaptureError::InvalidArgument("desktop buffer does not match its size".into())
            })?;
    // Sample coordinates put pixel centres on integers.
    let max_x = f64::from((src.x + src.width).min(desktop.width() as i32) - 1);
    let max_y = f64::from((src.y + src.height).min(desktop.height() as i32) - 1);
    let min_x = f64::from(src.x.max(0));
    let min_y = f64::from(src.y.max(0));
    if max_x < min_x || max_y < min_y {
        return Ok(());
    }
    let canvas_w = out.width as usize;

    for (y, row) in canvas.pixels_mut().chunks_exact_mut(canvas_w).enumerate() {
        let qy = (y as f64 + 0.5 - cy) * inv_sy;
        for (x, px) in row.iter_mut().enumerate() {
            let qx = (x as f64 + 0.5 - cx) * inv_sx;
            // Undo the rotation.
            let px_x = qx * cos + qy * sin + cx;
            let px_y = -qx * sin + qy * cos + cy;

            let lx = px_x - f64::from(dst.x);
            let ly = px_y - f64::from(dst.y);
            if lx < 0.0 || ly < 0.0 || lx >= f64::from(dst.width) || ly >= f64::from(dst.height) {
                continue;
            }

            let sx = (f64::from(src.x) + lx * ratio_x - 0.5).clamp(min_x, max_x);
            let sy = (f64::from(src.y) + ly * ratio_y - 0.5).clamp(min_y, max_y);
            if let Some(sample) = imageops::interpolate_bilinear(&view, sx as f32, sy as f32) {
                *px = u32::from_le_bytes(sample.0);
            }
        }
    }

    Ok(())
}
