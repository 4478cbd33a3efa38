//! Channel-order conversion for encoders that expect RGB(A) byte order.

/// `0xAARRGGBB` (BGRA bytes in memory) to `0xAABBGGRR` (RGBA bytes).
#[inline(always)]
pub(crate) fn swap_bgra_to_rgba(pixel: u32) -> u32 {
    ((pixel & 0x0000_00FF) << 16)
        | (pixel & 0x0000_FF00)
        | ((pixel & 0x00FF_0000) >> 16)
        | (pixel & 0xFF00_0000)
}

pub(crate) fn bgra_to_rgba_bytes(pixels: &[u32], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(pixels.len() * 4);
    for px in pixels {
        out.extend_from_slice(&swap_bgra_to_rgba(*px).to_le_bytes());
    }
}

/// Drops alpha; for containers without an alpha channel.
pub(crate) fn bgra_to_rgb_bytes(pixels: &[u32], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(pixels.len() * 3);
    for px in pixels {
        let [r, g, b, _] = swap_bgra_to_rgba(*px).to_le_bytes();
        out.extend_from_slice(&[r, g, b]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_red_and_blue_only() {
        assert_eq!(swap_bgra_to_rgba(0x8011_2233), 0x8033_2211);
    }

    #[test]
    fn byte_orders() {
        let pixels = [0xFF11_2233u32, 0x0044_5566];
        let mut out = Vec::new();
        bgra_to_rgba_bytes(&pixels, &mut out);
        assert_eq!(out, vec![0x11, 0x22, 0x33, 0xFF, 0x44, 0x55, 0x66, 0x00]);
        bgra_to_rgb_bytes(&pixels, &mut out);
        assert_eq!(out, vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    }
}
