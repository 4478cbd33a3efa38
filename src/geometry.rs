//! Output geometry resolution.
//!
//! [`resolve`] maps a duplicated output's [`DisplayMode`], a
//! [`SizingPolicy`] and a [`RotationMode`] onto a [`RendererInfo`]: the
//! source rectangle inside the raw desktop image, the destination
//! rectangle inside the output canvas, and the rotation/scale applied
//! about the canvas centre when rendering.
//!
//! The raw duplicated surface is always delivered in the unrotated,
//! physical pixel layout, so a display rotated by 90/270 degrees yields
//! a source rectangle with its axes swapped relative to the mode.

use crate::error::{CaptureError, CaptureResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    pub const fn degrees(self) -> i32 {
        match self {
            Self::Identity => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }

    pub const fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Identity),
            90 => Some(Self::Rotate90),
            180 => Some(Self::Rotate180),
            270 => Some(Self::Rotate270),
            _ => None,
        }
    }

    /// `true` for 90/270, where width and height trade places.
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }
}

/// Rotation policy for the output canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RotationMode {
    /// Follow the display's native rotation.
    #[default]
    Auto,
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl RotationMode {
    pub const fn forced(self) -> Option<Rotation> {
        match self {
            Self::Auto => None,
            Self::Identity => Some(Rotation::Identity),
            Self::Rotate90 => Some(Rotation::Rotate90),
            Self::Rotate180 => Some(Rotation::Rotate180),
            Self::Rotate270 => Some(Rotation::Rotate270),
        }
    }

    /// Map the numeric option value (`0:Auto .. 4:270`).
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Auto),
            1 => Some(Self::Identity),
            2 => Some(Self::Rotate90),
            3 => Some(Self::Rotate180),
            4 => Some(Self::Rotate270),
            _ => None,
        }
    }
}

/// How the source rectangle is laid out on the output canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SizingPolicy {
    Normal,
    Stretch,
    #[default]
    AutoSize,
    Center,
    Zoom,
}

impl SizingPolicy {
    /// Map the numeric option value (`0:Normal .. 4:Zoom`).
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Normal),
            1 => Some(Self::Stretch),
            2 => Some(Self::AutoSize),
            3 => Some(Self::Center),
            4 => Some(Self::Zoom),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32bpp B8G8R8A8, the only layout the compositor understands.
    #[default]
    Bgra8,
    /// Any other platform format, kept by raw code for diagnostics.
    Other(u32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSize {
    pub width: i32,
    pub height: i32,
}

impl FrameSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FrameBounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    pub const fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Mode snapshot of a duplicated output, taken when the duplication
/// session is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: i32,
    pub height: i32,
    pub format: PixelFormat,
    pub rotation: Rotation,
}

/// Resolved geometry for one capture configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererInfo {
    pub sizing: SizingPolicy,
    pub rotation_degrees: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub source_format: PixelFormat,
    pub source: FrameBounds,
    pub destination: FrameBounds,
    pub output_size: FrameSize,
}

impl RendererInfo {
    pub fn rotation(&self) -> Rotation {
        Rotation::from_degrees(self.rotation_degrees as i32).unwrap_or_default()
    }

    /// Check that the geometry can be rendered.
    pub fn validate(&self) -> CaptureResult<()> {
        if let PixelFormat::Other(code) = self.source_format {
            return Err(CaptureError::UnsupportedFormat(format!("format code {code}")));
        }

        if self.sizing != SizingPolicy::Normal && !self.output_size.is_positive() {
            return Err(CaptureError::DegenerateGeometry(format!(
                "output size {}x{} must be positive",
                self.output_size.width, self.output_size.height
            )));
        }

        if !self.destination.is_positive() || !self.source.is_positive() {
            return Err(CaptureError::DegenerateGeometry(format!(
                "source {}x{} / destination {}x{} must be positive",
                self.source.width,
                self.source.height,
                self.destination.width,
                self.destination.height
            )));
        }

        Ok(())
    }
}

/// Narrow canvas arithmetic done in `i64` back to a rectangle coordinate.
fn fit(value: i64) -> CaptureResult<i32> {
    i32::try_from(value).map_err(|_| {
        CaptureError::DegenerateGeometry(format!("coordinate {value} is out of range"))
    })
}

/// Offset that centres `inner` within `outer`.
fn centred(outer: i32, inner: i32) -> CaptureResult<i32> {
    fit((i64::from(outer) - i64::from(inner)) >> 1)
}

/// Resolve and validate the renderer geometry for `mode`.
pub fn resolve(
    mode: &DisplayMode,
    sizing: SizingPolicy,
    rotation_mode: RotationMode,
    requested: FrameSize,
) -> CaptureResult<RendererInfo> {
    let source = if mode.rotation.swaps_axes() {
        FrameBounds::new(0, 0, mode.height, mode.width)
    } else {
        FrameBounds::new(0, 0, mode.width, mode.height)
    };
    let rotation = rotation_mode.forced().unwrap_or(mode.rotation);

    let mut info = RendererInfo {
        sizing,
        rotation_degrees: rotation.degrees() as f32,
        scale_x: 1.0,
        scale_y: 1.0,
        source_format: mode.format,
        source,
        destination: FrameBounds::new(0, 0, source.width, source.height),
        output_size: requested,
    };

    let src_w = source.width;
    let src_h = source.height;

    match sizing {
        SizingPolicy::Zoom => {
            let out = info.output_size;
            info.destination.x = centred(out.width, src_w)?;
            info.destination.y = centred(out.height, src_h)?;

            let out_aspect = out.width as f32 / out.height as f32;
            let scale = if rotation.swaps_axes() {
                let src_aspect = src_h as f32 / src_w as f32;
                if src_aspect > out_aspect {
                    out.width as f32 / src_h as f32
                } else {
                    out.height as f32 / src_w as f32
                }
            } else {
                let src_aspect = src_w as f32 / src_h as f32;
                if src_aspect > out_aspect {
                    out.width as f32 / src_w as f32
                } else {
                    out.height as f32 / src_h as f32
                }
            };
            info.scale_x = scale;
            info.scale_y = scale;
        }
        SizingPolicy::Center => {
            let out = info.output_size;
            info.destination.x = centred(out.width, src_w)?;
            info.destination.y = centred(out.height, src_h)?;
        }
        SizingPolicy::AutoSize => {
            if rotation.swaps_axes() {
                info.output_size = FrameSize::new(src_h, src_w);
                info.destination.x = centred(info.output_size.width, src_w)?;
                info.destination.y = centred(info.output_size.height, src_h)?;
            } else {
                info.output_size = FrameSize::new(src_w, src_h);
            }
        }
        SizingPolicy::Stretch => {
            let out = info.output_size;
            info.destination.x = centred(out.width, src_w)?;
            info.destination.y = centred(out.height, src_h)?;
            let dst = info.destination;
            if rotation.swaps_axes() {
                info.scale_x = out.width as f32 / dst.height as f32;
                info.scale_y = out.height as f32 / dst.width as f32;
            } else {
                info.scale_x = out.width as f32 / dst.width as f32;
                info.scale_y = out.height as f32 / dst.height as f32;
            }
        }
        SizingPolicy::Normal => {
            if !info.output_size.is_positive() {
                info.output_size = if rotation.swaps_axes() {
                    FrameSize::new(src_h, src_w)
                } else {
                    FrameSize::new(src_w, src_h)
                };
            }
            let (ow, oh) = (
                i64::from(info.output_size.width),
                i64::from(info.output_size.height),
            );
            let (dw, dh) = (i64::from(src_w), i64::from(src_h));
            let dst = &mut info.destination;
            match rotation {
                // bottom-left
                Rotation::Rotate90 => {
                    dst.x = fit((ow - oh) >> 1)?;
                    dst.y = fit(((ow + oh) >> 1) - dh)?;
                }
                // bottom-right
                Rotation::Rotate180 => {
                    dst.x = fit(ow - dw)?;
                    dst.y = fit(oh - dh)?;
                }
                // top-right
                Rotation::Rotate270 => {
                    dst.y = fit((oh - ow) >> 1)?;
                    dst.x = fit(ow - dw - ((ow - oh) >> 1))?;
                }
                Rotation::Identity => {}
            }
        }
    }

    info.validate()?;
    Ok(info)
}
