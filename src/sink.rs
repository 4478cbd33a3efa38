use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{ColorType, ImageFormat};

use crate::convert::{bgra_to_rgb_bytes, bgra_to_rgba_bytes};
use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;

/// File written when no output path is given.
pub const DEFAULT_FILE_NAME: &str = "ScreenShot.jpg";

/// `ScreenShot.jpg` in the user's documents folder, when the platform
/// reports one.
pub fn default_output_path() -> Option<PathBuf> {
    dirs::document_dir().map(|dir| dir.join(DEFAULT_FILE_NAME))
}

/// Output container, picked from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    Bmp,
    Tiff,
    Png,
    Jpeg,
}

impl ContainerFormat {
    pub fn from_path(path: &Path) -> CaptureResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(CaptureError::UnsupportedExtension(format!(".{ext}"))),
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff => ImageFormat::Tiff,
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
        }
    }

    pub fn has_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

/// Encodes a finished canvas to a file.
pub trait ImageSink: Send + Sync {
    fn write(&self, path: &Path, format: ContainerFormat, canvas: &Frame) -> CaptureResult<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileSink;

impl ImageSink for ImageFileSink {
    fn write(&self, path: &Path, format: ContainerFormat, canvas: &Frame) -> CaptureResult<()> {
        let mut bytes = Vec::new();
        let color = if format.has_alpha() {
            bgra_to_rgba_bytes(canvas.pixels(), &mut bytes);
            ColorType::Rgba8
        } else {
            bgra_to_rgb_bytes(canvas.pixels(), &mut bytes);
            ColorType::Rgb8
        };

        image::save_buffer_with_format(
            path,
            &bytes,
            canvas.width(),
            canvas.height(),
            color,
            format.image_format(),
        )
        .with_context(|| format!("failed to write {:?} image to {}", format, path.display()))
        .map_err(CaptureError::Encode)?;

        log::debug!(
            "wrote {}x{} {:?} image to {}",
            canvas.width(),
            canvas.height(),
            format,
            path.display()
        );
        Ok(())
    }
}
