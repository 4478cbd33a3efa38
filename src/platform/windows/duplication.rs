use std::time::Duration;

use anyhow::Context;
use windows::Win32::Graphics::Direct3D11::{
    D3D11_CPU_ACCESS_READ, D3D11_MAP_READ, D3D11_MAPPED_SUBRESOURCE, D3D11_TEXTURE2D_DESC,
    D3D11_USAGE_STAGING, ID3D11Device, ID3D11DeviceContext, ID3D11Resource, ID3D11Texture2D,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::{
    DXGI_ERROR_ACCESS_LOST, DXGI_ERROR_WAIT_TIMEOUT, DXGI_OUTDUPL_DESC, DXGI_OUTDUPL_FRAME_INFO,
    DXGI_OUTDUPL_POINTER_SHAPE_INFO, IDXGIOutput, IDXGIOutput1, IDXGIOutputDuplication,
    IDXGIResource,
};
use windows::core::Interface;

use crate::cursor::{PointerEvent, PointerShapeInfo};
use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;
use crate::geometry::{DisplayMode, PixelFormat};
use crate::monitor::MonitorInfo;
use crate::source::{AcquireOutcome, OutputSource};

use super::d3d11;
use super::monitor::{ResolvedOutput, rotation_from_dxgi};

fn create_duplication(
    output: &IDXGIOutput,
    device: &ID3D11Device,
) -> CaptureResult<IDXGIOutputDuplication> {
    let output1: IDXGIOutput1 = output
        .cast()
        .context("failed to query IDXGIOutput1")
        .map_err(CaptureError::Platform)?;
    unsafe { output1.DuplicateOutput(device) }.map_err(|error| {
        if error.code() == DXGI_ERROR_ACCESS_LOST {
            CaptureError::AccessLost
        } else {
            CaptureError::Platform(anyhow::Error::from(error).context("DuplicateOutput failed"))
        }
    })
}

fn pixel_format(format: DXGI_FORMAT) -> PixelFormat {
    if format == DXGI_FORMAT_B8G8R8A8_UNORM {
        PixelFormat::Bgra8
    } else {
        PixelFormat::Other(format.0 as u32)
    }
}

fn platform_error(error: windows::core::Error, action: &'static str) -> CaptureError {
    if error.code() == DXGI_ERROR_ACCESS_LOST {
        CaptureError::AccessLost
    } else {
        CaptureError::Platform(anyhow::Error::from(error).context(action))
    }
}

/// Desktop Duplication session on one output, with a CPU-readable
/// staging texture for the desktop copy.
pub(crate) struct DxgiOutputSource {
    info: MonitorInfo,
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    duplication: IDXGIOutputDuplication,
    mode: DisplayMode,
    staging: Option<ID3D11Texture2D>,
    holding_frame: bool,
}

impl DxgiOutputSource {
    pub(crate) fn open(resolved: &ResolvedOutput) -> CaptureResult<Self> {
        let (device, context) =
            d3d11::create_device(&resolved.adapter).map_err(CaptureError::Platform)?;
        let duplication = create_duplication(&resolved.output, &device)?;

        let mut desc = DXGI_OUTDUPL_DESC::default();
        unsafe { duplication.GetDesc(&mut desc) };
        let mode = DisplayMode {
            width: desc.ModeDesc.Width as i32,
            height: desc.ModeDesc.Height as i32,
            format: pixel_format(desc.ModeDesc.Format),
            rotation: rotation_from_dxgi(desc.Rotation),
        };
        log::debug!(
            "duplicating {} ({}): {}x{} {:?} {}deg",
            resolved.info,
            resolved.device_name,
            mode.width,
            mode.height,
            mode.format,
            mode.rotation.degrees()
        );

        Ok(Self {
            info: resolved.info.clone(),
            device,
            context,
            duplication,
            mode,
            staging: None,
            holding_frame: false,
        })
    }

    fn ensure_staging_texture(
        &mut self,
        src: &D3D11_TEXTURE2D_DESC,
    ) -> CaptureResult<ID3D11Texture2D> {
        if let Some(existing) = &self.staging {
            let mut desc = D3D11_TEXTURE2D_DESC::default();
            unsafe { existing.GetDesc(&mut desc) };
            if desc.Width == src.Width && desc.Height == src.Height && desc.Format == src.Format {
                return Ok(existing.clone());
            }
        }

        let desc = D3D11_TEXTURE2D_DESC {
            Width: src.Width,
            Height: src.Height,
            MipLevels: 1,
            ArraySize: 1,
            Format: src.Format,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_STAGING,
            BindFlags: Default::default(),
            CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
            MiscFlags: Default::default(),
        };

        let mut texture: Option<ID3D11Texture2D> = None;
        unsafe { self.device.CreateTexture2D(&desc, None, Some(&mut texture)) }
            .context("failed to create staging texture")
            .map_err(CaptureError::Platform)?;
        let texture = texture
            .context("CreateTexture2D did not return a texture")
            .map_err(CaptureError::Platform)?;
        self.staging = Some(texture.clone());
        Ok(texture)
    }

    /// Copy the acquired desktop image to the staging texture and read it
    /// back into `desktop`. The staging texture is unmapped on every path.
    fn copy_desktop(
        &mut self,
        resource: IDXGIResource,
        desktop: &mut Frame,
    ) -> CaptureResult<()> {
        let texture: ID3D11Texture2D = resource
            .cast()
            .context("failed to cast acquired IDXGIResource to ID3D11Texture2D")
            .map_err(CaptureError::Platform)?;
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { texture.GetDesc(&mut desc) };
        if desc.Format != DXGI_FORMAT_B8G8R8A8_UNORM {
            return Err(CaptureError::UnsupportedFormat(format!("{:?}", desc.Format)));
        }

        let staging = self.ensure_staging_texture(&desc)?;
        let staging_res: ID3D11Resource = staging
            .cast()
            .context("failed to cast staging texture to ID3D11Resource")
            .map_err(CaptureError::Platform)?;
        let source_res: ID3D11Resource = texture
            .cast()
            .context("failed to cast desktop texture to ID3D11Resource")
            .map_err(CaptureError::Platform)?;
        unsafe { self.context.CopyResource(&staging_res, &source_res) };

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe { self.context.Map(&staging_res, 0, D3D11_MAP_READ, 0, Some(&mut mapped)) }
            .context("failed to map staging texture")
            .map_err(CaptureError::Platform)?;

        let result = copy_mapped_rows(&mapped, desc.Width, desc.Height, desktop);
        unsafe { self.context.Unmap(&staging_res, 0) };
        result
    }
}

fn copy_mapped_rows(
    mapped: &D3D11_MAPPED_SUBRESOURCE,
    width: u32,
    height: u32,
    desktop: &mut Frame,
) -> CaptureResult<()> {
    desktop.ensure_capacity(width, height)?;
    let row_bytes = desktop.pitch();
    let src_pitch = mapped.RowPitch as usize;
    if src_pitch < row_bytes || mapped.pData.is_null() {
        return Err(CaptureError::BufferOverflow);
    }

    let src_base = mapped.pData as *const u8;
    let dst = desktop.as_mut_bgra_bytes();
    for (row, dst_row) in dst.chunks_exact_mut(row_bytes).enumerate() {
        // SAFETY: the mapping covers `height` rows of `src_pitch` bytes.
        let src_row =
            unsafe { std::slice::from_raw_parts(src_base.add(row * src_pitch), row_bytes) };
        dst_row.copy_from_slice(src_row);
    }
    Ok(())
}

impl OutputSource for DxgiOutputSource {
    fn monitor_info(&self) -> &MonitorInfo {
        &self.info
    }

    fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    fn acquire_frame(
        &mut self,
        timeout: Duration,
        desktop: &mut Frame,
    ) -> CaptureResult<AcquireOutcome> {
        if self.holding_frame {
            self.release_frame()?;
        }

        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        let mut info = DXGI_OUTDUPL_FRAME_INFO::default();
        let mut resource: Option<IDXGIResource> = None;
        let acquired =
            unsafe { self.duplication.AcquireNextFrame(timeout_ms, &mut info, &mut resource) };
        if let Err(error) = acquired {
            if error.code() == DXGI_ERROR_WAIT_TIMEOUT {
                return Ok(AcquireOutcome::Timeout);
            }
            return Err(platform_error(error, "AcquireNextFrame failed"));
        }
        self.holding_frame = true;

        let copied = match resource {
            Some(resource) => self.copy_desktop(resource, desktop),
            None => Err(CaptureError::Platform(anyhow::anyhow!(
                "AcquireNextFrame returned no desktop resource"
            ))),
        };
        if let Err(err) = copied {
            if let Err(release_err) = self.release_frame() {
                log::warn!("failed to release frame after copy error: {release_err}");
            }
            return Err(err);
        }

        Ok(AcquireOutcome::Acquired {
            pointer: PointerEvent {
                timestamp: info.LastMouseUpdateTime,
                position: (
                    info.PointerPosition.Position.x,
                    info.PointerPosition.Position.y,
                ),
                visible: info.PointerPosition.Visible.as_bool(),
                shape_buffer_size: info.PointerShapeBufferSize,
                monitor: self.info.index(),
            },
        })
    }

    fn cursor_shape(&mut self, buffer: &mut [u8]) -> CaptureResult<PointerShapeInfo> {
        let mut required = 0u32;
        let mut shape = DXGI_OUTDUPL_POINTER_SHAPE_INFO::default();
        unsafe {
            self.duplication.GetFramePointerShape(
                buffer.len() as u32,
                buffer.as_mut_ptr().cast(),
                &mut required,
                &mut shape,
            )
        }
        .map_err(|error| platform_error(error, "GetFramePointerShape failed"))?;

        Ok(PointerShapeInfo {
            kind: shape.Type,
            width: shape.Width,
            height: shape.Height,
            pitch: shape.Pitch,
            hotspot_x: shape.HotSpot.x,
            hotspot_y: shape.HotSpot.y,
        })
    }

    fn release_frame(&mut self) -> CaptureResult<()> {
        if !self.holding_frame {
            return Ok(());
        }
        self.holding_frame = false;
        unsafe { self.duplication.ReleaseFrame() }
            .map_err(|error| platform_error(error, "ReleaseFrame failed"))
    }
}

impl Drop for DxgiOutputSource {
    fn drop(&mut self) {
        if self.holding_frame {
            unsafe { self.duplication.ReleaseFrame() }.ok();
        }
    }
}

// SAFETY: the device context and duplication interfaces are only touched
// through `&mut self`, and the session mutex serializes every call.
unsafe impl Send for DxgiOutputSource {}
