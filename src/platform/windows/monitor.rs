use anyhow::Context;
use windows::Win32::Foundation::RECT;
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_MODE_ROTATION, DXGI_MODE_ROTATION_ROTATE90, DXGI_MODE_ROTATION_ROTATE180,
    DXGI_MODE_ROTATION_ROTATE270,
};
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory1, DXGI_ERROR_NOT_FOUND, IDXGIAdapter, IDXGIFactory1, IDXGIOutput,
};
use windows::core::Interface;

use crate::error::{CaptureError, CaptureResult};
use crate::geometry::{FrameBounds, Rotation};
use crate::monitor::MonitorInfo;

/// A desktop-attached output together with the DXGI objects needed to
/// duplicate it.
pub(crate) struct ResolvedOutput {
    pub info: MonitorInfo,
    pub device_name: String,
    pub adapter: IDXGIAdapter,
    pub output: IDXGIOutput,
}

pub(crate) fn rotation_from_dxgi(rotation: DXGI_MODE_ROTATION) -> Rotation {
    match rotation {
        DXGI_MODE_ROTATION_ROTATE90 => Rotation::Rotate90,
        DXGI_MODE_ROTATION_ROTATE180 => Rotation::Rotate180,
        DXGI_MODE_ROTATION_ROTATE270 => Rotation::Rotate270,
        // IDENTITY and UNSPECIFIED
        _ => Rotation::Identity,
    }
}

fn bounds_from_rect(rect: &RECT) -> FrameBounds {
    FrameBounds::new(
        rect.left,
        rect.top,
        rect.right - rect.left,
        rect.bottom - rect.top,
    )
}

fn device_name(raw: &[u16]) -> String {
    let end = raw.iter().position(|&unit| unit == 0).unwrap_or(raw.len());
    String::from_utf16_lossy(&raw[..end])
}

/// Call `enum_at(0), enum_at(1), ...` until DXGI reports the end of the
/// list.
fn collect_until_not_found<T>(
    what: &str,
    mut enum_at: impl FnMut(u32) -> windows::core::Result<T>,
) -> CaptureResult<Vec<T>> {
    let mut items = Vec::new();
    for slot in 0u32.. {
        match enum_at(slot) {
            Ok(item) => items.push(item),
            Err(err) if err.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(err) => {
                return Err(CaptureError::Platform(
                    anyhow::Error::from(err).context(format!("{what}({slot}) failed")),
                ));
            }
        }
    }
    Ok(items)
}

/// Every desktop-attached output, adapters first then outputs in DXGI
/// order. Monitor indices count only the attached outputs.
pub(crate) fn enumerate_resolved() -> CaptureResult<Vec<ResolvedOutput>> {
    let factory: IDXGIFactory1 = unsafe { CreateDXGIFactory1() }
        .context("CreateDXGIFactory1 failed")
        .map_err(CaptureError::Platform)?;
    let adapters = collect_until_not_found("EnumAdapters1", |slot| unsafe {
        factory.EnumAdapters1(slot)
    })?;

    let mut resolved = Vec::new();
    for adapter1 in adapters {
        let adapter: IDXGIAdapter = adapter1
            .cast()
            .context("IDXGIAdapter1 does not expose IDXGIAdapter")
            .map_err(CaptureError::Platform)?;
        let outputs =
            collect_until_not_found("EnumOutputs", |slot| unsafe { adapter.EnumOutputs(slot) })?;

        for output in outputs {
            let desc = unsafe { output.GetDesc() }
                .context("IDXGIOutput::GetDesc failed")
                .map_err(CaptureError::Platform)?;
            if !desc.AttachedToDesktop.as_bool() {
                continue;
            }

            let info = MonitorInfo::new(
                resolved.len() as u32,
                rotation_from_dxgi(desc.Rotation),
                bounds_from_rect(&desc.DesktopCoordinates),
            );
            let name = device_name(&desc.DeviceName);
            log::debug!("found output {name}: {info}");
            resolved.push(ResolvedOutput {
                info,
                device_name: name,
                adapter: adapter.clone(),
                output,
            });
        }
    }
    Ok(resolved)
}

pub(crate) fn resolve_output(monitor: &MonitorInfo) -> CaptureResult<ResolvedOutput> {
    enumerate_resolved()?
        .into_iter()
        .find(|candidate| candidate.info.index() == monitor.index())
        .ok_or(CaptureError::MonitorLost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use windows::Win32::Graphics::Dxgi::Common::{
        DXGI_MODE_ROTATION_IDENTITY, DXGI_MODE_ROTATION_UNSPECIFIED,
    };

    #[test]
    fn device_name_stops_at_nul() {
        let mut raw = [0u16; 32];
        for (slot, unit) in r"\\.\DISPLAY1".encode_utf16().enumerate() {
            raw[slot] = unit;
        }
        assert_eq!(device_name(&raw), r"\\.\DISPLAY1");
    }

    #[test]
    fn unspecified_rotation_is_identity() {
        assert_eq!(rotation_from_dxgi(DXGI_MODE_ROTATION_UNSPECIFIED), Rotation::Identity);
        assert_eq!(rotation_from_dxgi(DXGI_MODE_ROTATION_IDENTITY), Rotation::Identity);
        assert_eq!(rotation_from_dxgi(DXGI_MODE_ROTATION_ROTATE270), Rotation::Rotate270);
    }

    #[test]
    fn rect_becomes_origin_and_size() {
        let rect = RECT {
            left: -1080,
            top: 200,
            right: 0,
            bottom: 2120,
        };
        assert_eq!(bounds_from_rect(&rect), FrameBounds::new(-1080, 200, 1080, 1920));
    }
}
