use std::fmt;

#[derive(Debug)]
pub enum CaptureError {
    /// The requested monitor index is not present in the enumerated
    /// output list.
    InvalidTarget(i32),

    MonitorLost,

    AccessLost,

    NotConfigured,

    UnsupportedFormat(String),

    /// Resolved source/destination/canvas geometry has a zero or
    /// negative area.
    DegenerateGeometry(String),

    UnsupportedExtension(String),

    InvalidArgument(String),

    OutOfMemory,

    BufferOverflow,

    BackendUnavailable(String),

    /// Output source failure, propagated verbatim.
    Platform(anyhow::Error),

    /// Image sink failure, propagated verbatim.
    Encode(anyhow::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureErrorClass {
    InvalidInput,
    Unsupported,
    Resource,
    Transient,
    Upstream,
}

impl CaptureError {
    pub fn class(&self) -> CaptureErrorClass {
        match self {
            Self::InvalidTarget(_)
            | Self::NotConfigured
            | Self::DegenerateGeometry(_)
            | Self::UnsupportedExtension(_)
            | Self::InvalidArgument(_) => CaptureErrorClass::InvalidInput,
            Self::UnsupportedFormat(_) | Self::BackendUnavailable(_) => {
                CaptureErrorClass::Unsupported
            }
            Self::OutOfMemory | Self::BufferOverflow => CaptureErrorClass::Resource,
            Self::MonitorLost | Self::AccessLost => CaptureErrorClass::Transient,
            Self::Platform(_) | Self::Encode(_) => CaptureErrorClass::Upstream,
        }
    }

    /// Whether reconfiguring the session (reopening the output) may
    /// clear the error.
    pub fn requires_reconfigure(&self) -> bool {
        matches!(self, Self::MonitorLost | Self::AccessLost)
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget(index) => write!(f, "monitor '{index}' was not found"),
            Self::MonitorLost => write!(f, "monitor settings changed or monitor is gone"),
            Self::AccessLost => write!(f, "desktop duplication access lost"),
            Self::NotConfigured => write!(f, "capture session has no active configuration"),
            Self::UnsupportedFormat(fmt_name) => {
                write!(f, "unsupported desktop pixel format: {fmt_name}")
            }
            Self::DegenerateGeometry(message) => write!(f, "degenerate geometry: {message}"),
            Self::UnsupportedExtension(ext) => {
                write!(f, "unsupported output file extension: '{ext}'")
            }
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::OutOfMemory => write!(f, "out of memory while growing a capture buffer"),
            Self::BufferOverflow => write!(f, "frame buffer size overflow"),
            Self::BackendUnavailable(message) => {
                write!(f, "no available backend implementation: {message}")
            }
            Self::Platform(inner) => write!(f, "{inner}"),
            Self::Encode(inner) => write!(f, "image encode failed: {inner}"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Platform(inner) | Self::Encode(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }
}

pub type CaptureResult<T> = Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_invalid_input() {
        assert_eq!(
            CaptureError::InvalidTarget(3).class(),
            CaptureErrorClass::InvalidInput
        );
        assert_eq!(
            CaptureError::UnsupportedExtension(".gif".into()).class(),
            CaptureErrorClass::InvalidInput
        );
        assert_eq!(
            CaptureError::DegenerateGeometry("0x0".into()).class(),
            CaptureErrorClass::InvalidInput
        );
    }

    #[test]
    fn upstream_errors_keep_their_source() {
        let err = CaptureError::Encode(anyhow::anyhow!("disk full"));
        assert_eq!(err.class(), CaptureErrorClass::Upstream);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "image encode failed: disk full");
    }

    #[test]
    fn lost_output_requires_reconfigure() {
        assert!(CaptureError::AccessLost.requires_reconfigure());
        assert!(!CaptureError::OutOfMemory.requires_reconfigure());
    }
}
