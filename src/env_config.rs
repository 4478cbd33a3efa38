//! Environment-variable knobs.
//!
//! Every tuning knob read from the environment goes through these helpers
//! so truthy parsing and positive-integer filtering are shared.

use std::time::Duration;

pub(crate) const ACQUIRE_TIMEOUT_ENV: &str = "STILL_CAPTURE_ACQUIRE_TIMEOUT_MS";
pub(crate) const DISABLE_CURSOR_ENV: &str = "STILL_CAPTURE_DISABLE_CURSOR";

pub(crate) const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_millis(1000);

/// `1`, `true`, `yes` or `on`, case-insensitive, trimmed.
#[inline]
pub(crate) fn env_var_truthy(var_name: &str) -> bool {
    std::env::var(var_name)
        .map(|raw| parse_truthy(&raw))
        .unwrap_or(false)
}

/// `Some` only for a valid integer greater than zero.
#[inline]
pub(crate) fn env_var_positive_u64(var_name: &str) -> Option<u64> {
    std::env::var(var_name)
        .ok()
        .and_then(|raw| parse_positive_u64(&raw))
}

fn parse_truthy(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

fn parse_positive_u64(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|value| *value > 0)
}

/// Acquire timeout for the session builder default.
pub(crate) fn acquire_timeout() -> Duration {
    env_var_positive_u64(ACQUIRE_TIMEOUT_ENV)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT)
}

/// Declares a cached boolean feature flag backed by a `OnceLock<bool>`.
///
/// `enabled_unless(fn_name, "ENV_VAR")` is on by default and turned off
/// by a truthy env var.
macro_rules! define_env_flag {
    (enabled_unless($fn_name:ident, $var:expr)) => {
        #[inline]
        fn $fn_name() -> bool {
            static VALUE: ::std::sync::OnceLock<bool> = ::std::sync::OnceLock::new();
            *VALUE.get_or_init(|| !$crate::env_config::env_var_truthy($var))
        }
    };
}

pub(crate) use define_env_flag;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values_are_case_insensitive() {
        for raw in ["1", "true", " TRUE ", "Yes", "on"] {
            assert!(parse_truthy(raw), "{raw:?}");
        }
        for raw in ["", "0", "false", "off", "enabled"] {
            assert!(!parse_truthy(raw), "{raw:?}");
        }
    }

    #[test]
    fn positive_integer_rejects_zero_and_garbage() {
        assert_eq!(parse_positive_u64(" 250 "), Some(250));
        assert_eq!(parse_positive_u64("0"), None);
        assert_eq!(parse_positive_u64("-5"), None);
        assert_eq!(parse_positive_u64("fast"), None);
    }
}
