use std::fmt;

use crate::geometry::{FrameBounds, Rotation};

/// One duplicable output as seen at enumeration time.
///
/// Equality compares every field, so a changed mode or moved display
/// no longer matches the snapshot taken before it changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorInfo {
    index: u32,
    name: String,
    rotation: Rotation,
    /// Virtual-desktop rectangle, already rotated.
    bounds: FrameBounds,
}

impl MonitorInfo {
    pub fn new(index: u32, rotation: Rotation, bounds: FrameBounds) -> Self {
        Self {
            index,
            name: display_name(index, &bounds),
            rotation,
            bounds,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn bounds(&self) -> FrameBounds {
        self.bounds
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.bounds.x, self.bounds.y)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "idx": self.index,
            "name": self.name,
            "x": self.bounds.x,
            "y": self.bounds.y,
            "width": self.bounds.width,
            "height": self.bounds.height,
            "rotation": self.rotation.degrees(),
        })
    }
}

fn display_name(index: u32, bounds: &FrameBounds) -> String {
    format!(
        "Display {}: {}x{} @ {},{}",
        index + 1,
        bounds.width,
        bounds.height,
        bounds.x,
        bounds.y
    )
}

impl fmt::Display for MonitorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// JSON listing printed by `--sources`.
pub fn monitors_to_json(monitors: &[MonitorInfo]) -> serde_json::Value {
    serde_json::json!({
        "count": monitors.len(),
        "monitors": monitors.iter().map(MonitorInfo::to_json).collect::<Vec<_>>(),
    })
}

pub fn enumerate_monitors() -> crate::error::CaptureResult<Vec<MonitorInfo>> {
    crate::source::default_backend()?.enumerate_monitors()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_one_based_with_geometry() {
        let info = MonitorInfo::new(1, Rotation::Rotate90, FrameBounds::new(1920, -120, 1080, 1920));
        assert_eq!(info.name(), "Display 2: 1080x1920 @ 1920,-120");
        assert_eq!(info.to_string(), info.name());
    }

    #[test]
    fn any_changed_field_breaks_equality() {
        let info = MonitorInfo::new(0, Rotation::Identity, FrameBounds::new(0, 0, 1920, 1080));
        let rotated = MonitorInfo::new(0, Rotation::Rotate180, FrameBounds::new(0, 0, 1920, 1080));
        let resized = MonitorInfo::new(0, Rotation::Identity, FrameBounds::new(0, 0, 1280, 1024));
        assert_eq!(info, info.clone());
        assert_ne!(info, rotated);
        assert_ne!(info, resized);
    }

    #[test]
    fn json_listing_has_count_and_fields() {
        let monitors = vec![
            MonitorInfo::new(0, Rotation::Identity, FrameBounds::new(0, 0, 1920, 1080)),
            MonitorInfo::new(1, Rotation::Rotate270, FrameBounds::new(1920, 0, 1080, 1920)),
        ];
        let json = monitors_to_json(&monitors);
        assert_eq!(json["count"], 2);
        assert_eq!(json["monitors"][1]["idx"], 1);
        assert_eq!(json["monitors"][1]["rotation"], 270);
        assert_eq!(json["monitors"][1]["name"], "Display 2: 1080x1920 @ 1920,0");
        assert_eq!(json["monitors"][0]["width"], 1920);
    }
}
