//! Validated configuration consumed by the detection and decision components.
//! Everything here is immutable for the lifetime of one automation engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Integer screen coordinate used as a click target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Clip this region to `monitor`.
    ///
    /// The origin is pulled inside the monitor and the size shrinks to fit, so
    /// a region lying completely outside collapses to a 1x1 area on the
    /// nearest monitor edge instead of producing an empty or negative size.
    pub fn clamp_to(&self, monitor: &Region) -> Region {
        let mon_left = monitor.left as i64;
        let mon_top = monitor.top as i64;
        let mon_right = monitor.right().max(mon_left + 1);
        let mon_bottom = monitor.bottom().max(mon_top + 1);

        let left = (self.left as i64).clamp(mon_left, mon_right - 1);
        let top = (self.top as i64).clamp(mon_top, mon_bottom - 1);
        let right = self.right().min(mon_right);
        let bottom = self.bottom().min(mon_bottom);

        Region {
            left: left as i32,
            top: top as i32,
            width: (right - left).max(1) as u32,
            height: (bottom - top).max(1) as u32,
        }
    }
}

/// Inclusive HSV bounds on the 8-bit scale (hue 0-179, saturation and value 0-255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub const MAX_HUE: u8 = 179;

    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDescriptor {
    pub name: String,
    pub path: PathBuf,
    /// Minimum correlation (0.0-1.0) for a match
    pub threshold: f32,
}

/// One monitored trade slot.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeDefinition {
    pub name: String,
    pub region: Region,
    /// Where the start click lands
    pub action_point: Point,
    /// Template proving the start button is clickable
    pub active_template: Option<String>,
    /// Template proving the start button is grayed out
    pub inactive_template: Option<String>,
    pub red_ratio_threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    pub cycle_period: Duration,
    /// `None` disables the collect trigger
    pub collect_interval: Option<Duration>,
    /// `None` disables the timed refresh condition
    pub refresh_interval: Option<Duration>,
    pub settle_delay: Duration,
}

impl TimingConfig {
    pub const MIN_CYCLE_PERIOD: Duration = Duration::from_millis(50);
    pub const MIN_CYCLE_SLEEP: Duration = Duration::from_millis(10);

    pub fn effective_cycle_period(&self) -> Duration {
        self.cycle_period.max(Self::MIN_CYCLE_PERIOD)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cycle_period: Duration::from_millis(500),
            collect_interval: Some(Duration::from_secs(300)),
            refresh_interval: Some(Duration::from_secs(60)),
            settle_delay: Duration::from_millis(150),
        }
    }
}

/// Argv template for the external screenshot tool.
///
/// Placeholders `{left}`, `{top}`, `{width}` and `{height}` are substituted per
/// capture. The tool must write an encoded image to stdout.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    pub command: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            command: [
                "import",
                "-window",
                "root",
                "-crop",
                "{width}x{height}+{left}+{top}",
                "png:-",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Argv template for the external click tool, with `{x}` and `{y}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickConfig {
    pub command: Vec<String>,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            command: ["xdotool", "mousemove", "{x}", "{y}", "click", "1"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub monitor: Region,
    pub trades: Vec<TradeDefinition>,
    pub collect_point: Point,
    pub refresh_point: Point,
    pub color_ranges: Vec<ColorRange>,
    pub templates: HashMap<String, TemplateDescriptor>,
    pub timing: TimingConfig,
    pub capture: CaptureConfig,
    pub clicks: ClickConfig,
}
