//! JSON configuration loading and validation.

use super::types::{
    AppConfig, CaptureConfig, ClickConfig, ColorRange, Point, Region, TemplateDescriptor,
    TimingConfig, TradeDefinition,
};
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_RED_RATIO_THRESHOLD: f64 = 0.01;
const DEFAULT_TEMPLATE_THRESHOLD: f32 = 0.8;

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "region")]
    monitor: Option<RawRegion>,
    trades: Option<Vec<RawTrade>>,
    collect_button: Option<Point>,
    refresh_button: Option<Point>,
    hsv_ranges: Option<Vec<[[i64; 3]; 2]>>,
    #[serde(default)]
    templates: HashMap<String, RawTemplate>,
    #[serde(default)]
    timing: RawTiming,
    /// Legacy top-level override of `timing.cycle_delay`
    cycle_delay: Option<f64>,
    #[serde(default)]
    capture: RawCommand,
    #[serde(default)]
    clicks: RawCommand,
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    left: i64,
    top: i64,
    width: i64,
    height: i64,
}

#[derive(Debug, Deserialize)]
struct RawTrade {
    name: Option<String>,
    region: Option<RawRegion>,
    start_button: Option<Point>,
    start_template: Option<String>,
    start_gray_template: Option<String>,
    red_ratio_threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawTemplate {
    path: Option<PathBuf>,
    threshold: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawTiming {
    cycle_delay: f64,
    collect_interval: f64,
    refresh_interval: f64,
    post_click_delay: f64,
}

impl Default for RawTiming {
    fn default() -> Self {
        Self {
            cycle_delay: 0.5,
            collect_interval: 300.0,
            refresh_interval: 60.0,
            post_click_delay: 0.15,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawCommand {
    command: Option<Vec<String>>,
}

/// Loads an [`AppConfig`] from a JSON file.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound {
                path: self.path.clone(),
            });
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_config(&text, &self.path)
    }
}

/// Parse the JSON text of the config file at `path`. Relative template paths
/// resolve against the file's directory.
pub fn parse_config(text: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    let raw: RawConfig = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    build_config(raw, base_dir)
}

/// Find the config file: as given, then relative to the working directory,
/// then next to the executable. Falls back to the path as given.
pub fn resolve_config_path(raw: &Path) -> PathBuf {
    let mut candidates = vec![raw.to_path_buf()];
    if raw.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(raw));
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            candidates.push(exe_dir.join(raw));
        }
    }

    candidates
        .into_iter()
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| raw.to_path_buf())
}

fn build_config(raw: RawConfig, base_dir: &Path) -> Result<AppConfig, ConfigError> {
    let monitor = raw
        .monitor
        .ok_or_else(|| ConfigError::invalid("`monitor` section missing"))
        .and_then(|region| to_region(region, "monitor"))?;

    let raw_trades = raw
        .trades
        .ok_or_else(|| ConfigError::invalid("`trades` must be a list"))?;

    let templates = build_templates(raw.templates, base_dir)?;

    let mut trades = Vec::with_capacity(raw_trades.len());
    for entry in raw_trades {
        let name = entry
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("trade_{}", trades.len() + 1));
        let region = entry
            .region
            .ok_or_else(|| ConfigError::invalid(format!("trade {name} region missing")))
            .and_then(|region| to_region(region, &format!("trade {name} region")))?;
        let action_point = entry
            .start_button
            .ok_or_else(|| ConfigError::invalid(format!("trade {name} start_button missing")))?;
        let red_ratio_threshold = entry
            .red_ratio_threshold
            .unwrap_or(DEFAULT_RED_RATIO_THRESHOLD);
        if !(0.0..=1.0).contains(&red_ratio_threshold) {
            return Err(ConfigError::invalid(format!(
                "trade {name} red_ratio_threshold {red_ratio_threshold} outside [0,1]"
            )));
        }
        for template in [&entry.start_template, &entry.start_gray_template]
            .into_iter()
            .flatten()
        {
            if !templates.contains_key(template) {
                return Err(ConfigError::invalid(format!(
                    "trade {name} references undefined template '{template}'"
                )));
            }
        }

        trades.push(TradeDefinition {
            name,
            region,
            action_point,
            active_template: entry.start_template,
            inactive_template: entry.start_gray_template,
            red_ratio_threshold,
        });
    }

    let collect_point = raw
        .collect_button
        .ok_or_else(|| ConfigError::invalid("`collect_button` missing"))?;
    let refresh_point = raw
        .refresh_button
        .ok_or_else(|| ConfigError::invalid("`refresh_button` missing"))?;

    let color_ranges = match raw.hsv_ranges {
        Some(ranges) if !ranges.is_empty() => ranges
            .iter()
            .map(to_color_range)
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(ConfigError::invalid(
                "`hsv_ranges` must contain at least one [lower, upper] pair",
            ));
        }
    };

    let cycle_delay = raw.cycle_delay.unwrap_or(raw.timing.cycle_delay);
    let timing = TimingConfig {
        cycle_period: non_negative_secs(cycle_delay, "cycle_delay")?,
        collect_interval: interval_secs(raw.timing.collect_interval, "collect_interval")?,
        refresh_interval: interval_secs(raw.timing.refresh_interval, "refresh_interval")?,
        settle_delay: non_negative_secs(raw.timing.post_click_delay, "post_click_delay")?,
    };

    let capture = CaptureConfig {
        command: command_or_default(raw.capture.command, CaptureConfig::default().command, "capture")?,
    };
    let clicks = ClickConfig {
        command: command_or_default(raw.clicks.command, ClickConfig::default().command, "clicks")?,
    };

    Ok(AppConfig {
        monitor,
        trades,
        collect_point,
        refresh_point,
        color_ranges,
        templates,
        timing,
        capture,
        clicks,
    })
}

fn build_templates(
    raw: HashMap<String, RawTemplate>,
    base_dir: &Path,
) -> Result<HashMap<String, TemplateDescriptor>, ConfigError> {
    let mut templates = HashMap::with_capacity(raw.len());
    for (name, entry) in raw {
        let rel_path = entry
            .path
            .ok_or_else(|| ConfigError::invalid(format!("template {name} requires a `path`")))?;
        let threshold = entry.threshold.unwrap_or(DEFAULT_TEMPLATE_THRESHOLD);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::invalid(format!(
                "template {name} threshold {threshold} outside [0,1]"
            )));
        }
        let path = if rel_path.is_absolute() {
            rel_path
        } else {
            base_dir.join(rel_path)
        };
        templates.insert(
            name.clone(),
            TemplateDescriptor {
                name,
                path,
                threshold,
            },
        );
    }
    Ok(templates)
}

fn to_region(raw: RawRegion, label: &str) -> Result<Region, ConfigError> {
    let coord = |value: i64, field: &str| {
        i32::try_from(value)
            .map_err(|_| ConfigError::invalid(format!("{label} {field} {value} out of range")))
    };
    let extent = |value: i64, field: &str| match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::invalid(format!(
            "{label} {field} must be positive, got {value}"
        ))),
    };
    Ok(Region::new(
        coord(raw.left, "left")?,
        coord(raw.top, "top")?,
        extent(raw.width, "width")?,
        extent(raw.height, "height")?,
    ))
}

fn to_color_range(pair: &[[i64; 3]; 2]) -> Result<ColorRange, ConfigError> {
    let channel = |value: i64, index: usize| {
        let max = if index == 0 { ColorRange::MAX_HUE } else { u8::MAX };
        match u8::try_from(value) {
            Ok(v) if v <= max => Ok(v),
            _ => Err(ConfigError::invalid(format!(
                "HSV channel {index} value {value} outside 0..={max}"
            ))),
        }
    };
    let triplet = |values: &[i64; 3]| -> Result<[u8; 3], ConfigError> {
        Ok([
            channel(values[0], 0)?,
            channel(values[1], 1)?,
            channel(values[2], 2)?,
        ])
    };
    Ok(ColorRange::new(triplet(&pair[0])?, triplet(&pair[1])?))
}

fn non_negative_secs(secs: f64, field: &str) -> Result<Duration, ConfigError> {
    if !(secs.is_finite() && secs >= 0.0) {
        return Err(ConfigError::invalid(format!(
            "timing {field} must be a non-negative number, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ConfigError::invalid(format!("timing {field} of {secs}s: {e}")))
}

/// Non-positive or non-finite seconds disable the trigger.
fn interval_secs(secs: f64, field: &str) -> Result<Option<Duration>, ConfigError> {
    if secs.is_finite() && secs > 0.0 {
        non_negative_secs(secs, field).map(Some)
    } else {
        Ok(None)
    }
}

fn command_or_default(
    command: Option<Vec<String>>,
    default: Vec<String>,
    section: &str,
) -> Result<Vec<String>, ConfigError> {
    match command {
        None => Ok(default),
        Some(argv) if argv.first().is_some_and(|program| !program.trim().is_empty()) => Ok(argv),
        Some(_) => Err(ConfigError::invalid(format!(
            "`{section}.command` must name a program"
        ))),
    }
}
