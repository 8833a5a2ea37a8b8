// Detection result types
use image::RgbImage;
use serde::Serialize;
use std::sync::Arc;

/// Per-cycle snapshot of one trade region.
///
/// `None` for the template flags means "no template configured", which the
/// decision policy treats differently from an explicit `false`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStatus {
    pub name: String,
    pub red_ratio: f64,
    pub has_red_gem: bool,
    pub start_active: Option<bool>,
    pub start_disabled: Option<bool>,
    pub template_score: Option<f32>,
}

impl RegionStatus {
    /// Status reported for a region that could not be evaluated.
    pub fn neutral(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            red_ratio: 0.0,
            has_red_gem: false,
            start_active: None,
            start_disabled: None,
            template_score: None,
        }
    }
}

/// A status plus the frame it was computed from (absent when capture failed).
#[derive(Debug, Clone)]
pub struct RegionReading {
    pub status: RegionStatus,
    pub frame: Option<Arc<RgbImage>>,
}

impl RegionReading {
    pub fn neutral(name: impl Into<String>) -> Self {
        Self {
            status: RegionStatus::neutral(name),
            frame: None,
        }
    }
}
