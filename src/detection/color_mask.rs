//! HSV color-mask coverage.

use crate::config::ColorRange;
use image::RgbImage;

/// Measures how much of an image falls inside a union of HSV ranges.
#[derive(Debug, Clone)]
pub struct ColorMaskAnalyzer {
    ranges: Vec<ColorRange>,
}

impl ColorMaskAnalyzer {
    pub fn new(ranges: Vec<ColorRange>) -> Self {
        Self { ranges }
    }

    pub fn ratio(&self, image: &RgbImage) -> f64 {
        mask_ratio(image, &self.ranges)
    }

    pub fn has_threshold(&self, image: &RgbImage, threshold: f64) -> bool {
        has_threshold(image, &self.ranges, threshold)
    }
}

/// Fraction of pixels matching at least one range (0.0 for an empty image).
///
/// A pixel inside several ranges counts once.
pub fn mask_ratio(image: &RgbImage, ranges: &[ColorRange]) -> f64 {
    let total = image.width() as u64 * image.height() as u64;
    if total == 0 {
        return 0.0;
    }

    let matched = image
        .pixels()
        .filter(|pixel| {
            let hsv = rgb_to_hsv(pixel.0);
            ranges.iter().any(|range| range.contains(hsv))
        })
        .count();

    matched as f64 / total as f64
}

pub fn has_threshold(image: &RgbImage, ranges: &[ColorRange], threshold: f64) -> bool {
    mask_ratio(image, ranges) >= threshold
}

/// RGB to 8-bit HSV: hue halved into 0-179, saturation and value in 0-255.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let value = r.max(g).max(b);
    let delta = value - r.min(g).min(b);

    let saturation = if value > 0.0 {
        255.0 * delta / value
    } else {
        0.0
    };

    let mut hue = if delta == 0.0 {
        0.0
    } else if value == r {
        60.0 * (g - b) / delta
    } else if value == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    [
        ((hue / 2.0).round() as u16 % 180) as u8,
        saturation.round() as u8,
        value as u8,
    ]
}
