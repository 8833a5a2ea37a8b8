//! Template loading, caching and normalized cross-correlation matching.

use crate::config::TemplateDescriptor;
use crate::error::TemplateLoadError;
use image::{GrayImage, RgbImage};
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};
use imageproc::template_matching::{MatchTemplateMethod, match_template};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct LoadedTemplate {
    pub descriptor: TemplateDescriptor,
    pub image: GrayImage,
}

/// Result of scoring one template against one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    pub matched: bool,
    /// Best correlation found (0.0-1.0)
    pub score: f32,
    /// The frame was smaller than the template; no scoring happened
    pub skipped: bool,
}

impl TemplateMatch {
    pub const SKIPPED: TemplateMatch = TemplateMatch {
        matched: false,
        score: 0.0,
        skipped: true,
    };
}

struct TemplateSlot {
    descriptor: TemplateDescriptor,
    loaded: OnceCell<Arc<LoadedTemplate>>,
}

/// Matches configured templates against frames.
///
/// Each template is decoded on first use and kept for the lifetime of the
/// matcher. The set of names is fixed at construction, and every slot is
/// initialized at most once, so concurrent lookups never see a partially
/// loaded template. A failed load leaves the slot empty.
pub struct TemplateMatcher {
    slots: HashMap<String, TemplateSlot>,
}

impl TemplateMatcher {
    pub fn new(descriptors: impl IntoIterator<Item = TemplateDescriptor>) -> Self {
        let slots = descriptors
            .into_iter()
            .map(|descriptor| {
                (
                    descriptor.name.clone(),
                    TemplateSlot {
                        descriptor,
                        loaded: OnceCell::new(),
                    },
                )
            })
            .collect();
        Self { slots }
    }

    pub fn from_config(templates: &HashMap<String, TemplateDescriptor>) -> Self {
        Self::new(templates.values().cloned())
    }

    pub fn is_configured(&self) -> bool {
        !self.slots.is_empty()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .is_some_and(|slot| slot.loaded.get().is_some())
    }

    /// Fetch a template, decoding it on first access.
    pub fn load(&self, name: &str) -> Result<Arc<LoadedTemplate>, TemplateLoadError> {
        let slot = self
            .slots
            .get(name)
            .ok_or_else(|| TemplateLoadError::Unknown {
                name: name.to_string(),
            })?;
        slot.loaded
            .get_or_try_init(|| decode_template(&slot.descriptor).map(Arc::new))
            .cloned()
    }

    pub fn preload(&self, name: &str) -> Result<(), TemplateLoadError> {
        self.load(name).map(|_| ())
    }

    /// Load every configured template, failing on the first bad one.
    pub fn preload_all(&self) -> Result<usize, TemplateLoadError> {
        for name in self.slots.keys() {
            self.load(name)?;
        }
        Ok(self.slots.len())
    }

    /// Score `template_name` against `frame`.
    ///
    /// A frame smaller than the template yields [`TemplateMatch::SKIPPED`].
    pub fn match_frame(
        &self,
        frame: &RgbImage,
        template_name: &str,
    ) -> Result<TemplateMatch, TemplateLoadError> {
        let template = self.load(template_name)?;
        let frame_gray = image::imageops::grayscale(frame);

        if frame_gray.width() < template.image.width()
            || frame_gray.height() < template.image.height()
        {
            log::warn!(
                "Frame {}x{} smaller than template '{}' {}x{}; skipping match",
                frame_gray.width(),
                frame_gray.height(),
                template_name,
                template.image.width(),
                template.image.height()
            );
            return Ok(TemplateMatch::SKIPPED);
        }

        let score = best_correlation(&frame_gray, &template.image);
        Ok(TemplateMatch {
            matched: score >= template.descriptor.threshold,
            score,
            skipped: false,
        })
    }
}

fn decode_template(descriptor: &TemplateDescriptor) -> Result<LoadedTemplate, TemplateLoadError> {
    if !descriptor.path.exists() {
        return Err(TemplateLoadError::Missing {
            name: descriptor.name.clone(),
            path: descriptor.path.clone(),
        });
    }
    let image = image::open(&descriptor.path)
        .map_err(|source| TemplateLoadError::Decode {
            name: descriptor.name.clone(),
            path: descriptor.path.clone(),
            source,
        })?
        .to_luma8();
    if image.width() == 0 || image.height() == 0 {
        return Err(TemplateLoadError::Empty {
            name: descriptor.name.clone(),
            path: descriptor.path.clone(),
        });
    }

    log::info!(
        "🧩 Loaded template '{}' ({}x{}, threshold {:.2}) from {:?}",
        descriptor.name,
        image.width(),
        image.height(),
        descriptor.threshold,
        descriptor.path
    );
    Ok(LoadedTemplate {
        descriptor: descriptor.clone(),
        image,
    })
}

/// Maximum zero-mean normalized cross-correlation of `template` over every
/// offset in `frame`, clamped to 0.0-1.0.
///
/// Flat windows have no defined correlation and score 0. A flat template
/// falls back to plain normalized correlation, since the zero-mean form is
/// undefined for it everywhere.
pub fn best_correlation(frame: &GrayImage, template: &GrayImage) -> f32 {
    let (tw, th) = template.dimensions();
    let n = u64::from(tw) * u64::from(th);
    let t_sum: u64 = template.pixels().map(|p| u64::from(p[0])).sum();
    let t_mean = t_sum as f64 / n as f64;
    // Centered weights keep the numerator free of the large mean offset.
    let weights: Vec<f64> = template.pixels().map(|p| f64::from(p[0]) - t_mean).collect();
    let t_var: f64 = weights.iter().map(|w| w * w).sum();

    if t_var <= f64::EPSILON {
        let result = match_template(
            frame,
            template,
            MatchTemplateMethod::CrossCorrelationNormalized,
        );
        return result
            .pixels()
            .map(|pixel| pixel[0])
            .filter(|score| score.is_finite())
            .fold(0.0_f32, f32::max)
            .clamp(0.0, 1.0);
    }

    let sums = integral_image::<_, u64>(frame);
    let squares = integral_squared_image::<_, u64>(frame);
    let (fw, fh) = frame.dimensions();
    let stride = fw as usize;
    let width = tw as usize;
    let pixels = frame.as_raw();

    let mut best = 0.0_f64;
    for y in 0..=fh - th {
        for x in 0..=fw - tw {
            let (right, bottom) = (x + tw - 1, y + th - 1);
            let i_sum = sum_image_pixels(&sums, x, y, right, bottom)[0];
            let i_sq = sum_image_pixels(&squares, x, y, right, bottom)[0];
            let i_var = centered_square_sum(n, i_sum, i_sq);
            if i_var <= f64::EPSILON {
                continue;
            }

            let mut cross = 0.0_f64;
            for (row, row_weights) in weights.chunks_exact(width).enumerate() {
                let at = (y as usize + row) * stride + x as usize;
                cross += pixels[at..at + width]
                    .iter()
                    .zip(row_weights)
                    .map(|(&p, &w)| f64::from(p) * w)
                    .sum::<f64>();
            }

            let score = cross / (i_var * t_var).sqrt();
            if score.is_finite() && score > best {
                best = score;
            }
        }
    }
    best.clamp(0.0, 1.0) as f32
}

/// Sum of squared deviations from the mean, `sq - sum^2 / n`, with the
/// subtraction done exactly in integers.
fn centered_square_sum(n: u64, sum: u64, sq: u64) -> f64 {
    let spread = u128::from(n) * u128::from(sq) - u128::from(sum) * u128::from(sum);
    spread as f64 / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FIXTURE_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn fixture_path(stem: &str) -> PathBuf {
        let n = FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "trade-clicker-{}-{}-{}.png",
            std::process::id(),
            stem,
            n
        ))
    }

    /// Deterministic textured RGB patch.
    fn patch(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 37 + y * 91) % 200 + 30) as u8;
            Rgb([v, v / 2, 255 - v])
        })
    }

    fn write_template(name: &str, image: &RgbImage, threshold: f32) -> TemplateDescriptor {
        let path = fixture_path(name);
        image.save(&path).unwrap();
        TemplateDescriptor {
            name: name.to_string(),
            path,
            threshold,
        }
    }

    #[test]
    fn test_identical_frame_scores_above_threshold() {
        let image = patch(12, 8);
        let matcher = TemplateMatcher::new([write_template("start", &image, 0.9)]);

        let result = matcher.match_frame(&image, "start").unwrap();

        assert!(result.matched);
        assert!(!result.skipped);
        assert!(result.score >= 0.9, "score {}", result.score);
    }

    /// Bright, low-contrast pattern where the window mean dwarfs its spread.
    fn faint(width: u32, height: u32, base: u8, spread: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([base + ((x * 7 + y * 13) % spread) as u8])
        })
    }

    #[test]
    fn test_large_faint_template_matches_itself() {
        let template = faint(400, 200, 245, 5);
        let score = best_correlation(&template, &template);
        assert!(score > 0.9999, "score {score}");

        let template = faint(120, 40, 220, 15);
        let score = best_correlation(&template, &template);
        assert!(score > 0.9999, "score {score}");
    }

    #[test]
    fn test_faint_template_found_inside_larger_frame() {
        let template = faint(60, 30, 240, 9);
        let mut frame = GrayImage::from_pixel(90, 50, Luma([243]));
        image::imageops::replace(&mut frame, &template, 21, 13);

        let score = best_correlation(&frame, &template);

        assert!(score > 0.9999, "score {score}");
    }

    #[test]
    fn test_superset_frame_finds_template() {
        let template = patch(10, 10);
        let mut frame = RgbImage::from_pixel(40, 30, Rgb([20, 20, 20]));
        image::imageops::replace(&mut frame, &template, 17, 9);
        let matcher = TemplateMatcher::new([write_template("gem", &template, 0.85)]);

        let result = matcher.match_frame(&frame, "gem").unwrap();

        assert!(result.matched, "score {}", result.score);
    }

    #[test]
    fn test_smaller_frame_is_skipped() {
        let matcher = TemplateMatcher::new([write_template("big", &patch(20, 20), 0.8)]);

        let narrow = matcher.match_frame(&patch(10, 40), "big").unwrap();
        let short = matcher.match_frame(&patch(40, 10), "big").unwrap();

        assert_eq!(narrow, TemplateMatch::SKIPPED);
        assert_eq!((short.matched, short.score), (false, 0.0));
    }

    #[test]
    fn test_dissimilar_frame_below_threshold() {
        let checker = RgbImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        let matcher = TemplateMatcher::new([write_template("checker", &checker, 0.8)]);
        let flat = RgbImage::from_pixel(16, 16, Rgb([128, 128, 128]));

        let result = matcher.match_frame(&flat, "checker").unwrap();

        assert!(!result.matched);
        assert!(result.score < 0.8, "score {}", result.score);
    }

    #[test]
    fn test_missing_file_is_not_cached() {
        let descriptor = TemplateDescriptor {
            name: "ghost".to_string(),
            path: fixture_path("ghost"),
            threshold: 0.8,
        };
        let path = descriptor.path.clone();
        let matcher = TemplateMatcher::new([descriptor]);

        let err = matcher.match_frame(&patch(4, 4), "ghost").unwrap_err();
        assert!(matches!(err, TemplateLoadError::Missing { .. }));
        assert!(!matcher.is_loaded("ghost"));

        // Once the file shows up the same matcher picks it up.
        patch(4, 4).save(&path).unwrap();
        assert!(matcher.match_frame(&patch(4, 4), "ghost").unwrap().matched);
        assert!(matcher.is_loaded("ghost"));
    }

    #[test]
    fn test_undecodable_file() {
        let path = fixture_path("garbage");
        std::fs::write(&path, b"not an image").unwrap();
        let matcher = TemplateMatcher::new([TemplateDescriptor {
            name: "garbage".to_string(),
            path,
            threshold: 0.8,
        }]);

        assert!(matches!(
            matcher.load("garbage"),
            Err(TemplateLoadError::Decode { .. })
        ));
        assert!(matches!(matcher.preload_all(), Err(TemplateLoadError::Decode { .. })));
    }

    #[test]
    fn test_unknown_template_name() {
        let matcher = TemplateMatcher::new([]);
        assert!(!matcher.is_configured());
        assert!(matches!(
            matcher.match_frame(&patch(4, 4), "nope"),
            Err(TemplateLoadError::Unknown { .. })
        ));
    }

    #[test]
    fn test_cache_returns_same_instance() {
        let matcher = TemplateMatcher::new([write_template("once", &patch(6, 6), 0.8)]);
        matcher.preload("once").unwrap();
        let first = matcher.load("once").unwrap();
        let second = matcher.load("once").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(matcher.preload_all().unwrap(), 1);
    }

    #[test]
    fn test_black_frame_scores_zero() {
        let frame = GrayImage::from_pixel(10, 10, Luma([0]));
        let template = GrayImage::from_fn(4, 4, |x, y| Luma([(x * 40 + y * 20) as u8 + 10]));
        assert_eq!(best_correlation(&frame, &template), 0.0);
    }

    #[test]
    fn test_brightness_shift_still_matches() {
        let template = GrayImage::from_fn(6, 6, |x, y| Luma([(x * 30 + y * 7) as u8 + 20]));
        let brighter = GrayImage::from_fn(6, 6, |x, y| Luma([template.get_pixel(x, y)[0] + 40]));
        assert!(best_correlation(&brighter, &template) > 0.99);
    }

    #[test]
    fn test_flat_template_uses_plain_correlation() {
        let template = GrayImage::from_pixel(3, 3, Luma([200]));
        let frame = GrayImage::from_pixel(8, 8, Luma([200]));
        assert!(best_correlation(&frame, &template) > 0.99);
    }
}
