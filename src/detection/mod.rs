//! Detection module for trade regions
//!
//! Color-mask coverage, cached template matching, and the per-region
//! evaluator that folds both into a `RegionStatus` snapshot.

pub mod color_mask;
pub mod evaluator;
pub mod template;
pub mod types;

#[cfg(test)]
mod tests;

pub use color_mask::{ColorMaskAnalyzer, has_threshold, mask_ratio, rgb_to_hsv};
pub use evaluator::{RegionEvaluator, best_evidence_score};
pub use template::{LoadedTemplate, TemplateMatch, TemplateMatcher, best_correlation};
pub use types::{RegionReading, RegionStatus};
