//! Per-region evaluation: capture, color coverage and template evidence.

use super::color_mask::ColorMaskAnalyzer;
use super::template::TemplateMatcher;
use super::types::{RegionReading, RegionStatus};
use crate::capture::{FrameSource, ScreenGrabber};
use crate::config::{AppConfig, TradeDefinition};
use crate::error::EvaluationError;
use std::sync::Arc;

/// The reported template score is the best evidence of *either* button state
/// (active or grayed), not a combined confidence.
pub fn best_evidence_score(active: Option<f32>, disabled: Option<f32>) -> Option<f32> {
    match (active, disabled) {
        (None, None) => None,
        (active, disabled) => Some(active.unwrap_or(0.0).max(disabled.unwrap_or(0.0))),
    }
}

pub struct RegionEvaluator {
    frames: FrameSource,
    colors: ColorMaskAnalyzer,
    templates: Arc<TemplateMatcher>,
}

impl RegionEvaluator {
    pub fn new(
        frames: FrameSource,
        colors: ColorMaskAnalyzer,
        templates: Arc<TemplateMatcher>,
    ) -> Self {
        Self {
            frames,
            colors,
            templates,
        }
    }

    pub fn from_config(config: &AppConfig, grabber: Arc<dyn ScreenGrabber>) -> Self {
        Self::new(
            FrameSource::new(config.monitor, grabber),
            ColorMaskAnalyzer::new(config.color_ranges.clone()),
            Arc::new(TemplateMatcher::from_config(&config.templates)),
        )
    }

    /// Evaluate one trade, surfacing capture and template failures.
    pub async fn try_evaluate(
        &self,
        trade: &TradeDefinition,
    ) -> Result<RegionReading, EvaluationError> {
        let frame = self.frames.capture(trade.region).await?;
        let red_ratio = self.colors.ratio(&frame);
        let has_red_gem = red_ratio >= trade.red_ratio_threshold;

        let mut start_active = None;
        let mut active_score = None;
        if let Some(name) = &trade.active_template {
            let result = self.templates.match_frame(&frame, name)?;
            start_active = Some(result.matched);
            active_score = Some(result.score);
        }

        let mut start_disabled = None;
        let mut disabled_score = None;
        if let Some(name) = &trade.inactive_template {
            let result = self.templates.match_frame(&frame, name)?;
            start_disabled = Some(result.matched);
            disabled_score = Some(result.score);
        }

        let status = RegionStatus {
            name: trade.name.clone(),
            red_ratio,
            has_red_gem,
            start_active,
            start_disabled,
            template_score: best_evidence_score(active_score, disabled_score),
        };
        log::debug!(
            "🔍 {}: ratio={:.4} red={} active={:?} disabled={:?} score={:?}",
            status.name,
            status.red_ratio,
            status.has_red_gem,
            status.start_active,
            status.start_disabled,
            status.template_score
        );

        Ok(RegionReading {
            status,
            frame: Some(Arc::new(frame)),
        })
    }

    /// Evaluate one trade; any failure becomes a neutral reading so a single
    /// broken region never aborts the cycle.
    pub async fn evaluate(&self, trade: &TradeDefinition) -> RegionReading {
        match self.try_evaluate(trade).await {
            Ok(reading) => reading,
            Err(e) => {
                log::error!("Failed to evaluate trade {}: {}", trade.name, e);
                RegionReading::neutral(trade.name.clone())
            }
        }
    }

    /// Readings in the same order as `trades`.
    pub async fn evaluate_all(&self, trades: &[TradeDefinition]) -> Vec<RegionReading> {
        let mut readings = Vec::with_capacity(trades.len());
        for trade in trades {
            readings.push(self.evaluate(trade).await);
        }
        readings
    }
}
