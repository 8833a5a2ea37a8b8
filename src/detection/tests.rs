use super::*;
use crate::config::{AppConfig, Point, Region, TemplateDescriptor};
use crate::testing::{
    RED, SceneGrabber, template_fixture, textured, trade, two_trade_config,
};
use image::{Rgb, RgbImage};
use std::sync::Arc;

/// Dark top half, light bottom half: the "grayed out" button.
fn grayed_button() -> RgbImage {
    RgbImage::from_fn(20, 16, |_, y| {
        if y < 8 { Rgb([10, 10, 10]) } else { Rgb([240, 240, 240]) }
    })
}

fn with_templates(
    mut config: AppConfig,
    templates: impl IntoIterator<Item = TemplateDescriptor>,
) -> AppConfig {
    for descriptor in templates {
        config.templates.insert(descriptor.name.clone(), descriptor);
    }
    for trade in &mut config.trades {
        trade.active_template = Some("start".to_string());
        trade.inactive_template = Some("start_gray".to_string());
    }
    config
}

fn evaluator(config: &AppConfig, scene: &Arc<SceneGrabber>) -> RegionEvaluator {
    RegionEvaluator::from_config(config, scene.clone())
}

#[tokio::test]
async fn test_red_coverage_per_region() {
    let scene = Arc::new(SceneGrabber::new());
    scene.paint(Region::new(0, 0, 100, 50), RED);
    let config = two_trade_config();

    let readings = evaluator(&config, &scene).evaluate_all(&config.trades).await;

    assert_eq!(readings.len(), 2);
    let alpha = &readings[0].status;
    let beta = &readings[1].status;
    assert_eq!(alpha.name, "alpha");
    assert!((alpha.red_ratio - 0.5).abs() < 1e-9, "ratio {}", alpha.red_ratio);
    assert!(alpha.has_red_gem);
    assert_eq!(beta.name, "beta");
    assert_eq!(beta.red_ratio, 0.0);
    assert!(!beta.has_red_gem);
    assert!(readings.iter().all(|r| r.frame.is_some()));
}

#[tokio::test]
async fn test_threshold_is_inclusive() {
    let scene = Arc::new(SceneGrabber::new());
    // 5 of 100 rows red = exactly 0.05
    scene.paint(Region::new(0, 0, 100, 5), RED);
    let config = two_trade_config();

    let reading = evaluator(&config, &scene).evaluate(&config.trades[0]).await;

    assert!(reading.status.has_red_gem, "ratio {}", reading.status.red_ratio);
}

#[tokio::test]
async fn test_without_templates_flags_stay_unset() {
    let scene = Arc::new(SceneGrabber::new());
    let config = two_trade_config();

    let reading = evaluator(&config, &scene).evaluate(&config.trades[0]).await;

    assert_eq!(reading.status.start_active, None);
    assert_eq!(reading.status.start_disabled, None);
    assert_eq!(reading.status.template_score, None);
}

#[tokio::test]
async fn test_active_button_visible() {
    let scene = Arc::new(SceneGrabber::new());
    let active = textured(20, 16, 1);
    scene.blit(&active, 30, 40);
    let config = with_templates(
        two_trade_config(),
        [
            template_fixture("start", &active, 0.9),
            template_fixture("start_gray", &grayed_button(), 0.9),
        ],
    );

    let reading = evaluator(&config, &scene).evaluate(&config.trades[0]).await;

    let status = reading.status;
    assert_eq!(status.start_active, Some(true));
    assert_eq!(status.start_disabled, Some(false));
    let score = status.template_score.unwrap();
    assert!(score >= 0.9, "score {score}");
}

#[tokio::test]
async fn test_grayed_button_visible() {
    let scene = Arc::new(SceneGrabber::new());
    scene.blit(&grayed_button(), 140, 20);
    let config = with_templates(
        two_trade_config(),
        [
            template_fixture("start", &textured(20, 16, 1), 0.9),
            template_fixture("start_gray", &grayed_button(), 0.9),
        ],
    );

    let reading = evaluator(&config, &scene).evaluate(&config.trades[1]).await;

    let status = reading.status;
    assert_eq!(status.start_active, Some(false));
    assert_eq!(status.start_disabled, Some(true));
    assert!(status.template_score.unwrap() >= 0.9);
}

#[tokio::test]
async fn test_region_smaller_than_template_is_not_active() {
    let scene = Arc::new(SceneGrabber::new());
    let mut config = with_templates(
        two_trade_config(),
        [
            template_fixture("start", &textured(20, 16, 1), 0.9),
            template_fixture("start_gray", &grayed_button(), 0.9),
        ],
    );
    config.trades[0].region = Region::new(0, 0, 10, 10);

    let reading = evaluator(&config, &scene).evaluate(&config.trades[0]).await;

    assert_eq!(reading.status.start_active, Some(false));
    assert_eq!(reading.status.start_disabled, Some(false));
    assert_eq!(reading.status.template_score, Some(0.0));
}

#[tokio::test]
async fn test_capture_failure_gives_neutral_status() {
    let scene = Arc::new(SceneGrabber::new());
    scene.paint(Region::new(0, 0, 100, 100), RED);
    scene.break_area(Region::new(0, 0, 100, 100));
    let config = two_trade_config();
    let evaluator = evaluator(&config, &scene);

    let readings = evaluator.evaluate_all(&config.trades).await;

    assert_eq!(readings[0].status, RegionStatus::neutral("alpha".to_string()));
    assert!(readings[0].frame.is_none());
    // the other region is still evaluated
    assert!(readings[1].frame.is_some());
    assert!(evaluator.try_evaluate(&config.trades[0]).await.is_err());
}

#[tokio::test]
async fn test_missing_template_file_gives_neutral_status() {
    let scene = Arc::new(SceneGrabber::new());
    let mut config = two_trade_config();
    config.templates.insert(
        "start".to_string(),
        TemplateDescriptor {
            name: "start".to_string(),
            path: std::env::temp_dir().join("trade-clicker-no-such-template.png"),
            threshold: 0.8,
        },
    );
    config.trades[0].active_template = Some("start".to_string());

    let reading = evaluator(&config, &scene).evaluate(&config.trades[0]).await;

    assert_eq!(reading.status.start_active, None);
    assert!(reading.frame.is_none());
}

#[tokio::test]
async fn test_region_past_monitor_edge_is_clamped() {
    let scene = Arc::new(SceneGrabber::new());
    scene.paint(Region::new(350, 150, 50, 50), RED);
    let mut config = two_trade_config();
    config.trades = vec![trade(
        "edge",
        Region::new(350, 150, 100, 100),
        Point::new(360, 160),
    )];

    let reading = evaluator(&config, &scene).evaluate(&config.trades[0]).await;

    let frame = reading.frame.unwrap();
    assert_eq!(frame.dimensions(), (50, 50));
    assert_eq!(reading.status.red_ratio, 1.0);
    assert_eq!(*frame.get_pixel(0, 0), RED);
}

#[test]
fn test_best_evidence_score() {
    assert_eq!(best_evidence_score(None, None), None);
    assert_eq!(best_evidence_score(Some(0.4), None), Some(0.4));
    assert_eq!(best_evidence_score(None, Some(0.7)), Some(0.7));
    assert_eq!(best_evidence_score(Some(0.3), Some(0.9)), Some(0.9));
    assert_eq!(best_evidence_score(Some(0.95), Some(0.1)), Some(0.95));
}
