// Shared fakes for unit tests
use crate::automation::ClickSink;
use crate::capture::ScreenGrabber;
use crate::capture::grabber::fit_to_area;
use crate::config::{
    AppConfig, CaptureConfig, ClickConfig, ColorRange, Point, Region, TemplateDescriptor,
    TimingConfig, TradeDefinition,
};
use crate::error::{CaptureError, InjectionError};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const RED: Rgb<u8> = Rgb([230, 20, 20]);
pub const GRAY: Rgb<u8> = Rgb([90, 90, 90]);

pub const MONITOR: Region = Region {
    left: 0,
    top: 0,
    width: 400,
    height: 200,
};

/// Serves crops of an in-memory "screen" that tests can repaint between cycles.
pub struct SceneGrabber {
    scene: Mutex<RgbImage>,
    broken: Mutex<Vec<Region>>,
    pub grabs: AtomicUsize,
}

impl SceneGrabber {
    pub fn new() -> Self {
        Self {
            scene: Mutex::new(RgbImage::from_pixel(MONITOR.width, MONITOR.height, GRAY)),
            broken: Mutex::new(Vec::new()),
            grabs: AtomicUsize::new(0),
        }
    }

    pub fn paint(&self, region: Region, color: Rgb<u8>) {
        let mut scene = self.scene.lock();
        for y in region.top..region.top + region.height as i32 {
            for x in region.left..region.left + region.width as i32 {
                scene.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    pub fn blit(&self, image: &RgbImage, left: i64, top: i64) {
        image::imageops::replace(&mut *self.scene.lock(), image, left, top);
    }

    pub fn break_area(&self, region: Region) {
        self.broken.lock().push(region);
    }
}

#[async_trait]
impl ScreenGrabber for SceneGrabber {
    async fn grab(&self, area: Region) -> Result<RgbImage, CaptureError> {
        self.grabs.fetch_add(1, Ordering::SeqCst);
        if self.broken.lock().contains(&area) {
            return Err(CaptureError::Empty {
                command: "scene".to_string(),
            });
        }
        let scene = self.scene.lock().clone();
        fit_to_area(scene, area)
    }
}

#[derive(Default)]
pub struct RecordingClickSink {
    pub clicks: Mutex<Vec<Point>>,
    pub fail: AtomicBool,
}

impl RecordingClickSink {
    pub fn clicks(&self) -> Vec<Point> {
        self.clicks.lock().clone()
    }
}

#[async_trait]
impl ClickSink for RecordingClickSink {
    async fn click(&self, point: Point) -> Result<(), InjectionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(InjectionError::Rejected {
                x: point.x,
                y: point.y,
                reason: "device unplugged".to_string(),
            });
        }
        self.clicks.lock().push(point);
        Ok(())
    }
}

pub const COLLECT: Point = Point { x: 350, y: 190 };
pub const REFRESH: Point = Point { x: 380, y: 190 };

pub fn red_ranges() -> Vec<ColorRange> {
    vec![
        ColorRange::new([0, 120, 70], [10, 255, 255]),
        ColorRange::new([170, 120, 70], [179, 255, 255]),
    ]
}

pub fn trade(name: &str, region: Region, action: Point) -> TradeDefinition {
    TradeDefinition {
        name: name.to_string(),
        region,
        action_point: action,
        active_template: None,
        inactive_template: None,
        red_ratio_threshold: 0.05,
    }
}

/// Two side-by-side trades, collect and refresh effectively never due.
pub fn two_trade_config() -> AppConfig {
    AppConfig {
        monitor: MONITOR,
        trades: vec![
            trade("alpha", Region::new(0, 0, 100, 100), Point::new(50, 50)),
            trade("beta", Region::new(100, 0, 100, 100), Point::new(150, 50)),
        ],
        collect_point: COLLECT,
        refresh_point: REFRESH,
        color_ranges: red_ranges(),
        templates: HashMap::new(),
        timing: TimingConfig {
            cycle_period: Duration::from_millis(100),
            collect_interval: None,
            refresh_interval: None,
            settle_delay: Duration::ZERO,
        },
        capture: CaptureConfig::default(),
        clicks: ClickConfig::default(),
    }
}

static FIXTURE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Save `image` as a PNG fixture in the temp dir and describe it as a template.
pub fn template_fixture(name: &str, image: &RgbImage, threshold: f32) -> TemplateDescriptor {
    let n = FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path: PathBuf = std::env::temp_dir().join(format!(
        "trade-clicker-fixture-{}-{}-{}.png",
        std::process::id(),
        name,
        n
    ));
    image.save(&path).unwrap();
    TemplateDescriptor {
        name: name.to_string(),
        path,
        threshold,
    }
}

/// Textured blue patch (never inside the red ranges) so normalized
/// correlation has something to lock onto.
pub fn textured(width: u32, height: u32, seed: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 37 + y * 91 + seed * 53) % 200 + 30) as u8;
        Rgb([v / 3, v / 2, v])
    })
}
