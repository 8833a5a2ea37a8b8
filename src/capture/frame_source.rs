use super::grabber::ScreenGrabber;
use crate::config::Region;
use crate::error::CaptureError;
use image::RgbImage;
use std::sync::Arc;

/// Captures regions of one configured monitor.
#[derive(Clone)]
pub struct FrameSource {
    monitor: Region,
    grabber: Arc<dyn ScreenGrabber>,
}

impl FrameSource {
    pub fn new(monitor: Region, grabber: Arc<dyn ScreenGrabber>) -> Self {
        Self { monitor, grabber }
    }

    pub fn monitor(&self) -> Region {
        self.monitor
    }

    /// Capture `region` after clamping it to the monitor.
    ///
    /// Out-of-bounds input degrades to a smaller (at least 1x1) capture rather
    /// than an error. Backend failures are returned as-is; retry policy belongs
    /// to the caller.
    pub async fn capture(&self, region: Region) -> Result<RgbImage, CaptureError> {
        let bounded = region.clamp_to(&self.monitor);
        if bounded != region {
            log::debug!("Capture region {:?} clamped to {:?}", region, bounded);
        }
        self.grabber.grab(bounded).await
    }

    /// Capture the whole configured monitor.
    pub async fn capture_monitor(&self) -> Result<RgbImage, CaptureError> {
        self.grabber.grab(self.monitor).await
    }
}
