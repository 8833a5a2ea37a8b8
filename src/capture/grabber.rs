use crate::command::CommandTemplate;
use crate::config::{CaptureConfig, Region};
use crate::error::CaptureError;
use async_trait::async_trait;
use image::RgbImage;

/// Raw pixel transport from the OS.
///
/// Implementations return exactly the requested area as 3-channel RGB. The
/// area handed in has already been clamped to the monitor.
#[async_trait]
pub trait ScreenGrabber: Send + Sync {
    async fn grab(&self, area: Region) -> Result<RgbImage, CaptureError>;
}

/// Captures by running an external screenshot tool that writes an encoded
/// image to stdout.
pub struct CommandGrabber {
    template: CommandTemplate,
}

impl CommandGrabber {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            template: CommandTemplate::new(config.command.clone()),
        }
    }
}

#[async_trait]
impl ScreenGrabber for CommandGrabber {
    async fn grab(&self, area: Region) -> Result<RgbImage, CaptureError> {
        let vars = [
            ("left", area.left.to_string()),
            ("top", area.top.to_string()),
            ("width", area.width.to_string()),
            ("height", area.height.to_string()),
        ];
        let command = self.template.program().to_string();
        let output = self
            .template
            .run(&vars)
            .await
            .map_err(|source| CaptureError::Unavailable {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(CaptureError::CommandFailed {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(CaptureError::Empty { command });
        }

        let frame = image::load_from_memory(&output.stdout)?.to_rgb8();
        log::trace!(
            "📸 {} returned {}x{} for area {}x{}",
            command,
            frame.width(),
            frame.height(),
            area.width,
            area.height
        );
        fit_to_area(frame, area)
    }
}

/// Accept a frame of exactly the area size; treat anything larger as a
/// full-screen grab and crop the area out of it.
pub(crate) fn fit_to_area(frame: RgbImage, area: Region) -> Result<RgbImage, CaptureError> {
    if frame.width() == area.width && frame.height() == area.height {
        return Ok(frame);
    }

    let outside = || CaptureError::OutsideFrame {
        width: frame.width(),
        height: frame.height(),
        left: area.left,
        top: area.top,
        area_width: area.width,
        area_height: area.height,
    };
    let left = u32::try_from(area.left).map_err(|_| outside())?;
    let top = u32::try_from(area.top).map_err(|_| outside())?;
    if left as u64 + area.width as u64 > frame.width() as u64
        || top as u64 + area.height as u64 > frame.height() as u64
    {
        return Err(outside());
    }

    Ok(image::imageops::crop_imm(&frame, left, top, area.width, area.height).to_image())
}
