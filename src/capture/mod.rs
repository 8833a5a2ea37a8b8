// Capture module
// Screen pixel acquisition: a pluggable grabber plus monitor clamping.

pub mod frame_source;
pub mod grabber;

pub use frame_source::FrameSource;
pub use grabber::{CommandGrabber, ScreenGrabber};
