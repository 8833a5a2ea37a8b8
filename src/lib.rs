//! Watches trade regions on screen and clicks start, collect and refresh
//! buttons based on red-gem coverage, button templates and interval timers.

pub mod automation;
pub mod capture;
pub mod command;
pub mod config;
pub mod detection;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use automation::{
    AutomationController, AutomationEngine, ClickSink, DecisionLoop, LoopState, StatusBoard,
};
pub use capture::{FrameSource, ScreenGrabber};
pub use config::{AppConfig, ConfigLoader};
pub use detection::{RegionEvaluator, RegionStatus};
pub use error::{AutomationError, AutomationResult};
