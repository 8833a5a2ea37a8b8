//! Decision loop, trigger policy and the engine that runs them.
//!
//! `DecisionLoop` performs one evaluate-decide-act cycle. `AutomationEngine`
//! runs cycles on a tokio task with cooperative pause/stop flags, and
//! `AutomationController` rebuilds the engine whenever the config is reloaded.

pub mod click;
pub mod controller;
pub mod decision;
pub mod engine;
pub mod policy;
pub mod status;
pub mod types;


pub use click::{ClickSink, CommandClickSink};
pub use controller::AutomationController;
pub use decision::DecisionLoop;
pub use engine::{AutomationEngine, LoopControl, PAUSE_POLL, STOP_TIMEOUT};
pub use policy::{RefreshReasons, interval_elapsed, refresh_decision, start_is_clickable};
pub use status::StatusBoard;
pub use types::{CycleReport, LoopState, TimerSnapshot, TimerState};
