// Types for the decision loop and engine
use super::policy::RefreshReasons;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    Stopped,
    Running,
    Paused,
}

/// Last collect/refresh click instants, owned by one `DecisionLoop`.
///
/// `None` means the trigger has never fired; a never-fired timer is due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerState {
    pub last_collect: Option<Instant>,
    pub last_refresh: Option<Instant>,
}

impl TimerState {
    pub fn snapshot(&self, now: Instant) -> TimerSnapshot {
        TimerSnapshot {
            since_collect: self.last_collect.map(|t| now.saturating_duration_since(t)),
            since_refresh: self.last_refresh.map(|t| now.saturating_duration_since(t)),
        }
    }
}

/// Display-only view of [`TimerState`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub since_collect: Option<Duration>,
    pub since_refresh: Option<Duration>,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Names of trades whose start button was clicked, in click order
    pub trade_clicks: Vec<String>,
    pub collected: bool,
    /// Set when the refresh button was clicked
    pub refresh: Option<RefreshReasons>,
}

impl CycleReport {
    pub fn clicked_trade(&self) -> bool {
        !self.trade_clicks.is_empty()
    }

    pub fn click_count(&self) -> usize {
        self.trade_clicks.len() + self.collected as usize + self.refresh.is_some() as usize
    }
}
