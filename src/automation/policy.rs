//! Trigger policy for the decision loop.
//!
//! Pure functions over region statuses and timers, so the rules can be tested
//! without a running loop.

use crate::detection::RegionStatus;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// "Assume active when unset": a trade with red gems is clicked unless its
/// active template explicitly says the start button is not there.
pub fn start_is_clickable(status: &RegionStatus) -> bool {
    status.has_red_gem && status.start_active.unwrap_or(true)
}

/// Whether `interval` has passed since `last`. A disabled interval is never
/// due; a timer that never fired always is.
pub fn interval_elapsed(interval: Option<Duration>, last: Option<Instant>, now: Instant) -> bool {
    match (interval, last) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
    }
}

/// Conditions that make a refresh click eligible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReasons {
    /// No trade shows red gems
    pub no_red: bool,
    /// Every trade reporting a disabled flag reports it set (and one does)
    pub all_disabled: bool,
    pub refresh_due: bool,
}

impl RefreshReasons {
    pub fn evaluate(statuses: &[RegionStatus], refresh_due: bool) -> Self {
        let no_red = !statuses.iter().any(|s| s.has_red_gem);
        let mut reported = statuses.iter().filter_map(|s| s.start_disabled).peekable();
        let all_disabled = reported.peek().is_some() && reported.all(|disabled| disabled);
        Self {
            no_red,
            all_disabled,
            refresh_due,
        }
    }

    pub fn any(&self) -> bool {
        self.no_red || self.all_disabled || self.refresh_due
    }
}

impl fmt::Display for RefreshReasons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no_red={}, all_disabled={}, refresh_due={}",
            self.no_red, self.all_disabled, self.refresh_due
        )
    }
}

/// Refresh fires only when no trade click happened this cycle and at least
/// one reason holds. No-red counts even when an active template reports the
/// trade as still active.
pub fn refresh_decision(
    statuses: &[RegionStatus],
    refresh_due: bool,
    trade_clicked: bool,
) -> Option<RefreshReasons> {
    if trade_clicked {
        return None;
    }
    let reasons = RefreshReasons::evaluate(statuses, refresh_due);
    reasons.any().then_some(reasons)
}
