// Read-only status export for observers
use super::types::TimerSnapshot;
use crate::detection::{RegionReading, RegionStatus};
use image::RgbImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct BoardState {
    statuses: Vec<RegionStatus>,
    frames: HashMap<String, Arc<RgbImage>>,
    timers: TimerSnapshot,
    last_error: Option<String>,
    cycles: u64,
}

/// Latest results published by the decision loop.
///
/// Every accessor returns a copy taken under a short lock; nothing is held
/// across capture or click calls.
#[derive(Default)]
pub struct StatusBoard {
    state: Mutex<BoardState>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the statuses and frames with one cycle's readings. Regions
    /// whose capture failed have no frame until they recover.
    pub fn publish(&self, readings: &[RegionReading]) {
        let statuses = readings.iter().map(|r| r.status.clone()).collect();
        let frames = readings
            .iter()
            .filter_map(|r| r.frame.clone().map(|f| (r.status.name.clone(), f)))
            .collect();
        let mut state = self.state.lock();
        state.statuses = statuses;
        state.frames = frames;
        state.cycles += 1;
    }

    pub fn statuses(&self) -> Vec<RegionStatus> {
        self.state.lock().statuses.clone()
    }

    pub fn frames(&self) -> HashMap<String, Arc<RgbImage>> {
        self.state.lock().frames.clone()
    }

    pub fn frame(&self, name: &str) -> Option<Arc<RgbImage>> {
        self.state.lock().frames.get(name).cloned()
    }

    pub fn set_timers(&self, timers: TimerSnapshot) {
        self.state.lock().timers = timers;
    }

    pub fn timers(&self) -> TimerSnapshot {
        self.state.lock().timers
    }

    pub fn record_error(&self, message: impl Into<String>) {
        self.state.lock().last_error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.state.lock().last_error = None;
    }

    /// Failure that stopped the last run, if any.
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Number of cycles published so far.
    pub fn cycles(&self) -> u64 {
        self.state.lock().cycles
    }
}
