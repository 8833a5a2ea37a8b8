//! Worker lifecycle around a [`DecisionLoop`].

use super::click::{ClickSink, CommandClickSink};
use super::decision::DecisionLoop;
use super::status::StatusBoard;
use super::types::LoopState;
use crate::capture::{CommandGrabber, FrameSource, ScreenGrabber};
use crate::config::{AppConfig, TimingConfig};
use crate::detection::{ColorMaskAnalyzer, RegionEvaluator, RegionStatus, TemplateMatcher};
use crate::error::{CaptureError, TemplateLoadError};
use image::RgbImage;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};

/// How often a paused worker re-checks its flags.
pub const PAUSE_POLL: Duration = Duration::from_millis(100);
/// Upper bound on how long `stop` waits for the in-flight cycle.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// Cooperative flags shared between the engine and one worker run.
#[derive(Debug, Default)]
pub struct LoopControl {
    stop: AtomicBool,
    paused: AtomicBool,
}

impl LoopControl {
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// Owns the decision loop and runs it on a tokio task.
///
/// The idle loop is parked between runs so its timers survive stop/start.
/// Each run gets a fresh [`LoopControl`]; a worker that outlived its stop
/// timeout keeps its own, already-stopped flags.
pub struct AutomationEngine {
    config: Arc<AppConfig>,
    frames: FrameSource,
    templates: Arc<TemplateMatcher>,
    sink: Arc<dyn ClickSink>,
    board: Arc<StatusBoard>,
    control: Arc<LoopControl>,
    parked: Option<DecisionLoop>,
    worker: Option<JoinHandle<DecisionLoop>>,
}

impl AutomationEngine {
    pub fn new(
        config: Arc<AppConfig>,
        grabber: Arc<dyn ScreenGrabber>,
        sink: Arc<dyn ClickSink>,
    ) -> Self {
        let frames = FrameSource::new(config.monitor, grabber);
        let templates = Arc::new(TemplateMatcher::from_config(&config.templates));
        let mut engine = Self {
            config,
            frames,
            templates,
            sink,
            board: Arc::new(StatusBoard::new()),
            control: Arc::new(LoopControl::default()),
            parked: None,
            worker: None,
        };
        engine.parked = Some(engine.build_loop());
        engine
    }

    /// Engine using the command-driven capture and click backends.
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let grabber = Arc::new(CommandGrabber::new(&config.capture));
        let sink = Arc::new(CommandClickSink::new(&config.clicks));
        Self::new(config, grabber, sink)
    }

    fn build_loop(&self) -> DecisionLoop {
        let evaluator = RegionEvaluator::new(
            self.frames.clone(),
            ColorMaskAnalyzer::new(self.config.color_ranges.clone()),
            self.templates.clone(),
        );
        DecisionLoop::new(
            self.config.clone(),
            evaluator,
            self.sink.clone(),
            self.board.clone(),
        )
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    /// Decode every configured template now rather than on first match.
    pub fn preload_templates(&self) -> Result<usize, TemplateLoadError> {
        self.templates.preload_all()
    }

    /// Stopped -> Running. No-op while a worker is already running.
    pub async fn start(&mut self) {
        if self.is_running() {
            log::debug!("Automation already running");
            return;
        }

        if let Some(handle) = self.worker.take() {
            if handle.is_finished() {
                match handle.await {
                    Ok(decision) => self.parked = Some(decision),
                    Err(e) => log::error!("Automation worker failed: {e}"),
                }
            } else {
                log::warn!("Previous automation worker still winding down; detaching it");
            }
        }

        let decision = match self.parked.take() {
            Some(decision) => decision,
            None => self.build_loop(),
        };
        let control = Arc::new(LoopControl::default());
        self.control = control.clone();
        self.board.clear_error();
        self.worker = Some(tokio::spawn(run_worker(decision, control)));
        log::info!(
            "🚀 Automation loop started ({} trades, cycle {:?})",
            self.config.trades.len(),
            self.config.timing.effective_cycle_period()
        );
    }

    /// Stop the worker and wait up to [`STOP_TIMEOUT`] for its cycle to end.
    /// Safe to call repeatedly.
    pub async fn stop(&mut self) {
        self.control.request_stop();
        let Some(mut handle) = self.worker.take() else {
            return;
        };
        match timeout(STOP_TIMEOUT, &mut handle).await {
            Ok(Ok(decision)) => self.parked = Some(decision),
            Ok(Err(e)) => log::error!("Automation worker failed: {e}"),
            Err(_) => log::warn!(
                "Automation worker did not stop within {:?}; detaching it",
                STOP_TIMEOUT
            ),
        }
        log::info!("⏹️ Automation loop stopped");
    }

    pub fn pause(&self) {
        self.control.set_paused(true);
        log::info!("⏸️ Automation paused");
    }

    pub fn resume(&self) {
        self.control.set_paused(false);
        log::info!("▶️ Automation resumed");
    }

    /// Returns the new paused state.
    pub fn toggle_pause(&self) -> bool {
        if self.is_paused() {
            self.resume();
            false
        } else {
            self.pause();
            true
        }
    }

    pub fn is_running(&self) -> bool {
        !self.control.stop_requested()
            && self.worker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    pub fn state(&self) -> LoopState {
        if !self.is_running() {
            LoopState::Stopped
        } else if self.is_paused() {
            LoopState::Paused
        } else {
            LoopState::Running
        }
    }

    pub fn board(&self) -> Arc<StatusBoard> {
        self.board.clone()
    }

    pub fn statuses(&self) -> Vec<RegionStatus> {
        self.board.statuses()
    }

    pub fn last_frames(&self) -> HashMap<String, Arc<RgbImage>> {
        self.board.frames()
    }

    /// Failure that stopped the worker on its own, if any.
    pub fn last_error(&self) -> Option<String> {
        self.board.last_error()
    }

    pub async fn capture_monitor(&self) -> Result<RgbImage, CaptureError> {
        self.frames.capture_monitor().await
    }
}

async fn run_worker(mut decision: DecisionLoop, control: Arc<LoopControl>) -> DecisionLoop {
    let period = decision.cycle_period();
    while !control.stop_requested() {
        if control.is_paused() {
            sleep(PAUSE_POLL).await;
            continue;
        }

        let started = Instant::now();
        match decision.run_cycle().await {
            Ok(report) => log::debug!(
                "Cycle done: {} clicks (trades {:?}, collect {}, refresh {})",
                report.click_count(),
                report.trade_clicks,
                report.collected,
                report.refresh.is_some()
            ),
            Err(e) => {
                log::error!("❌ Click failed, stopping automation: {e}");
                decision.board().record_error(e.to_string());
                control.request_stop();
                break;
            }
        }

        let remaining = period.saturating_sub(started.elapsed());
        sleep(remaining.max(TimingConfig::MIN_CYCLE_SLEEP)).await;
    }
    log::debug!("Automation worker exited");
    decision
}
