//! One evaluate-decide-act pass over all trades.

use super::click::ClickSink;
use super::policy::{RefreshReasons, interval_elapsed, refresh_decision, start_is_clickable};
use super::status::StatusBoard;
use super::types::{CycleReport, TimerState};
use crate::config::{AppConfig, Point};
use crate::detection::{RegionEvaluator, RegionStatus};
use crate::error::InjectionError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Periodic controller state: configuration, evaluator, click sink and the
/// collect/refresh timers.
///
/// Timers belong to this instance only, so independent loops never share
/// them. The configuration is fixed for the lifetime of the loop.
pub struct DecisionLoop {
    config: Arc<AppConfig>,
    evaluator: RegionEvaluator,
    sink: Arc<dyn ClickSink>,
    board: Arc<StatusBoard>,
    timers: TimerState,
}

impl DecisionLoop {
    pub fn new(
        config: Arc<AppConfig>,
        evaluator: RegionEvaluator,
        sink: Arc<dyn ClickSink>,
        board: Arc<StatusBoard>,
    ) -> Self {
        Self {
            config,
            evaluator,
            sink,
            board,
            timers: TimerState::default(),
        }
    }

    pub fn with_timers(mut self, timers: TimerState) -> Self {
        self.timers = timers;
        self
    }

    pub fn board(&self) -> &Arc<StatusBoard> {
        &self.board
    }

    pub fn timers(&self) -> TimerState {
        self.timers
    }

    pub fn cycle_period(&self) -> Duration {
        self.config.timing.effective_cycle_period()
    }

    /// Evaluate every trade, publish the statuses, then run the trade,
    /// collect and refresh triggers in that order.
    ///
    /// A click failure aborts the cycle and is returned to the caller.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, InjectionError> {
        let readings = self.evaluator.evaluate_all(&self.config.trades).await;
        self.board.publish(&readings);
        let statuses: Vec<RegionStatus> = readings.into_iter().map(|r| r.status).collect();

        let mut report = CycleReport::default();
        self.handle_trades(&statuses, &mut report).await?;
        report.collected = self.handle_collect().await?;
        report.refresh = self.handle_refresh(&statuses, report.clicked_trade()).await?;

        self.board.set_timers(self.timers.snapshot(Instant::now()));
        Ok(report)
    }

    async fn handle_trades(
        &self,
        statuses: &[RegionStatus],
        report: &mut CycleReport,
    ) -> Result<(), InjectionError> {
        for (trade, status) in self.config.trades.iter().zip(statuses) {
            if !status.has_red_gem {
                continue;
            }
            if start_is_clickable(status) {
                log::info!(
                    "💎 Red gem detected for {} (ratio {:.3}) -> clicking start",
                    trade.name,
                    status.red_ratio
                );
                self.click(trade.action_point).await?;
                report.trade_clicks.push(trade.name.clone());
            } else {
                log::debug!("Red gem detected but start button inactive for {}", trade.name);
            }
        }
        Ok(())
    }

    async fn handle_collect(&mut self) -> Result<bool, InjectionError> {
        let now = Instant::now();
        if !interval_elapsed(self.config.timing.collect_interval, self.timers.last_collect, now) {
            return Ok(false);
        }
        log::info!("📦 Collect interval reached -> clicking collect button");
        self.click(self.config.collect_point).await?;
        self.timers.last_collect = Some(now);
        Ok(true)
    }

    async fn handle_refresh(
        &mut self,
        statuses: &[RegionStatus],
        trade_clicked: bool,
    ) -> Result<Option<RefreshReasons>, InjectionError> {
        let now = Instant::now();
        let refresh_due =
            interval_elapsed(self.config.timing.refresh_interval, self.timers.last_refresh, now);
        let Some(reasons) = refresh_decision(statuses, refresh_due, trade_clicked) else {
            return Ok(None);
        };
        log::info!("🔄 Triggering refresh ({reasons})");
        self.click(self.config.refresh_point).await?;
        self.timers.last_refresh = Some(now);
        Ok(Some(reasons))
    }

    /// Click, then wait the settle delay.
    async fn click(&self, point: Point) -> Result<(), InjectionError> {
        self.sink.click(point).await?;
        let settle = self.config.timing.settle_delay;
        if !settle.is_zero() {
            sleep(settle).await;
        }
        Ok(())
    }
}
