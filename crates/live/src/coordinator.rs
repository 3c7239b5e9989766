#![forbid(unsafe_code)]

use std::time::Instant;

use metrics::{counter, histogram};
use netpulse_core::{DashboardCounts, StatusUpdate};
use netpulse_store::{FilterEngine, StatusRegistry, SuppressionGate};
use tracing::{debug, info};

use crate::config::LiveConfig;
use crate::notify::Notifier;
use crate::page::Page;
use crate::timers::{Task, TimerQueue};

/// Everything a batch mutates, borrowed from the dashboard for the duration of one batch.
pub struct BatchTargets<'a> {
    pub registry: &'a mut StatusRegistry,
    pub filter: &'a FilterEngine,
    pub notifier: &'a mut Notifier,
    pub page: &'a mut Page,
    pub timers: &'a mut TimerQueue,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub events: usize,
    pub rows_touched: usize,
    pub notified: usize,
}

/// Applies push batches to the registry while holding off user filter changes.
#[derive(Debug)]
pub struct UpdateCoordinator {
    suppressed: bool,
    generation: u64,
    grace_ms: u64,
    pulse_ms: u64,
    highlight_ms: u64,
}

impl SuppressionGate for UpdateCoordinator {
    fn is_suppressed(&self) -> bool {
        self.suppressed
    }
}

impl UpdateCoordinator {
    pub fn new(cfg: &LiveConfig) -> Self {
        Self {
            suppressed: false,
            generation: 0,
            grace_ms: cfg.grace_ms,
            pulse_ms: cfg.pulse_ms,
            highlight_ms: cfg.highlight_ms,
        }
    }

    pub fn is_updating(&self) -> bool {
        self.suppressed
    }

    /// Apply one `status_update` message. Events go in arrival order; the filter is
    /// reapplied once per batch. Suppression stays on until the grace timer fires.
    pub fn apply_batch(&mut self, update: &StatusUpdate, t: BatchTargets<'_>, now_ms: u64) -> BatchReport {
        if !update.is_status_changes() {
            debug!(kind = %update.kind, "coordinator: ignoring status_update of unknown type");
            return BatchReport::default();
        }
        let started = Instant::now();
        self.suppressed = true;
        self.generation += 1;
        let scroll = t.page.scroll_top();

        let mut report = BatchReport { events: update.data.len(), ..Default::default() };
        for change in &update.data {
            let touched = t.registry.set_status(&change.id, change.new_status, change.parsed_timestamp());
            for h in &touched {
                t.timers.schedule(now_ms, self.pulse_ms, Task::ClearPulse(*h));
            }
            report.rows_touched += touched.len();
            if let Some(id) = t.notifier.notify(change, now_ms) {
                t.timers.schedule(now_ms, t.notifier.toast_ms(), Task::DismissToast(id));
                report.notified += 1;
            }
        }
        t.filter.reapply(t.registry);

        t.page.scroll_to(scroll);
        t.timers.schedule(now_ms, self.grace_ms, Task::EndSuppression { generation: self.generation });

        counter!("live_batches_total", 1u64);
        counter!("live_events_total", report.events as u64);
        histogram!("live_batch_apply_ms", started.elapsed().as_secs_f64() * 1000.0);
        info!(
            events = report.events,
            rows = report.rows_touched,
            notified = report.notified,
            generation = self.generation,
            "live: status batch applied"
        );
        report
    }

    /// Grace timer callback. A timer left over from an earlier batch does not cut
    /// a later batch's grace window short.
    pub fn end_suppression(&mut self, generation: u64) {
        if generation == self.generation {
            self.suppressed = false;
        }
    }

    /// Apply a `dashboard_update`: replace summary texts and briefly highlight them.
    pub fn apply_counts(&self, counts: &DashboardCounts, page: &mut Page, timers: &mut TimerQueue, now_ms: u64) {
        let written = page.apply_counts(counts);
        for slot in &written {
            timers.schedule(now_ms, self.highlight_ms, Task::ClearHighlight(*slot));
        }
        debug!(slots = written.len(), "live: summary counts refreshed");
    }
}
