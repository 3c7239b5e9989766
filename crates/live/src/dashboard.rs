//! The live dashboard: one page load's worth of synchronized state.
//!
//! A `Dashboard` is built from the page layout, restores whatever the previous
//! load handed over, then takes push events, user commands and timer ticks in
//! whatever order the event loop delivers them. All entry points take the
//! current time (ms since page load) so behaviour is reproducible.

#![forbid(unsafe_code)]

use netpulse_core::{DashboardCounts, PushEvent, Status};
use netpulse_persist::PersistenceBridge;
use netpulse_store::{FilterBanner, FilterEngine, Row, StatusRegistry};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LiveConfig;
use crate::coordinator::{BatchReport, BatchTargets, UpdateCoordinator};
use crate::notify::{Notifier, Toast, ToastId};
use crate::page::{Page, PageLayout, SummaryCard};
use crate::timers::{Task, TimerQueue};

/// Immutable view handed to readers after every step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewSnapshot {
    pub epoch: u64,
    pub filter: Option<Status>,
    pub banner: Option<FilterBanner>,
    pub rows: Vec<Row>,
    pub toasts: Vec<Toast>,
    pub summary: Vec<SummaryCard>,
    pub active_tab: Option<String>,
    pub scroll_top: u64,
    pub updating: bool,
}

impl ViewSnapshot {
    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.visible())
    }
}

pub struct Dashboard {
    registry: StatusRegistry,
    filter: FilterEngine,
    coordinator: UpdateCoordinator,
    notifier: Notifier,
    page: Page,
    timers: TimerQueue,
    bridge: PersistenceBridge,
    restore_delay_ms: u64,
}

impl Dashboard {
    /// Build the page state and consume the one-shot handoff from the previous load.
    /// The tab is restored right away; the filter waits for the first render pass.
    pub fn load(layout: PageLayout, bridge: PersistenceBridge, cfg: &LiveConfig, now_ms: u64) -> Self {
        let page = Page::new(&layout);
        let registry = StatusRegistry::from_seeds(layout.rows);
        let mut me = Self {
            registry,
            filter: FilterEngine::new(layout.banner_anchor),
            coordinator: UpdateCoordinator::new(cfg),
            notifier: Notifier::new(cfg.notify_interval_ms, cfg.toast_ms),
            page,
            timers: TimerQueue::new(),
            bridge,
            restore_delay_ms: cfg.restore_delay_ms,
        };
        if let Some(tab) = me.bridge.restore_tab_once() {
            let ok = me.page.activate_tab(&tab);
            info!(tab = %tab, restored = ok, "load: saved tab handed over");
        }
        if let Some(status) = me.bridge.restore_filter_once() {
            me.timers.schedule(now_ms, me.restore_delay_ms, Task::RestoreFilter(status));
            info!(status = %status, delay_ms = me.restore_delay_ms, "load: saved filter scheduled");
        }
        info!(rows = me.registry.len(), "load: dashboard ready");
        me
    }

    pub fn handle_push(&mut self, ev: PushEvent, now_ms: u64) -> Option<BatchReport> {
        match ev {
            PushEvent::StatusUpdate(update) => {
                let targets = BatchTargets {
                    registry: &mut self.registry,
                    filter: &self.filter,
                    notifier: &mut self.notifier,
                    page: &mut self.page,
                    timers: &mut self.timers,
                };
                Some(self.coordinator.apply_batch(&update, targets, now_ms))
            }
            PushEvent::DashboardUpdate(counts) => {
                self.coordinator.apply_counts(&counts, &mut self.page, &mut self.timers, now_ms);
                None
            }
            PushEvent::Connected => {
                info!("push channel connected");
                None
            }
            PushEvent::Disconnected => {
                info!("push channel disconnected");
                None
            }
        }
    }

    /// User clicked a status card. Dropped while a batch is in flight.
    pub fn apply_filter(&mut self, status: Status) -> bool {
        self.filter.apply(status, &mut self.registry, &self.coordinator)
    }

    /// User clicked "Show all" or the total card. Dropped while a batch is in flight.
    pub fn clear_filter(&mut self) -> bool {
        self.filter.clear(&mut self.registry, &self.coordinator)
    }

    pub fn activate_tab(&mut self, tab: &str) -> bool {
        self.page.activate_tab(tab)
    }

    /// Host-reported scroll offset of the address list.
    pub fn scroll_to(&mut self, top: u64) {
        self.page.scroll_to(top);
    }

    pub fn dismiss_toast(&mut self, id: ToastId) {
        self.notifier.dismiss(id);
    }

    /// Manual refresh: hand the active tab and filter to the next load and mark the
    /// summary cards as loading. The caller performs the actual reload.
    pub fn refresh(&mut self) {
        if let Some(tab) = self.page.active_tab().map(str::to_string) {
            if let Err(e) = self.bridge.save_tab(&tab) {
                warn!(error = %e, "refresh: could not save active tab");
            }
        }
        if let Err(e) = self.bridge.save_filter(self.filter.current()) {
            warn!(error = %e, "refresh: could not save active filter");
        }
        self.page.set_loading(true);
        info!(tab = ?self.page.active_tab(), filter = ?self.filter.current(), "refresh: reload requested");
    }

    /// Run every timer due at `now_ms`. Returns how many fired.
    pub fn tick(&mut self, now_ms: u64) -> usize {
        let mut fired = 0usize;
        while let Some(task) = self.timers.pop_due(now_ms) {
            fired += 1;
            match task {
                Task::EndSuppression { generation } => self.coordinator.end_suppression(generation),
                Task::ClearPulse(h) => self.registry.clear_pulse(h),
                Task::ClearHighlight(slot) => self.page.clear_highlight(slot),
                Task::DismissToast(id) => self.notifier.dismiss(id),
                Task::RestoreFilter(status) => {
                    let applied = self.filter.apply(status, &mut self.registry, &self.coordinator);
                    debug!(status = %status, applied, "load: saved filter applied");
                }
            }
        }
        fired
    }

    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn is_updating(&self) -> bool {
        self.coordinator.is_updating()
    }

    pub fn current_filter(&self) -> Option<Status> {
        self.filter.current()
    }

    pub fn banner(&self) -> Option<&FilterBanner> {
        self.filter.banner()
    }

    /// Per-status tally of the addresses rendered on this page, each counted once.
    pub fn address_counts(&self) -> DashboardCounts {
        self.registry.counts()
    }

    pub fn registry(&self) -> &StatusRegistry {
        &self.registry
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn toasts(&self) -> &[Toast] {
        self.notifier.toasts()
    }

    pub fn snapshot(&self, epoch: u64) -> ViewSnapshot {
        ViewSnapshot {
            epoch,
            filter: self.filter.current(),
            banner: self.filter.banner().cloned(),
            rows: self.registry.rows().to_vec(),
            toasts: self.notifier.toasts().to_vec(),
            summary: self.page.summary().to_vec(),
            active_tab: self.page.active_tab().map(str::to_string),
            scroll_top: self.page.scroll_top(),
            updating: self.coordinator.is_updating(),
        }
    }
}
