//! Headless model of the dashboard page elements the live core touches:
//! navigation tabs, summary cards and the scroll position.
//!
//! Elements are optional. A layout without an "error" card simply never shows
//! error counts; updates aimed at it are skipped.

#![forbid(unsafe_code)]

use netpulse_core::DashboardCounts;
use netpulse_store::RowSeed;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySlot {
    Total,
    Up,
    Down,
    Error,
    Unknown,
}

impl SummarySlot {
    pub const ALL: [SummarySlot; 5] =
        [SummarySlot::Total, SummarySlot::Up, SummarySlot::Down, SummarySlot::Error, SummarySlot::Unknown];

    pub fn pick(self, counts: &DashboardCounts) -> Option<u64> {
        match self {
            SummarySlot::Total => counts.total,
            SummarySlot::Up => counts.up,
            SummarySlot::Down => counts.down,
            SummarySlot::Error => counts.error,
            SummarySlot::Unknown => counts.unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryCard {
    pub slot: SummarySlot,
    pub text: String,
    pub highlighted: bool,
    /// Set while a manual refresh is reloading the page.
    pub loading: bool,
}

/// What the surrounding page renders before the live core takes over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    #[serde(default)]
    pub tabs: Vec<String>,
    #[serde(default)]
    pub active_tab: Option<String>,
    #[serde(default = "all_slots")]
    pub summary_slots: Vec<SummarySlot>,
    #[serde(default = "yes")]
    pub banner_anchor: bool,
    #[serde(default)]
    pub rows: Vec<RowSeed>,
}

fn all_slots() -> Vec<SummarySlot> {
    SummarySlot::ALL.to_vec()
}

fn yes() -> bool {
    true
}

impl Default for PageLayout {
    fn default() -> Self {
        Self { tabs: Vec::new(), active_tab: None, summary_slots: all_slots(), banner_anchor: true, rows: Vec::new() }
    }
}

#[derive(Debug, Default)]
pub struct Page {
    tabs: Vec<String>,
    active_tab: Option<String>,
    summary: Vec<SummaryCard>,
    scroll_top: u64,
}

impl Page {
    pub fn new(layout: &PageLayout) -> Self {
        let summary = layout
            .summary_slots
            .iter()
            .map(|&slot| SummaryCard { slot, text: String::new(), highlighted: false, loading: false })
            .collect();
        Self { tabs: layout.tabs.clone(), active_tab: layout.active_tab.clone(), summary, scroll_top: 0 }
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    /// Activates `tab` if the page renders it; unknown tabs leave the current one active.
    pub fn activate_tab(&mut self, tab: &str) -> bool {
        if !self.tabs.iter().any(|t| t == tab) {
            debug!(tab, "page: no such tab");
            return false;
        }
        self.active_tab = Some(tab.to_string());
        true
    }

    pub fn summary(&self) -> &[SummaryCard] {
        &self.summary
    }

    /// Replace the text of every present slot that `counts` carries. Returns the slots written.
    pub fn apply_counts(&mut self, counts: &DashboardCounts) -> Vec<SummarySlot> {
        let mut written = Vec::new();
        for card in self.summary.iter_mut() {
            if let Some(n) = card.slot.pick(counts) {
                card.text = n.to_string();
                card.highlighted = true;
                written.push(card.slot);
            }
        }
        written
    }

    pub fn clear_highlight(&mut self, slot: SummarySlot) {
        if let Some(card) = self.summary.iter_mut().find(|c| c.slot == slot) {
            card.highlighted = false;
        }
    }

    pub fn set_loading(&mut self, on: bool) {
        for card in self.summary.iter_mut() {
            card.loading = on;
        }
    }

    pub fn scroll_top(&self) -> u64 {
        self.scroll_top
    }

    pub fn scroll_to(&mut self, top: u64) {
        self.scroll_top = top;
    }
}
