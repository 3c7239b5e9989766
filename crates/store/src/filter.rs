//! Status filter: which rows are shown, and the banner announcing it.
//!
//! Visibility is only ever written by [`FilterEngine::recompute`], so it is
//! always a pure function of the active filter and each row's status.

#![forbid(unsafe_code)]

use metrics::counter;
use netpulse_core::Status;
use serde::Serialize;
use tracing::{debug, info};

use crate::registry::StatusRegistry;

/// Advisory lock held by whoever is mutating row statuses.
/// While held, user filter changes are dropped (not queued).
pub trait SuppressionGate {
    fn is_suppressed(&self) -> bool;
}

impl SuppressionGate for bool {
    fn is_suppressed(&self) -> bool {
        *self
    }
}

/// Persistent indicator shown above the address table while a filter is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterBanner {
    pub status: Status,
    pub text: String,
    /// Affordance that clears the filter.
    pub clear_label: &'static str,
}

impl FilterBanner {
    fn for_status(status: Status) -> Self {
        Self {
            status,
            text: format!("Showing only devices with status: {}", status.presentation().label),
            clear_label: "Show all",
        }
    }
}

#[derive(Debug)]
pub struct FilterEngine {
    current: Option<Status>,
    banner: Option<FilterBanner>,
    /// Whether the page has a place to insert the banner.
    anchor_present: bool,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FilterEngine {
    pub fn new(anchor_present: bool) -> Self {
        Self { current: None, banner: None, anchor_present }
    }

    pub fn current(&self) -> Option<Status> {
        self.current
    }

    pub fn banner(&self) -> Option<&FilterBanner> {
        self.banner.as_ref()
    }

    /// User-driven: show only rows whose status equals `status`. Returns false when dropped.
    pub fn apply(&mut self, status: Status, registry: &mut StatusRegistry, gate: &impl SuppressionGate) -> bool {
        if gate.is_suppressed() {
            debug!(status = %status, "filter: apply dropped during live update");
            counter!("filter_clicks_dropped_total", 1u64);
            return false;
        }
        self.banner = None;
        self.current = Some(status);
        self.recompute(registry);
        if self.anchor_present {
            self.banner = Some(FilterBanner::for_status(status));
        } else {
            debug!("filter: no banner anchor on page");
        }
        info!(status = %status, visible = registry.visible_handles().len(), "filter applied");
        true
    }

    /// User-driven: show every row and drop the banner. Returns false when dropped.
    pub fn clear(&mut self, registry: &mut StatusRegistry, gate: &impl SuppressionGate) -> bool {
        if gate.is_suppressed() {
            debug!("filter: clear dropped during live update");
            counter!("filter_clicks_dropped_total", 1u64);
            return false;
        }
        self.current = None;
        self.recompute(registry);
        self.banner = None;
        info!("filter cleared");
        true
    }

    /// Coordinator-driven: recompute visibility for the current filter. Ignores suppression
    /// and leaves the banner alone.
    pub fn reapply(&self, registry: &mut StatusRegistry) {
        self.recompute(registry);
    }

    fn recompute(&self, registry: &mut StatusRegistry) {
        for row in registry.rows_mut() {
            row.visible = match self.current {
                Some(f) => row.status == f,
                None => true,
            };
        }
    }
}
