//! One-shot handoff of the active filter and tab across a full page reload.
//!
//! Each key is written right before a reload and read exactly once on the next
//! load. Reading always deletes the key, whether or not the value turned out to
//! be usable, so a snapshot never outlives the load that consumed it.

#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use metrics::counter;
use netpulse_core::Status;
use tracing::{debug, warn};

use crate::KvStore;

pub const FILTER_KEY: &str = "activeFilter";
pub const TAB_KEY: &str = "activeTab";

#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn KvStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Remember the active filter for the next load. No filter clears any stale value.
    pub fn save_filter(&self, filter: Option<Status>) -> Result<()> {
        match filter {
            Some(status) => self.store.set(FILTER_KEY, status.as_str())?,
            None => self.store.remove(FILTER_KEY)?,
        }
        counter!("persist_save_total", 1u64);
        Ok(())
    }

    pub fn save_tab(&self, tab: &str) -> Result<()> {
        if tab.is_empty() {
            return Ok(());
        }
        self.store.set(TAB_KEY, tab)?;
        counter!("persist_save_total", 1u64);
        Ok(())
    }

    /// Only the four canonical status strings restore a filter; anything else means "no filter".
    pub fn restore_filter_once(&self) -> Option<Status> {
        let raw = self.take(FILTER_KEY)?;
        let status = Status::parse(&raw);
        if status.is_none() {
            debug!(value = %raw, "persist: ignoring unrecognized saved filter");
        }
        status
    }

    pub fn restore_tab_once(&self) -> Option<String> {
        self.take(TAB_KEY).filter(|t| !t.is_empty())
    }

    fn take(&self, key: &str) -> Option<String> {
        let value = match self.store.get(key) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "persist: read failed");
                None
            }
        };
        if let Err(e) = self.store.remove(key) {
            warn!(key, error = %e, "persist: delete failed");
        }
        if value.is_some() {
            counter!("persist_restore_total", 1u64);
        }
        value
    }
}
