//! Status registry: what each rendered row currently shows.
//!
//! Rows are seeded once when the page is built and never added or removed
//! afterwards. The same address can appear in several tables, so the index maps
//! an address id to every row handle rendering it.

#![forbid(unsafe_code)]

use chrono::NaiveDateTime;
use netpulse_core::push::render_timestamp;
use netpulse_core::{AddressId, DashboardCounts, Presentation, Status};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

/// Stable handle of one rendered row (its position in the registry).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowHandle(pub u32);

pub type Handles = SmallVec<[RowHandle; 2]>;

/// What the surrounding page hands over for each status-bearing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowSeed {
    pub id: AddressId,
    #[serde(default)]
    pub ip_address: String,
    /// Table or tab the row is rendered in.
    #[serde(default)]
    pub table: String,
    #[serde(default = "unknown_status")]
    pub status: Status,
    #[serde(default)]
    pub last_seen: Option<String>,
}

fn unknown_status() -> Status {
    Status::Unknown
}

#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub handle: RowHandle,
    pub id: AddressId,
    pub ip_address: String,
    pub table: String,
    pub status: Status,
    pub badge: Presentation,
    pub last_seen: Option<String>,
    /// One-shot "changed" animation; cleared by a scheduled task.
    pub pulsing: bool,
    pub(crate) visible: bool,
}

impl Row {
    pub fn visible(&self) -> bool {
        self.visible
    }
}

#[derive(Debug, Default)]
pub struct StatusRegistry {
    rows: Vec<Row>,
    index: FxHashMap<AddressId, Handles>,
}

impl StatusRegistry {
    pub fn from_seeds(seeds: impl IntoIterator<Item = RowSeed>) -> Self {
        let mut reg = Self::default();
        for seed in seeds {
            let handle = RowHandle(reg.rows.len() as u32);
            reg.index.entry(seed.id.clone()).or_default().push(handle);
            reg.rows.push(Row {
                handle,
                id: seed.id,
                ip_address: seed.ip_address,
                table: seed.table,
                status: seed.status,
                badge: seed.status.presentation(),
                last_seen: seed.last_seen,
                pulsing: false,
                visible: true,
            });
        }
        reg
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get(&self, handle: RowHandle) -> Option<&Row> {
        self.rows.get(handle.0 as usize)
    }

    /// Update badge, status and timestamp of every row rendering `id` and start its pulse.
    /// Returns the touched handles; an id with no rendered rows touches nothing.
    pub fn set_status(&mut self, id: &AddressId, status: Status, timestamp: Option<NaiveDateTime>) -> Handles {
        let Some(handles) = self.index.get(id).cloned() else {
            debug!(id = %id, "registry: no rendered row for address");
            return Handles::new();
        };
        let rendered_ts = timestamp.map(render_timestamp);
        for h in &handles {
            if let Some(row) = self.rows.get_mut(h.0 as usize) {
                row.status = status;
                row.badge = status.presentation();
                if let Some(ts) = &rendered_ts {
                    row.last_seen = Some(ts.clone());
                }
                row.pulsing = true;
            }
        }
        handles
    }

    /// Idempotent: clearing an already-cleared pulse is fine.
    pub fn clear_pulse(&mut self, handle: RowHandle) {
        if let Some(row) = self.rows.get_mut(handle.0 as usize) {
            row.pulsing = false;
        }
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn visible_handles(&self) -> Vec<RowHandle> {
        self.rows.iter().filter(|r| r.visible).map(|r| r.handle).collect()
    }

    /// Counts over distinct addresses (duplicated rows count once).
    pub fn counts(&self) -> DashboardCounts {
        let mut c = DashboardCounts {
            total: Some(self.index.len() as u64),
            up: Some(0),
            down: Some(0),
            error: Some(0),
            unknown: Some(0),
        };
        for handles in self.index.values() {
            let Some(row) = handles.first().and_then(|h| self.get(*h)) else { continue };
            let slot = match row.status {
                Status::Up => &mut c.up,
                Status::Down => &mut c.down,
                Status::Error => &mut c.error,
                Status::Unknown => &mut c.unknown,
            };
            *slot = slot.map(|n| n + 1);
        }
        c
    }
}
