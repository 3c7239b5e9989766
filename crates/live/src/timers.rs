//! Deferred work on the page's single event loop.
//!
//! Every suspension point (grace window, deferred filter restore, pulse,
//! highlight and toast dismissal) is a [`Task`] in a min-heap keyed by due time.
//! Handlers are idempotent, so a task firing after its target is already gone
//! does nothing. Each scheduled task gets a [`TimerId`] for future cancellation.

#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use netpulse_core::Status;
use netpulse_store::RowHandle;

use crate::notify::ToastId;
use crate::page::SummarySlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Lift batch suppression; only the latest batch generation may do so.
    EndSuppression { generation: u64 },
    ClearPulse(RowHandle),
    ClearHighlight(SummarySlot),
    DismissToast(ToastId),
    /// Filter restored from the previous load, applied after the first render pass.
    RestoreFilter(Status),
}

#[derive(Debug)]
struct Scheduled {
    due_ms: u64,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest deadline first, then scheduling order
        (other.due_ms, other.seq).cmp(&(self.due_ms, self.seq))
    }
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Scheduled>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: Task) -> TimerId {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Scheduled { due_ms: now_ms.saturating_add(delay_ms), seq, task });
        TimerId(seq)
    }

    /// Pop the next task due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Task> {
        if self.heap.peek()?.due_ms > now_ms {
            return None;
        }
        self.heap.pop().map(|s| s.task)
    }

    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|s| s.due_ms)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
