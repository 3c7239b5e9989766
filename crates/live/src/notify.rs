#![forbid(unsafe_code)]

use metrics::counter;
use netpulse_core::{Severity, Transition};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ToastId(pub u64);

/// Transient pop-up message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: ToastId,
    pub text: String,
    pub kind: Severity,
    pub created_ms: u64,
    pub duration_ms: u64,
}

/// Rate-limited pop-ups for status transitions. Throttled notices are dropped, never shown late.
#[derive(Debug)]
pub struct Notifier {
    interval_ms: u64,
    toast_ms: u64,
    last_shown_ms: Option<u64>,
    next_id: u64,
    toasts: Vec<Toast>,
}

impl Notifier {
    pub fn new(interval_ms: u64, toast_ms: u64) -> Self {
        Self { interval_ms, toast_ms, last_shown_ms: None, next_id: 0, toasts: Vec::new() }
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn toast_ms(&self) -> u64 {
        self.toast_ms
    }

    /// Returns the toast id when one was shown, so the caller can schedule its dismissal.
    pub fn notify(&mut self, t: &Transition, now_ms: u64) -> Option<ToastId> {
        if let Some(last) = self.last_shown_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                debug!(id = %t.id, since_ms = now_ms.saturating_sub(last), "notify: throttled");
                counter!("notifications_throttled_total", 1u64);
                return None;
            }
        }
        let word = t.new_status.presentation().label.to_lowercase();
        let text = format!("{} is now {}", t.display_name(), word);
        let id = self.show(text, t.new_status.severity(), now_ms);
        self.last_shown_ms = Some(now_ms);
        counter!("notifications_shown_total", 1u64);
        Some(id)
    }

    /// Unthrottled toast (e.g. page-level messages).
    pub fn show(&mut self, text: impl Into<String>, kind: Severity, now_ms: u64) -> ToastId {
        let id = ToastId(self.next_id);
        self.next_id += 1;
        self.toasts.push(Toast { id, text: text.into(), kind, created_ms: now_ms, duration_ms: self.toast_ms });
        id
    }

    /// Idempotent; the close button and the auto-dismiss timer may both fire.
    pub fn dismiss(&mut self, id: ToastId) {
        self.toasts.retain(|t| t.id != id);
    }
}
