//! Single-task event loop around a [`Dashboard`].
//!
//! Push events and user commands arrive on one channel, so they are handled
//! strictly in receipt order; a ticker fires due timers between them. After
//! each step that changed anything, a fresh [`ViewSnapshot`] is swapped in and
//! the epoch is bumped for subscribers.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use netpulse_core::{PushEvent, Status};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::LiveConfig;
use crate::dashboard::{Dashboard, ViewSnapshot};
use crate::notify::ToastId;

#[derive(Debug, Clone)]
pub enum Command {
    Push(PushEvent),
    ApplyFilter(Status),
    ClearFilter,
    ActivateTab(String),
    DismissToast(ToastId),
    Scroll(u64),
    /// Save the handoff state and stop; the page is about to reload.
    Refresh,
}

/// Handle for feeding the loop and reading its current view.
#[derive(Clone)]
pub struct LiveHandle {
    tx: mpsc::Sender<Command>,
    snap: Arc<ArcSwap<ViewSnapshot>>,
    epoch_rx: watch::Receiver<u64>,
}

impl LiveHandle {
    pub async fn send(&self, cmd: Command) -> bool {
        self.tx.send(cmd).await.is_ok()
    }

    pub fn current(&self) -> Arc<ViewSnapshot> {
        self.snap.load_full()
    }

    pub fn subscribe_epoch(&self) -> watch::Receiver<u64> {
        self.epoch_rx.clone()
    }
}

/// Spawn the loop. The join handle yields the dashboard back once every sender
/// is dropped or a refresh was requested.
pub fn spawn_live(mut dashboard: Dashboard, cfg: &LiveConfig) -> (LiveHandle, JoinHandle<Dashboard>) {
    let (tx, mut rx) = mpsc::channel::<Command>(cfg.channel_cap);
    let snap = Arc::new(ArcSwap::from_pointee(dashboard.snapshot(0)));
    let (epoch_tx, epoch_rx) = watch::channel(0u64);
    let snap_clone = Arc::clone(&snap);
    let tick = Duration::from_millis(cfg.tick_ms.max(1));

    let task = tokio::spawn(async move {
        let started = Instant::now();
        let now_ms = || started.elapsed().as_millis() as u64;
        let mut epoch = 0u64;
        let mut publish = |d: &Dashboard| {
            epoch += 1;
            snap_clone.store(Arc::new(d.snapshot(epoch)));
            let _ = epoch_tx.send(epoch);
        };
        let mut ticker = tokio::time::interval(tick);
        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    let Some(cmd) = maybe else {
                        debug!("command channel closed; stopping live loop");
                        break;
                    };
                    let now = now_ms();
                    // timers that came due before this command run first
                    dashboard.tick(now);
                    let stop = matches!(cmd, Command::Refresh);
                    handle(&mut dashboard, cmd, now);
                    publish(&dashboard);
                    if stop {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if dashboard.tick(now_ms()) > 0 {
                        publish(&dashboard);
                    }
                }
            }
        }
        info!("live loop stopped");
        dashboard
    });

    (LiveHandle { tx, snap, epoch_rx }, task)
}

fn handle(d: &mut Dashboard, cmd: Command, now_ms: u64) {
    match cmd {
        Command::Push(ev) => {
            d.handle_push(ev, now_ms);
        }
        Command::ApplyFilter(status) => {
            d.apply_filter(status);
        }
        Command::ClearFilter => {
            d.clear_filter();
        }
        Command::ActivateTab(tab) => {
            d.activate_tab(&tab);
        }
        Command::DismissToast(id) => d.dismiss_toast(id),
        Command::Scroll(top) => d.scroll_to(top),
        Command::Refresh => d.refresh(),
    }
}
