//! netpulse live core: keeps the monitored-address list in sync with push
//! batches, the user's status filter and the state handed across reloads.

#![forbid(unsafe_code)]

pub mod config;
pub mod coordinator;
pub mod dashboard;
pub mod notify;
pub mod page;
pub mod runtime;
pub mod timers;

pub use config::LiveConfig;
pub use coordinator::{BatchReport, UpdateCoordinator};
pub use dashboard::{Dashboard, ViewSnapshot};
pub use notify::{Notifier, Toast, ToastId};
pub use page::{Page, PageLayout, SummaryCard, SummarySlot};
pub use runtime::{spawn_live, Command, LiveHandle};
pub use timers::{Task, TimerId, TimerQueue};
