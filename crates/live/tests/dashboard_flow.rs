#![forbid(unsafe_code)]

use std::sync::Arc;

use netpulse_core::{DashboardCounts, PushEvent, Status, StatusUpdate, Transition};
use netpulse_live::{Dashboard, LiveConfig, PageLayout, SummarySlot};
use netpulse_persist::{KvStore, MemoryKv, PersistenceBridge, FILTER_KEY, TAB_KEY};
use netpulse_store::RowSeed;

fn seed(id: &str, table: &str, status: Status) -> RowSeed {
    RowSeed { id: id.into(), ip_address: format!("10.1.0.{id}"), table: table.into(), status, last_seen: None }
}

fn layout() -> PageLayout {
    PageLayout {
        tabs: vec!["all-tab".into(), "servers-tab".into()],
        active_tab: Some("all-tab".into()),
        rows: vec![
            seed("1", "all", Status::Up),
            seed("3", "all", Status::Down),
            seed("5", "all", Status::Error),
            seed("7", "all", Status::Up),
            seed("7", "servers", Status::Up),
            seed("8", "servers", Status::Down),
        ],
        ..Default::default()
    }
}

fn load(kv: Arc<MemoryKv>, now: u64) -> Dashboard {
    Dashboard::load(layout(), PersistenceBridge::new(kv), &LiveConfig::default(), now)
}

fn batch(changes: Vec<Transition>) -> PushEvent {
    PushEvent::StatusUpdate(StatusUpdate::changes(changes))
}

fn visible(d: &Dashboard) -> Vec<(String, String)> {
    d.registry().rows().iter().filter(|r| r.visible()).map(|r| (r.table.clone(), r.id.to_string())).collect()
}

#[test]
fn down_transition_hides_row_under_up_filter() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    assert!(d.apply_filter(Status::Up));

    let report = d
        .handle_push(batch(vec![Transition::new("7", Status::Down).with_ip("10.1.0.7").at("2024-03-01T12:00:00")]), 1_000)
        .unwrap();
    d.handle_push(
        PushEvent::DashboardUpdate(DashboardCounts {
            total: Some(5),
            up: Some(1),
            down: Some(3),
            error: Some(1),
            unknown: Some(0),
        }),
        1_000,
    );

    assert_eq!(report.events, 1);
    assert_eq!(report.rows_touched, 2);
    assert_eq!(visible(&d), vec![("all".to_string(), "1".to_string())]);
    assert!(d.toasts().len() <= 1);
    assert_eq!(d.toasts()[0].text, "10.1.0.7 is now offline");
    let down = d.page().summary().iter().find(|c| c.slot == SummarySlot::Down).unwrap();
    assert_eq!(down.text, "3");
    assert!(down.highlighted);
    assert_eq!(d.current_filter(), Some(Status::Up));
}

#[test]
fn click_during_batch_window_is_dropped_not_queued() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    d.apply_filter(Status::Up);
    d.handle_push(batch(vec![Transition::new("3", Status::Up)]), 1_000);
    assert!(d.is_updating());

    assert!(!d.apply_filter(Status::Error));
    assert!(!d.clear_filter());
    d.tick(1_099);
    assert!(!d.apply_filter(Status::Error));
    assert_eq!(d.current_filter(), Some(Status::Up));

    d.tick(1_100);
    assert!(!d.is_updating());
    // nothing was deferred: the filter is still what it was before the clicks
    assert_eq!(d.current_filter(), Some(Status::Up));
    assert!(d.apply_filter(Status::Error));
    assert_eq!(d.current_filter(), Some(Status::Error));
}

#[test]
fn any_click_sequence_inside_the_window_leaves_filter_unchanged() {
    let clicks: Vec<Option<Status>> = vec![None, Some(Status::Up), Some(Status::Down), Some(Status::Error), Some(Status::Unknown)];
    for initial in [None, Some(Status::Down)] {
        for a in &clicks {
            for b in &clicks {
                let mut d = load(Arc::new(MemoryKv::new()), 0);
                if let Some(s) = initial {
                    d.apply_filter(s);
                }
                d.handle_push(batch(vec![Transition::new("1", Status::Down)]), 10);
                for click in [a, b] {
                    match click {
                        Some(s) => d.apply_filter(*s),
                        None => d.clear_filter(),
                    };
                }
                assert_eq!(d.current_filter(), initial);
            }
        }
    }
}

#[test]
fn later_batch_keeps_its_own_grace_window() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    d.handle_push(batch(vec![Transition::new("1", Status::Down)]), 0);
    d.handle_push(batch(vec![Transition::new("1", Status::Up)]), 50);
    d.tick(100);
    assert!(d.is_updating());
    d.tick(150);
    assert!(!d.is_updating());
}

#[test]
fn notifications_are_throttled_across_batches() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    let r = d
        .handle_push(batch(vec![Transition::new("1", Status::Down), Transition::new("5", Status::Up)]), 0)
        .unwrap();
    assert_eq!(r.notified, 1);
    d.handle_push(batch(vec![Transition::new("3", Status::Up)]), 4_999);
    assert_eq!(d.toasts().len(), 1);
    d.handle_push(batch(vec![Transition::new("8", Status::Up)]), 5_000);
    let texts: Vec<&str> = d.toasts().iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["10.1.0.1 is now offline", "10.1.0.8 is now online"]);
}

#[test]
fn transient_state_clears_on_schedule() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    d.handle_push(batch(vec![Transition::new("7", Status::Down)]), 0);
    d.handle_push(PushEvent::DashboardUpdate(DashboardCounts { up: Some(1), ..Default::default() }), 0);
    assert!(d.registry().rows().iter().filter(|r| r.id.as_str() == "7").all(|r| r.pulsing));

    d.tick(500);
    assert!(d.registry().rows().iter().all(|r| !r.pulsing));
    assert!(d.page().summary().iter().all(|c| !c.highlighted));
    assert_eq!(d.toasts().len(), 1);

    d.tick(3_000);
    assert!(d.toasts().is_empty());
    assert_eq!(d.next_timer_due(), None);
}

#[test]
fn manual_toast_close_then_timer_is_harmless() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    d.handle_push(batch(vec![Transition::new("7", Status::Down)]), 0);
    let id = d.toasts()[0].id;
    d.dismiss_toast(id);
    assert!(d.toasts().is_empty());
    d.tick(3_000);
    assert!(d.toasts().is_empty());
}

#[test]
fn non_status_change_messages_are_ignored() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    let ev = PushEvent::StatusUpdate(StatusUpdate { kind: "heartbeat".into(), data: vec![Transition::new("1", Status::Down)] });
    let report = d.handle_push(ev, 0).unwrap();
    assert_eq!(report.events, 0);
    assert!(!d.is_updating());
    assert_eq!(d.registry().rows()[0].status, Status::Up);
}

#[test]
fn refresh_hands_filter_and_tab_to_next_load() {
    let kv = Arc::new(MemoryKv::new());
    let mut first = load(kv.clone(), 0);
    first.activate_tab("servers-tab");
    first.apply_filter(Status::Down);
    first.refresh();
    assert!(first.page().summary().iter().all(|c| c.loading));
    assert_eq!(kv.get(FILTER_KEY).unwrap().as_deref(), Some("down"));

    let mut second = load(kv.clone(), 0);
    assert_eq!(second.page().active_tab(), Some("servers-tab"));
    assert_eq!(kv.get(TAB_KEY).unwrap(), None);
    assert_eq!(kv.get(FILTER_KEY).unwrap(), None);
    // filter waits for the first render pass
    assert_eq!(second.current_filter(), None);
    second.tick(100);
    assert_eq!(second.current_filter(), Some(Status::Down));
    assert_eq!(
        visible(&second),
        vec![("all".to_string(), "3".to_string()), ("servers".to_string(), "8".to_string())]
    );
    assert_eq!(second.banner().map(|b| b.status), Some(Status::Down));

    // a third load starts clean
    let third = load(kv, 0);
    assert_eq!(third.page().active_tab(), Some("all-tab"));
    assert_eq!(third.next_timer_due(), None);
}

#[test]
fn stale_or_bogus_handoff_is_discarded() {
    let kv = Arc::new(MemoryKv::new());
    kv.set(FILTER_KEY, "Offline").unwrap();
    kv.set(TAB_KEY, "removed-tab").unwrap();
    let d = load(kv.clone(), 0);
    assert_eq!(d.page().active_tab(), Some("all-tab"));
    assert_eq!(d.next_timer_due(), None);
    assert_eq!(kv.get(FILTER_KEY).unwrap(), None);
    assert_eq!(kv.get(TAB_KEY).unwrap(), None);
}

#[test]
fn restored_filter_landing_mid_batch_is_dropped() {
    let kv = Arc::new(MemoryKv::new());
    PersistenceBridge::new(kv.clone()).save_filter(Some(Status::Error)).unwrap();
    let mut d = load(kv, 0);
    d.handle_push(batch(vec![Transition::new("1", Status::Down)]), 60);
    d.tick(100);
    assert_eq!(d.current_filter(), None);
    assert_eq!(visible(&d).len(), 6);
}

#[test]
fn reapply_after_batch_is_stable() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    d.apply_filter(Status::Down);
    d.handle_push(batch(vec![Transition::new("1", Status::Down)]), 0);
    let first = visible(&d);
    d.handle_push(batch(vec![]), 10);
    assert_eq!(first, visible(&d));
}

#[test]
fn scroll_offset_survives_a_batch_that_hides_rows() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    d.apply_filter(Status::Up);
    d.scroll_to(480);
    d.handle_push(batch(vec![Transition::new("1", Status::Down), Transition::new("7", Status::Down)]), 1_000);
    assert!(visible(&d).is_empty());
    assert_eq!(d.page().scroll_top(), 480);
    assert_eq!(d.snapshot(1).scroll_top, 480);

    d.scroll_to(0);
    d.handle_push(batch(vec![Transition::new("7", Status::Up)]), 2_000);
    assert_eq!(d.page().scroll_top(), 0);
}

#[test]
fn address_counts_follow_batches_and_count_each_address_once() {
    let mut d = load(Arc::new(MemoryKv::new()), 0);
    d.handle_push(batch(vec![Transition::new("7", Status::Down), Transition::new("404", Status::Up)]), 0);
    let c = d.address_counts();
    assert_eq!(c.total, Some(5));
    assert_eq!(c.up, Some(1));
    assert_eq!(c.down, Some(3));
    assert_eq!(c.error, Some(1));
    assert_eq!(c.unknown, Some(0));
}
