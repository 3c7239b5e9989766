#![forbid(unsafe_code)]

use netpulse_core::{Status, Transition};
use netpulse_store::{FilterEngine, RowSeed, StatusRegistry};

fn seed(id: &str, table: &str, status: Status) -> RowSeed {
    RowSeed { id: id.into(), ip_address: format!("192.168.1.{id}"), table: table.into(), status, last_seen: None }
}

fn page() -> StatusRegistry {
    StatusRegistry::from_seeds(vec![
        seed("1", "all", Status::Up),
        seed("2", "all", Status::Up),
        seed("3", "all", Status::Down),
        seed("7", "all", Status::Up),
        seed("7", "servers", Status::Up),
        seed("9", "servers", Status::Unknown),
    ])
}

fn apply_batch(reg: &mut StatusRegistry, engine: &FilterEngine, batch: &[Transition]) {
    for t in batch {
        reg.set_status(&t.id, t.new_status, t.parsed_timestamp());
    }
    engine.reapply(reg);
}

fn visible_ids(reg: &StatusRegistry) -> Vec<(String, String)> {
    reg.rows().iter().filter(|r| r.visible()).map(|r| (r.table.clone(), r.id.to_string())).collect()
}

#[test]
fn replay_batches_under_active_filter() {
    let mut reg = page();
    let mut engine = FilterEngine::default();
    engine.apply(Status::Up, &mut reg, &false);
    assert_eq!(visible_ids(&reg).len(), 4);

    // 7 goes down in both tables at once
    apply_batch(&mut reg, &engine, &[Transition::new("7", Status::Down).at("2024-03-01T12:00:00")]);
    assert_eq!(
        visible_ids(&reg),
        vec![("all".to_string(), "1".to_string()), ("all".to_string(), "2".to_string())]
    );

    // later batch: 3 recovers, 2 errors, an unrendered address is ignored
    apply_batch(
        &mut reg,
        &engine,
        &[
            Transition::new("3", Status::Up),
            Transition::new("2", Status::Error),
            Transition::new("404", Status::Up),
        ],
    );
    assert_eq!(
        visible_ids(&reg),
        vec![("all".to_string(), "1".to_string()), ("all".to_string(), "3".to_string())]
    );
    assert_eq!(engine.current(), Some(Status::Up));
}

#[test]
fn later_event_for_same_address_wins_within_a_batch() {
    let mut reg = page();
    let mut engine = FilterEngine::default();
    engine.apply(Status::Error, &mut reg, &false);
    apply_batch(
        &mut reg,
        &engine,
        &[Transition::new("9", Status::Down), Transition::new("9", Status::Error)],
    );
    assert_eq!(visible_ids(&reg), vec![("servers".to_string(), "9".to_string())]);
}

#[test]
fn visibility_is_a_function_of_filter_and_status_for_every_combination() {
    let statuses = Status::ALL;
    for f in statuses {
        for moved in statuses {
            let mut reg = page();
            let mut engine = FilterEngine::default();
            engine.apply(f, &mut reg, &false);
            apply_batch(&mut reg, &engine, &[Transition::new("1", moved)]);
            for row in reg.rows() {
                assert_eq!(row.visible(), row.status == f);
            }
        }
    }
}
