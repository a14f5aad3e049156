//! Snapshots and restore.

use citysim_core::{
    building::{BuildingKind, BurningRuins},
    command::PlayerCommand,
    config::SimConfig,
    engine::SimEngine,
    error::SimError,
    event::SimEvent,
    rng::SubsystemRng,
    snapshot::SNAPSHOT_INTERVAL,
    types::TilePos,
};

#[test]
fn snapshot_written_every_interval() {
    let mut engine = SimEngine::build_test("snap-count-test".into(), 3).unwrap();
    engine.run_ticks(SNAPSHOT_INTERVAL * 3 + 5).unwrap();
    assert_eq!(engine.store_snapshot_count().unwrap(), 3);
}

#[test]
fn restore_reproduces_buildings() {
    let run_id = "restore-test".to_string();
    let mut engine = SimEngine::build_test(run_id.clone(), 11).unwrap();
    let config = engine.config().clone();
    let mut rng = SubsystemRng::new(11, 9);
    let school = engine
        .city_mut()
        .build(BuildingKind::School, TilePos::new(0, 0), &config, &mut rng)
        .unwrap();
    let ruins = engine
        .city_mut()
        .build(BuildingKind::BurningRuins, TilePos::new(9, 9), &config, &mut rng)
        .unwrap();
    engine.apply_command(PlayerCommand::SetWorkers { building_id: school, count: 7 }).unwrap();
    engine.apply_command(PlayerCommand::SetActive { building_id: school, active: false }).unwrap();
    engine.run_ticks(SNAPSHOT_INTERVAL).unwrap();

    let before = engine.city().save();
    let store = engine.into_store();
    let mut restored =
        SimEngine::restore(run_id, 11, store, config, SNAPSHOT_INTERVAL + 10).unwrap();

    assert_eq!(restored.clock.current_tick, SNAPSHOT_INTERVAL);
    assert!(restored.clock.paused);
    let working = restored.city().working(school).unwrap();
    assert_eq!(working.workers(), 7);
    assert_eq!(working.max_workers(), 10);
    assert!(!working.is_active());
    assert_eq!(restored.city().save().buildings, before.buildings);

    // Four decay steps by the snapshot tick.
    let fire = restored
        .city()
        .get(ruins)
        .and_then(|b| b.as_any().downcast_ref::<BurningRuins>())
        .map(|r| r.fire());
    assert_eq!(fire, Some(95.0));

    restored.run_ticks(16).unwrap();
    assert_eq!(restored.clock.current_tick, SNAPSHOT_INTERVAL + 16);
}

/// A prefecture staffed at tick 9 has its walker out when the first
/// snapshot is written.
fn walker_out_at_snapshot(run_id: &str) -> SimEngine {
    let mut engine = SimEngine::build_test(run_id.into(), 13).unwrap();
    let config = engine.config().clone();
    let mut rng = SubsystemRng::new(13, 9);
    let prefecture = engine
        .city_mut()
        .build(BuildingKind::Prefecture, TilePos::new(0, 0), &config, &mut rng)
        .unwrap();
    engine
        .city_mut()
        .build(BuildingKind::BurningRuins, TilePos::new(1, 1), &config, &mut rng)
        .unwrap();

    engine.run_ticks(9).unwrap();
    engine.apply_command(PlayerCommand::SetWorkers { building_id: prefecture, count: 6 }).unwrap();
    engine.run_ticks(SNAPSHOT_INTERVAL - 9).unwrap();
    engine
}

fn log_between(engine: &SimEngine, ticks: std::ops::RangeInclusive<u64>) -> Vec<String> {
    ticks
        .flat_map(|tick| {
            engine
                .store_events_for_tick(&engine.run_id, tick)
                .unwrap()
                .into_iter()
                .map(|e| format!("{}:{}", e.subsystem, e.payload))
        })
        .collect()
}

#[test]
fn restored_run_matches_uninterrupted_run() {
    let mut straight = walker_out_at_snapshot("resume-straight");
    assert_eq!(straight.city().walkers().len(), 1);
    straight.run_ticks(40).unwrap();

    let resumed = walker_out_at_snapshot("resume-restored");
    let store = resumed.into_store();
    let mut resumed = SimEngine::restore(
        "resume-restored".into(), 13, store, SimConfig::default_test(), SNAPSHOT_INTERVAL,
    )
    .unwrap();
    assert_eq!(resumed.city().walkers().len(), 1);
    resumed.run_ticks(40).unwrap();

    let after = SNAPSHOT_INTERVAL + 1..=SNAPSHOT_INTERVAL + 40;
    assert_eq!(log_between(&resumed, after.clone()), log_between(&straight, after));

    // Walker 1 left at tick 10 and retires at 73; walker 2 follows at 74.
    assert_eq!(resumed.store_event_count("walker_spawned").unwrap(), 2);
    let spawned: Vec<SimEvent> = resumed
        .store_events_for_tick("resume-restored", 74)
        .unwrap()
        .into_iter()
        .map(|e| serde_json::from_str(&e.payload).unwrap())
        .filter(|e| matches!(e, SimEvent::WalkerSpawned { .. }))
        .collect();
    assert!(matches!(spawned[..], [SimEvent::WalkerSpawned { walker_id: 2, .. }]));
}

#[test]
fn restore_without_snapshot_fails() {
    let engine = SimEngine::build_test("no-snap-test".into(), 1).unwrap();
    let store = engine.into_store();
    let err = SimEngine::restore("no-snap-test".into(), 1, store, SimConfig::default_test(), 10)
        .err()
        .unwrap();
    assert!(matches!(err, SimError::SnapshotNotFound { tick: 10, .. }));
}

#[test]
fn run_initialized_logged_once() {
    let mut engine = SimEngine::build_test("init-once-test".into(), 5).unwrap();
    engine.run_ticks(0).unwrap();
    engine.run_ticks(0).unwrap();
    engine.run_ticks(2).unwrap();
    assert_eq!(engine.store_event_count("run_initialized").unwrap(), 1);
}
