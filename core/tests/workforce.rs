//! Staffed buildings, service walkers, and the idle worker pool.

use citysim_core::{
    building::{BuildingKind, BurningRuins},
    command::PlayerCommand,
    engine::SimEngine,
    error::SimError,
    event::SimEvent,
    rng::SubsystemRng,
    types::{BuildingId, TilePos},
    walker::Service,
};

fn engine(run_id: &str) -> SimEngine {
    SimEngine::build_test(run_id.into(), 7).unwrap()
}

fn place(engine: &mut SimEngine, kind: BuildingKind, pos: TilePos) -> BuildingId {
    let config = engine.config().clone();
    let mut rng = SubsystemRng::new(7, 9);
    engine.city_mut().build(kind, pos, &config, &mut rng).unwrap()
}

#[test]
fn set_workers_command_clamps_to_quota() {
    let mut engine = engine("clamp-cmd-test");
    let school = place(&mut engine, BuildingKind::School, TilePos::new(0, 0));

    engine
        .apply_command(PlayerCommand::SetWorkers { building_id: school, count: 500 })
        .unwrap();
    assert_eq!(engine.city().working(school).unwrap().workers(), 10);
}

#[test]
fn workforce_commands_reject_unstaffed_buildings() {
    let mut engine = engine("unstaffed-test");
    let house = place(&mut engine, BuildingKind::House, TilePos::new(0, 0));

    let err = engine
        .apply_command(PlayerCommand::SetActive { building_id: house, active: false })
        .unwrap_err();
    assert!(matches!(err, SimError::NotStaffed { .. }));
}

#[test]
fn destroyed_building_returns_workers_to_idle_pool() {
    let mut engine = engine("workers-return-test");
    let pos = TilePos::new(3, 4);
    let prefecture = place(&mut engine, BuildingKind::Prefecture, pos);
    engine
        .apply_command(PlayerCommand::SetWorkers { building_id: prefecture, count: 4 })
        .unwrap();
    engine.run_ticks(1).unwrap();
    assert_eq!(engine.city().walkers().len(), 1);

    engine
        .apply_command(PlayerCommand::Destroy { building_id: prefecture })
        .unwrap();
    engine.run_ticks(1).unwrap();

    assert_eq!(engine.city().idle_workers(), 4);
    assert!(engine.city().walkers().is_empty(), "walkers go with their building");
    assert!(!engine.city().tiles().get(pos).building);

    let tick_two: Vec<SimEvent> = engine
        .store_events_for_tick("workers-return-test", 2)
        .unwrap()
        .into_iter()
        .map(|e| serde_json::from_str(&e.payload).unwrap())
        .collect();
    assert!(tick_two.contains(&SimEvent::WorkersReturned { tick: 2, pos, count: 4 }));
    assert!(tick_two.contains(&SimEvent::WorkersReclaimed { tick: 2, count: 4, idle_total: 4 }));
}

#[test]
fn burning_a_staffed_building_also_frees_workers() {
    let mut engine = engine("burn-staff-test");
    let pos = TilePos::new(0, 6);
    let college = place(&mut engine, BuildingKind::College, pos);
    engine
        .apply_command(PlayerCommand::SetWorkers { building_id: college, count: 30 })
        .unwrap();
    engine.apply_command(PlayerCommand::Burn { building_id: college }).unwrap();
    engine.run_ticks(1).unwrap();

    assert_eq!(engine.city().idle_workers(), 30);
    let ruins = engine.city().building_at(pos).unwrap();
    assert_eq!(engine.city().get(ruins).unwrap().kind(), BuildingKind::BurningRuins);
}

#[test]
fn prefect_puts_out_nearby_fire() {
    let mut engine = engine("prefect-test");
    let prefecture = place(&mut engine, BuildingKind::Prefecture, TilePos::new(0, 0));
    let ruins_pos = TilePos::new(1, 1);
    let ruins = place(&mut engine, BuildingKind::BurningRuins, ruins_pos);
    engine
        .apply_command(PlayerCommand::SetWorkers { building_id: prefecture, count: 6 })
        .unwrap();

    engine.run_ticks(1).unwrap();
    let fire = |engine: &SimEngine| {
        engine
            .city()
            .get(ruins)
            .and_then(|b| b.as_any().downcast_ref::<BurningRuins>())
            .map(|r| r.fire())
    };
    assert_eq!(fire(&engine), Some(94.0));
    let walker = engine.city().walkers().iter().next().unwrap();
    assert_eq!(walker.service, Service::Prefect);

    // 19 more visits plus one decay step exhaust the fire by tick 20;
    // the next decay step at tick 32 removes the ruins.
    engine.run_ticks(31).unwrap();
    assert_eq!(engine.store_event_count("service_delivered").unwrap(), 20);
    let successor = engine.city().building_at(ruins_pos).unwrap();
    assert_eq!(engine.city().get(successor).unwrap().kind(), BuildingKind::BurnedRuins);
}

#[test]
fn inactive_building_sends_no_walkers() {
    let mut engine = engine("inactive-test");
    let school = place(&mut engine, BuildingKind::School, TilePos::new(0, 0));
    engine
        .apply_command(PlayerCommand::SetWorkers { building_id: school, count: 10 })
        .unwrap();
    engine
        .apply_command(PlayerCommand::SetActive { building_id: school, active: false })
        .unwrap();
    engine.run_ticks(40).unwrap();

    assert_eq!(engine.store_event_count("walker_spawned").unwrap(), 0);

    engine
        .apply_command(PlayerCommand::SetActive { building_id: school, active: true })
        .unwrap();
    engine.run_ticks(1).unwrap();
    assert_eq!(engine.store_event_count("walker_spawned").unwrap(), 1);
}

#[test]
fn walkers_retire_and_are_replaced() {
    let mut engine = engine("retire-test");
    let library = place(&mut engine, BuildingKind::Library, TilePos::new(9, 9));
    engine
        .apply_command(PlayerCommand::SetWorkers { building_id: library, count: 20 })
        .unwrap();

    // Lifetime 64: the first walker retires at tick 64, the next leaves at 65.
    engine.run_ticks(64).unwrap();
    assert!(engine.city().walkers().is_empty());
    engine.run_ticks(1).unwrap();
    assert_eq!(engine.city().walkers().len(), 1);
    assert_eq!(engine.store_event_count("walker_spawned").unwrap(), 2);
}
