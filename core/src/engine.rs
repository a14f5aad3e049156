//! The simulation engine: drives the city one tick at a time.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   0. Command phase  (queued player commands, between ticks)
//!   1. Buildings      (per-building callbacks, reap of flagged buildings)
//!   2. Walkers        (service visits, ageing, reap of retired walkers)
//!   3. Construction   (BuildRequested → new buildings)
//!   4. Population     (WorkersReturned → idle worker pool)
//!
//! RULES:
//!   - Subsystems execute in registration order, every tick.
//!   - Each subsystem sees every event emitted earlier in the tick.
//!   - Events from the command phase are delivered to the next tick.
//!   - All randomness flows through the RngBank.
//!   - All emitted events are recorded in the event log.

use std::collections::VecDeque;

use crate::{
    advisor::EducationReport,
    building::BuildingKind,
    building_subsystem::BuildingSubsystem,
    city::City,
    clock::SimClock,
    command::{PlayerCommand, QueuedCommand},
    config::SimConfig,
    construction_subsystem::ConstructionSubsystem,
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    population_subsystem::PopulationSubsystem,
    rng::{RngBank, SubsystemSlot},
    snapshot::{SimSnapshot, SNAPSHOT_INTERVAL},
    store::SimStore,
    subsystem::SimSubsystem,
    types::{RunId, Tick},
    walker_subsystem::WalkerSubsystem,
};

pub struct SimEngine {
    pub run_id:     RunId,
    pub clock:      SimClock,
    pub rng_bank:   RngBank,
    seed:           u64,
    config:         SimConfig,
    city:           City,
    subsystems:     Vec<(SubsystemSlot, Box<dyn SimSubsystem>)>,
    store:          SimStore,
    pending_events: Vec<SimEvent>,
    command_queue:  VecDeque<QueuedCommand>,
}

impl SimEngine {
    pub fn new(run_id: RunId, seed: u64, store: SimStore, config: SimConfig) -> Self {
        Self {
            clock:          SimClock::new(run_id.clone()),
            rng_bank:       RngBank::new(seed),
            seed,
            config,
            city:           City::new(),
            subsystems:     Vec::new(),
            store,
            pending_events: Vec::new(),
            command_queue:  VecDeque::new(),
            run_id,
        }
    }

    /// Build a fully wired engine with all subsystems registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, seed: u64, store: SimStore, config: SimConfig) -> Self {
        let mut engine = SimEngine::new(run_id, seed, store, config);

        // EXECUTION ORDER: fixed, documented, never reordered.
        let config = engine.config.clone();
        engine.register(
            SubsystemSlot::Buildings,
            Box::new(BuildingSubsystem::new(config.clone())),
        );
        engine.register(
            SubsystemSlot::Walkers,
            Box::new(WalkerSubsystem::new(config.walkers.clone())),
        );
        engine.register(
            SubsystemSlot::Construction,
            Box::new(ConstructionSubsystem::new(config)),
        );
        engine.register(
            SubsystemSlot::Population,
            Box::new(PopulationSubsystem::new()),
        );
        engine
    }

    /// In-memory engine with the hard-coded test config and a
    /// registered run row.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, seed, "test")?;
        Ok(Self::build(run_id, seed, store, SimConfig::default_test()))
    }

    /// Rebuild an engine from the latest snapshot at or before `tick`.
    /// The restored clock is paused.
    pub fn restore(
        run_id: RunId,
        seed:   u64,
        store:  SimStore,
        config: SimConfig,
        tick:   Tick,
    ) -> SimResult<Self> {
        let Some((snap_tick, json)) = store.latest_snapshot_before(&run_id, tick)? else {
            return Err(SimError::SnapshotNotFound { run_id, tick });
        };
        let snapshot: SimSnapshot = serde_json::from_str(&json)?;
        let city = City::load(&snapshot.city, &config)?;

        let mut engine = Self::build(run_id, seed, store, config);
        engine.clock = snapshot.clock;
        engine.clock.pause();
        engine.city = city;
        log::info!("restored {} from snapshot at tick {snap_tick}", engine.run_id);
        Ok(engine)
    }

    /// Register a subsystem. Call in the documented execution order.
    pub fn register(&mut self, slot: SubsystemSlot, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push((slot, subsystem));
    }

    pub fn city(&self) -> &City {
        &self.city
    }

    /// Direct world access for scenario setup. Changes made here bypass
    /// the event log.
    pub fn city_mut(&mut self) -> &mut City {
        &mut self.city
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn into_store(self) -> SimStore {
        self.store
    }

    /// Queue a command for the next command phase.
    pub fn submit(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(QueuedCommand {
            run_id:    self.run_id.clone(),
            queued_at: self.clock.current_tick,
            command,
        });
    }

    /// Apply a command immediately. Emitted events are persisted now and
    /// handed to the subsystems on the next tick.
    pub fn apply_command(&mut self, command: PlayerCommand) -> SimResult<Vec<SimEvent>> {
        let tick = self.clock.current_tick;
        let mut events = vec![SimEvent::PlayerCommandReceived {
            tick,
            command_type: command.type_name().to_string(),
        }];

        match command {
            PlayerCommand::Pause => self.clock.pause(),
            PlayerCommand::Resume => self.clock.resume(),
            PlayerCommand::SetSpeed { speed } => self.clock.set_speed(speed),
            PlayerCommand::Build { kind, pos } => {
                events.push(SimEvent::BuildRequested { tick, pos, kind });
            }
            PlayerCommand::Destroy { building_id } => {
                self.city.building_mut(building_id)?.base_mut().delete_later();
            }
            PlayerCommand::Burn { building_id } => {
                let building = self.city.building_mut(building_id)?;
                if building.burn() {
                    events.push(SimEvent::BuildRequested {
                        tick,
                        pos:  building.pos(),
                        kind: BuildingKind::BurningRuins,
                    });
                }
            }
            PlayerCommand::Collapse { building_id } => {
                let building = self.city.building_mut(building_id)?;
                if building.collapse() {
                    events.push(SimEvent::BuildRequested {
                        tick,
                        pos:  building.pos(),
                        kind: BuildingKind::CollapsedRuins,
                    });
                }
            }
            PlayerCommand::Plague { building_id } => {
                let building = self.city.building_mut(building_id)?;
                if !building.kind().is_ruins() {
                    building.base_mut().delete_later();
                    events.push(SimEvent::BuildRequested {
                        tick,
                        pos:  building.pos(),
                        kind: BuildingKind::PlagueRuins,
                    });
                }
            }
            PlayerCommand::SetWorkers { building_id, count } => {
                self.city.working_mut(building_id)?.set_workers(count);
            }
            PlayerCommand::SetActive { building_id, active } => {
                self.city.working_mut(building_id)?.set_active(active);
            }
        }

        self.persist(tick, "commands", &events)?;
        self.pending_events.extend(events.iter().cloned());
        Ok(events)
    }

    /// Advance one tick. This is the core simulation step.
    /// Returns no events if a queued command paused the clock.
    pub fn tick(&mut self) -> SimResult<Vec<SimEvent>> {
        self.drain_commands()?;
        if self.clock.paused {
            return Ok(Vec::new());
        }

        let current_tick = self.clock.advance();
        let mut tick_events: Vec<SimEvent> = vec![
            SimEvent::TickStarted { tick: current_tick }
        ];
        tick_events.append(&mut self.pending_events);

        // Execute each subsystem in registration order.
        // Each subsystem sees all events emitted so far this tick.
        for (slot, subsystem) in &mut self.subsystems {
            let mut rng = self.rng_bank.for_subsystem_at_tick(*slot, current_tick);
            let new_events = subsystem.update(current_tick, &mut self.city, &tick_events, &mut rng)?;

            // Persist each new event to the log.
            for event in &new_events {
                self.store.append_event(&EventLogEntry {
                    id:         None,
                    run_id:     self.run_id.clone(),
                    tick:       current_tick,
                    subsystem:  subsystem.name().to_string(),
                    event_type: event.type_name().to_string(),
                    payload:    serde_json::to_string(event)?,
                })?;
            }

            tick_events.extend(new_events);
        }

        tick_events.push(SimEvent::TickCompleted { tick: current_tick });

        if current_tick.is_multiple_of(SNAPSHOT_INTERVAL) {
            self.take_snapshot(current_tick)?;
        }

        Ok(tick_events)
    }

    /// Run n ticks in a loop. Used for testing and fast-forward.
    /// Stops early if a queued command pauses the clock.
    pub fn run_ticks(&mut self, n: u64) -> SimResult<()> {
        // Emit RunInitialized at tick 0 so seed differences are observable.
        if self.clock.current_tick == 0 && self.store.event_count(&self.run_id, "run_initialized")? == 0 {
            let init_event = SimEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed:   self.seed,
            };
            self.persist(0, "engine", &[init_event])?;
        }
        self.clock.resume();
        for _ in 0..n {
            self.tick()?;
            if self.clock.paused {
                return Ok(());
            }
        }
        self.clock.pause();
        Ok(())
    }

    pub fn education_report(&self) -> EducationReport {
        EducationReport::compute(&self.city, &self.config.education)
    }

    /// Query events for a specific tick from the store.
    /// Used by the determinism test and replay tooling.
    pub fn store_events_for_tick(
        &self,
        run_id: &str,
        tick: Tick,
    ) -> SimResult<Vec<EventLogEntry>> {
        self.store.events_for_tick(run_id, tick)
    }

    pub fn store_event_count(&self, event_type: &str) -> SimResult<i64> {
        self.store.event_count(&self.run_id, event_type)
    }

    pub fn store_snapshot_count(&self) -> SimResult<i64> {
        self.store.snapshot_count(&self.run_id)
    }

    fn drain_commands(&mut self) -> SimResult<()> {
        while let Some(queued) = self.command_queue.pop_front() {
            let command_type = queued.command.type_name();
            match self.apply_command(queued.command) {
                Ok(_) => {}
                Err(SimError::BuildingNotFound { id }) => {
                    log::warn!("dropping {command_type} queued at tick {}: no building #{id}", queued.queued_at);
                }
                Err(SimError::NotStaffed { id }) => {
                    log::warn!("dropping {command_type} queued at tick {}: #{id} has no workers", queued.queued_at);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn persist(&self, tick: Tick, subsystem: &str, events: &[SimEvent]) -> SimResult<()> {
        for event in events {
            self.store.append_event(&EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                tick,
                subsystem:  subsystem.to_string(),
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(event)?,
            })?;
        }
        Ok(())
    }

    fn take_snapshot(&self, tick: Tick) -> SimResult<()> {
        let snapshot = SimSnapshot {
            run_id: self.run_id.clone(),
            tick,
            clock:  self.clock.clone(),
            city:   self.city.save(),
        };
        let json = serde_json::to_string(&snapshot)?;
        self.store.save_snapshot(&self.run_id, tick, &json)?;
        log::debug!("Snapshot saved at tick {tick}");
        Ok(())
    }
}
