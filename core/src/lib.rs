//! citysim-core: deterministic tick-driven city simulation.
//!
//! A `SimEngine` owns the `City` (buildings, walkers, tiles) and runs
//! the subsystems in a fixed order every tick. Effects that cross
//! entity boundaries travel as `SimEvent`s and land in the event log.

pub mod advisor;
pub mod building;
pub mod building_subsystem;
pub mod city;
pub mod clock;
pub mod command;
pub mod config;
pub mod construction;
pub mod construction_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod population_subsystem;
pub mod rng;
pub mod snapshot;
pub mod store;
pub mod subsystem;
pub mod tile;
pub mod types;
pub mod variant;
pub mod visual;
pub mod walker;
pub mod walker_subsystem;
