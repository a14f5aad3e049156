//! sim-runner: headless runner for the city simulation.
//!
//! Usage:
//!   sim-runner --seed 12345 --ticks 1600 --db run.db
//!   sim-runner --seed 12345 --ipc-mode < commands.jsonl

use anyhow::{Context, Result};
use citysim_core::{
    advisor::EducationReport,
    building::{BuildingKind, CitizenGroup, Habitants},
    command::PlayerCommand,
    config::SimConfig,
    engine::SimEngine,
    rng::SubsystemRng,
    store::SimStore,
    types::{Tick, TilePos},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        count: u64,
    },
    Command {
        command: PlayerCommand,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    tick:         Tick,
    paused:       bool,
    buildings:    usize,
    walkers:      usize,
    population:   u32,
    idle_workers: u32,
    education:    EducationReport,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 1600u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");

    if !ipc_mode {
        println!("citysim sim-runner");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = SimConfig::load(data_dir)?;
    let store = SimStore::open(db).with_context(|| format!("opening store {db}"))?;
    store.migrate()?;

    let run_id = format!("run-{seed}-{}", uuid::Uuid::new_v4().simple());
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;
    log::info!("run {run_id} started at {}", chrono::Utc::now().to_rfc3339());

    let mut engine = SimEngine::build(run_id.clone(), seed, store, config);
    seed_demo_city(&mut engine, seed)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        engine.run_ticks(ticks)?;
        print_summary(&engine, ticks)?;
    }

    Ok(())
}

/// A small quarter: houses around a school, college and library, a
/// prefecture next to a fire, and one house left to collapse.
fn seed_demo_city(engine: &mut SimEngine, seed: u64) -> Result<()> {
    let config = engine.config().clone();
    let mut rng = SubsystemRng::new(seed, u64::MAX).with_name("scenario");
    let city = engine.city_mut();

    for (n, i) in (0..4).enumerate() {
        let habitants = Habitants::new()
            .with(CitizenGroup::Child, 6 + n as u32)
            .with(CitizenGroup::Scholar, 20 + 4 * n as u32)
            .with(CitizenGroup::Student, 12 + 2 * n as u32)
            .with(CitizenGroup::Mature, 40)
            .with(CitizenGroup::Aged, 8);
        city.add_house(TilePos::new(i * 2, 4), habitants, &config, &mut rng)?;
    }

    let school = city.build(BuildingKind::School, TilePos::new(0, 0), &config, &mut rng)?;
    let college = city.build(BuildingKind::College, TilePos::new(2, 0), &config, &mut rng)?;
    let library = city.build(BuildingKind::Library, TilePos::new(4, 0), &config, &mut rng)?;
    let prefecture = city.build(BuildingKind::Prefecture, TilePos::new(10, 10), &config, &mut rng)?;
    city.build(BuildingKind::BurningRuins, TilePos::new(11, 11), &config, &mut rng)?;
    let shack = city.add_house(TilePos::new(14, 14), Habitants::new(), &config, &mut rng)?;

    engine.submit(PlayerCommand::SetWorkers { building_id: school, count: 10 });
    engine.submit(PlayerCommand::SetWorkers { building_id: college, count: 15 });
    engine.submit(PlayerCommand::SetWorkers { building_id: library, count: 20 });
    engine.submit(PlayerCommand::SetWorkers { building_id: prefecture, count: 6 });
    engine.submit(PlayerCommand::Collapse { building_id: shack });
    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Tick { count } => {
                engine.run_ticks(count)?;
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::Command { command } => match engine.apply_command(command) {
                Ok(_) => {
                    writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
                }
                Err(e) => {
                    log::warn!("command rejected: {e}");
                    writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                }
            },
        }
        stdout.flush()?;
    }
    Ok(())
}

fn build_ui_state(engine: &SimEngine) -> UiState {
    let city = engine.city();
    UiState {
        tick:         engine.clock.current_tick,
        paused:       engine.clock.paused,
        buildings:    city.building_count(),
        walkers:      city.walkers().len(),
        population:   city.population(),
        idle_workers: city.idle_workers(),
        education:    engine.education_report(),
    }
}

fn print_summary(engine: &SimEngine, ticks: u64) -> Result<()> {
    let city = engine.city();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", engine.run_id);
    println!("  ticks run:      {ticks}");
    println!("  final tick:     {}", engine.clock.current_tick);
    println!("  buildings:      {}", city.building_count());
    println!("  walkers out:    {}", city.walkers().len());
    println!("  idle workers:   {}", city.idle_workers());
    println!("  constructed:    {}", engine.store_event_count("building_constructed")?);
    println!("  removed:        {}", engine.store_event_count("building_removed")?);
    println!("  service visits: {}", engine.store_event_count("service_delivered")?);
    println!("  snapshots:      {}", engine.store_snapshot_count()?);

    println!();
    println!("=== EDUCATION ===");
    print!("{}", engine.education_report());
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
