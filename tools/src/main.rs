//! farm-runner: headless runner for the tubewell economics core.
//!
//! Drives the core with the synthetic forcing and prints how farms
//! moved between well brackets.
//!
//! Usage:
//!   farm-runner --seed 12345 --ticks 1825
//!   farm-runner --config sim.json --cells cells.json --snapshot-out end.json
//!   farm-runner --resume end.json --ticks 365

use anyhow::{Context, Result};
use std::env;
use tubewell_core::{
    config::SimConfig,
    engine::SimEngine,
    event::SimEvent,
    forcing::{SyntheticForcing, SyntheticForcingParams},
    snapshot::SimSnapshot,
    state::{CategorySetup, CellSetup},
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 365u64 * 5);
    let config_path = flag_value(&args, "--config");
    let cells_path = flag_value(&args, "--cells");
    let resume_path = flag_value(&args, "--resume");
    let snapshot_out = flag_value(&args, "--snapshot-out");

    let config = match config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    let mut engine = match resume_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading snapshot {path}"))?;
            log::info!("resuming from snapshot {path}");
            SimEngine::restore(config.clone(), SimSnapshot::from_json(&json)?)?
        }
        None => {
            let cells = match cells_path {
                Some(path) => {
                    let json = std::fs::read_to_string(path)
                        .with_context(|| format!("reading cells {path}"))?;
                    serde_json::from_str::<Vec<CellSetup>>(&json)
                        .with_context(|| format!("parsing cells {path}"))?
                }
                None => default_cells(config.category_count()),
            };
            let run_id = format!("run-{seed}-{}", chrono::Utc::now().timestamp());
            log::info!("starting run {run_id} over {} cells", cells.len());
            SimEngine::build(run_id, seed, config.clone(), &cells)?
        }
    };

    println!("tubewell economics: farm-runner");
    println!("  run_id:    {}", engine.run_id);
    println!("  seed:      {}", engine.seed());
    println!("  ticks:     {ticks}");
    println!("  cells:     {}", engine.cells().len());
    println!("  from tick: {}", engine.current_tick());
    println!();

    let mut forcing = SyntheticForcing::new(
        SyntheticForcingParams::default(),
        engine.seed(),
        config.calendar.start_of_agricultural_year,
        config.crop_count(),
    );
    let events = engine.run_ticks(ticks, &mut forcing)?;

    print_summary(&engine, &events);

    if let Some(path) = snapshot_out {
        std::fs::write(path, engine.snapshot().to_json()?)
            .with_context(|| format!("writing snapshot {path}"))?;
        log::info!("snapshot at tick {} written to {path}", engine.current_tick());
        println!();
        println!("  snapshot written to {path}");
    }
    Ok(())
}

fn print_summary(engine: &SimEngine, events: &[SimEvent]) {
    let layout = engine.layout();
    let config = engine.config();

    let installations: f64 = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::TubewellsInstalled { farms, .. } => Some(*farms),
            _ => None,
        })
        .sum();
    let settlements = events
        .iter()
        .filter(|e| matches!(e, SimEvent::AccountsSettled { .. }))
        .count();

    println!("=== RUN SUMMARY ===");
    println!("  final tick:       {}", engine.current_tick());
    println!("  final date:       {}", engine.clock.current_date());
    println!("  settlements:      {settlements}");
    println!("  wells installed:  {installations:.0}");
    println!();

    for cell in engine.cells() {
        println!(
            "=== CELL {} | savings {:.0} Rs | wells {:.0} ===",
            cell.cell_id,
            cell.total_savings(),
            cell.total_tubewells(layout)
        );
        for (category, category_config) in config.categories.iter().enumerate() {
            let brackets: Vec<String> = (0..=layout.max_tubewells(category))
                .map(|wells| {
                    let rainfed = cell.farm_count[layout.index_of(category, wells, false)];
                    let canal = cell.farm_count[layout.index_of(category, wells, true)];
                    format!("{wells}w {rainfed:.0}/{canal:.0}")
                })
                .collect();
            println!(
                "  {:<10} farms {:>6.0} | rate {:.2} | {}",
                category_config.label,
                cell.category_total(layout, category),
                cell.tubewell_ownership_rate[category],
                brackets.join("  ")
            );
        }
    }
}

/// A small landscape for demo runs: one cell per canal-access level.
fn default_cells(category_count: usize) -> Vec<CellSetup> {
    [0.0, 0.3, 0.8]
        .iter()
        .map(|&canal| CellSetup {
            categories: (0..category_count)
                .map(|c| {
                    let farm_area = 5_000.0 * (c + 1) as f64;
                    CategorySetup {
                        farm_area,
                        category_area: farm_area * (120.0 / (c + 1) as f64).round(),
                        canal_access_fraction: canal,
                        tubewell_ownership_rate: 0.3 + 0.4 * c as f64,
                    }
                })
                .collect(),
        })
        .collect()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
