#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs warehouse simulations.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use warehouse_core::{PlannerKind, RunOutcome, SimConfig, TileKind};
use warehouse_headless::{RunReport, Simulation};
use warehouse_world::Grid;

#[derive(Debug, Parser)]
#[command(
    name = "warehouse",
    version,
    about = "Simulate autonomous robots retrieving items from a warehouse"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Run a simulation and print its report.
    Run(RunArgs),
    /// Parse a map file and summarise its tiles.
    CheckMap(MapArgs),
}

#[derive(Debug, Args)]
struct MapArgs {
    /// Map file: one whitespace-separated tile code per cell, row by row.
    #[arg(long)]
    map: PathBuf,
    /// Number of columns in the map.
    #[arg(long)]
    columns: u32,
    /// Number of rows in the map.
    #[arg(long)]
    rows: u32,
    /// Height of one floor for stacked multi-floor maps.
    #[arg(long)]
    rows_per_floor: Option<u32>,
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    map: MapArgs,
    /// TOML file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of robots to spawn.
    #[arg(long)]
    robots: Option<u32>,
    /// Number of obstacles scattered every cycle.
    #[arg(long)]
    obstacles: Option<u32>,
    /// Seed for spawns, the ledger, obstacles, and tree search.
    #[arg(long)]
    seed: Option<u64>,
    /// Planner picking robot actions.
    #[arg(long, value_enum)]
    planner: Option<PlannerArg>,
    /// Tick budget after which the run fails.
    #[arg(long)]
    ticks: Option<u64>,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PlannerArg {
    Heuristic,
    Mcts,
    Mixed,
}

impl From<PlannerArg> for PlannerKind {
    fn from(value: PlannerArg) -> Self {
        match value {
            PlannerArg::Heuristic => PlannerKind::Heuristic,
            PlannerArg::Mcts => PlannerKind::Mcts,
            PlannerArg::Mixed => PlannerKind::Mixed,
        }
    }
}

/// Entry point for the warehouse command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::CheckMap(args) => check_map(&args),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_grid(args: &MapArgs) -> Result<Grid> {
    let grid = Grid::load(&args.map, args.columns, args.rows)
        .with_context(|| format!("failed to load map {}", args.map.display()))?;
    grid.with_rows_per_floor(args.rows_per_floor)
        .context("invalid floor layout")
}

fn load_config(path: &Path) -> Result<SimConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(robots) = args.robots {
        config.fleet.robots = robots;
    }
    if let Some(count) = args.obstacles {
        config.obstacles.count = count;
    }
    if let Some(seed) = args.seed {
        config.fleet.seed = seed;
    }
    if let Some(planner) = args.planner {
        config.planner = planner.into();
    }
    if let Some(ticks) = args.ticks {
        config.run.tick_budget = ticks;
    }
    if args.map.rows_per_floor.is_some() {
        config.floors.rows_per_floor = args.map.rows_per_floor;
    }

    let grid = load_grid(&args.map)?;
    info!(map = %args.map.map.display(), seed = config.fleet.seed, "preparing run");
    let report = Simulation::builder(grid, config)
        .build()
        .context("failed to prepare the simulation")?
        .run();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let outcome = match report.outcome {
        RunOutcome::Success => "success".to_owned(),
        RunOutcome::Failure(reason) => format!("failure ({reason:?})"),
        RunOutcome::Skipped(reason) => format!("skipped ({reason:?})"),
    };
    let metrics = &report.metrics;
    println!("outcome:           {outcome}");
    println!("ticks:             {}", metrics.ticks);
    println!("items retrieved:   {}", metrics.items_retrieved);
    println!("dead robots:       {}", metrics.dead_robots);
    println!(
        "actions:           {} attempted, {} failed",
        metrics.actions_attempted, metrics.actions_failed
    );
    println!("obstacles placed:  {}", metrics.obstacles_placed);
    println!("wall clock:        {:?}", metrics.wall_clock);
}

fn check_map(args: &MapArgs) -> Result<()> {
    let grid = load_grid(args)?;
    let count = |wanted: fn(TileKind) -> bool| {
        grid.tiles()
            .iter()
            .filter(|tile| wanted(tile.kind()))
            .count()
    };
    let floors = match grid.bounds().rows_per_floor() {
        Some(height) => grid.bounds().rows() / height,
        None => 1,
    };
    let exits = count(|kind| kind == TileKind::Exit);
    if exits == 0 {
        warn!("map has no exit; no item can ever be submitted");
    }

    println!(
        "size:      {} x {} ({floors} floor(s))",
        grid.bounds().columns(),
        grid.bounds().rows()
    );
    println!("floor:     {}", count(|kind| kind == TileKind::Floor));
    println!(
        "shelves:   {} ({} stocked)",
        count(|kind| kind.shelf_access().is_some()),
        grid.stocked_items().count()
    );
    println!("chargers:  {}", count(|kind| kind == TileKind::Charger));
    println!("elevators: {}", count(|kind| kind == TileKind::Elevator));
    println!("exits:     {exits}");
    println!("obstacles: {}", count(|kind| kind == TileKind::Obstacle));
    Ok(())
}
