#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that wires the world and every system into a tick loop.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use warehouse_core::{
    CellCoord, Command, Direction, Event, ItemId, PlannerKind, RobotId, RunMetrics, RunOutcome,
    SimConfig, SpawnError,
};
use warehouse_system_analytics::Analytics;
use warehouse_system_bootstrap::Bootstrap;
use warehouse_system_decision::Decision;
use warehouse_system_mcts::Mcts;
use warehouse_system_obstacles::Obstacles;
use warehouse_world::{apply, query, Grid, LoadError, World};

/// Failures raised while preparing a simulation.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The floor layout does not divide the map.
    #[error("invalid floor layout")]
    Layout(#[from] LoadError),
    /// An explicit spawn could not be placed.
    #[error("robot spawn at {cell:?} rejected: {reason:?}")]
    SpawnRejected {
        /// Requested cell.
        cell: CellCoord,
        /// Why the world refused it.
        reason: SpawnError,
    },
    /// An explicit ledger entry names an item no shelf holds.
    #[error("ledger item {item:?} is not stocked on any shelf")]
    UnstockedItem {
        /// Offending item.
        item: ItemId,
    },
}

/// Progress reported after each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// The run continues.
    Running,
    /// The run has ended with the provided outcome.
    Finished(RunOutcome),
}

/// Structured summary of a completed run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    /// Terminal outcome.
    pub outcome: RunOutcome,
    /// Counters accumulated during the run.
    pub metrics: RunMetrics,
}

/// Builder collecting the optional pieces of a run before it starts.
#[derive(Debug)]
pub struct SimulationBuilder {
    grid: Grid,
    config: SimConfig,
    spawns: Option<Vec<(CellCoord, Direction)>>,
    ledger: Option<Vec<ItemId>>,
}

impl SimulationBuilder {
    /// Places robots at the provided cells instead of seeded random floor cells.
    #[must_use]
    pub fn spawns(mut self, spawns: impl IntoIterator<Item = (CellCoord, Direction)>) -> Self {
        self.spawns = Some(spawns.into_iter().collect());
        self
    }

    /// Uses the provided ledger instead of a seeded draw from the stocked items.
    #[must_use]
    pub fn ledger(mut self, items: impl IntoIterator<Item = ItemId>) -> Self {
        self.ledger = Some(items.into_iter().collect());
        self
    }

    /// Creates the world, spawns the fleet, and assigns the ledger.
    pub fn build(self) -> Result<Simulation, SetupError> {
        let Self {
            grid,
            config,
            spawns,
            ledger,
        } = self;
        let grid = match config.floors.rows_per_floor {
            Some(height) => grid.with_rows_per_floor(Some(height))?,
            None => grid,
        };
        if let Some(items) = &ledger {
            if let Some(item) = items
                .iter()
                .find(|item| !grid.stocked_items().any(|stock| stock.id() == **item))
            {
                return Err(SetupError::UnstockedItem { item: *item });
            }
        }

        let seed = config.fleet.seed;
        let mut bootstrap = Bootstrap::new(seed);
        let mut commands = Vec::new();
        match spawns {
            Some(spawns) => commands.extend(
                spawns
                    .into_iter()
                    .map(|(cell, facing)| Command::SpawnRobot { cell, facing }),
            ),
            None => bootstrap.spawn_fleet(&grid, &config.fleet, &mut commands),
        }
        match ledger {
            Some(items) => commands.push(Command::AssignLedger { items }),
            None => bootstrap.assign_ledger(&grid, &config.ledger, &mut commands),
        }

        let simulation = Simulation {
            decision: Decision::new(),
            mcts: Mcts::new(seed),
            obstacles: Obstacles::new(config.obstacles.clone(), seed),
            analytics: Analytics::new(),
            planner: config.planner,
            tick_budget: config.run.tick_budget,
            world: World::new(grid, config),
            outcome: None,
        };
        simulation.setup(commands)
    }
}

/// Tick-driven simulation of one warehouse run.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    decision: Decision,
    mcts: Mcts,
    obstacles: Obstacles,
    analytics: Analytics,
    planner: PlannerKind,
    tick_budget: u64,
    outcome: Option<RunOutcome>,
}

impl Simulation {
    /// Starts configuring a run on the provided map.
    #[must_use]
    pub fn builder(grid: Grid, config: SimConfig) -> SimulationBuilder {
        SimulationBuilder {
            grid,
            config,
            spawns: None,
            ledger: None,
        }
    }

    fn setup(mut self, commands: Vec<Command>) -> Result<Self, SetupError> {
        let mut events = Vec::new();
        for command in commands {
            apply(&mut self.world, command, &mut events);
        }
        if let Some((cell, reason)) = events.iter().find_map(|event| match event {
            Event::SpawnRejected { cell, reason } => Some((*cell, *reason)),
            _ => None,
        }) {
            return Err(SetupError::SpawnRejected { cell, reason });
        }

        self.analytics.handle(&events);
        self.outcome = self.analytics.preflight();
        if let Some(outcome) = self.outcome {
            info!(?outcome, "run skipped");
        }
        Ok(self)
    }

    /// Read-only access to the simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Metrics accumulated so far.
    #[must_use]
    pub fn metrics(&self) -> &RunMetrics {
        self.analytics.metrics()
    }

    /// Terminal outcome, once reached.
    #[must_use]
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    /// Advances the run by one tick.
    ///
    /// The obstacle routine runs first, then every robot alive at the start of
    /// the tick decides and acts in id order, then the run is evaluated.
    pub fn step(&mut self) -> TickStatus {
        if let Some(outcome) = self.outcome {
            return TickStatus::Finished(outcome);
        }
        let started = Instant::now();

        let mut events = Vec::new();
        apply(&mut self.world, Command::Tick, &mut events);

        let mut commands = Vec::new();
        self.obstacles.handle(
            &events,
            query::grid(&self.world),
            query::roster(&self.world),
            query::dynamic_obstacles(&self.world),
            &mut commands,
        );
        for command in commands.drain(..) {
            apply(&mut self.world, command, &mut events);
        }

        let robots: Vec<RobotId> = query::roster(&self.world).alive().collect();
        let lead = robots.first().copied();
        for robot in robots {
            self.plan(robot, lead, &mut commands);
            for command in commands.drain(..) {
                apply(&mut self.world, command, &mut events);
            }
        }

        self.analytics.handle(&events);
        self.analytics.record_wall_clock(started.elapsed());
        match self.analytics.evaluate(self.tick_budget) {
            Some(outcome) => {
                self.outcome = Some(outcome);
                info!(
                    ?outcome,
                    ticks = self.analytics.metrics().ticks,
                    retrieved = self.analytics.metrics().items_retrieved,
                    "run finished"
                );
                TickStatus::Finished(outcome)
            }
            None => TickStatus::Running,
        }
    }

    fn plan(&mut self, robot: RobotId, lead: Option<RobotId>, out: &mut Vec<Command>) {
        let search = match self.planner {
            PlannerKind::Heuristic => false,
            PlannerKind::Mcts => true,
            PlannerKind::Mixed => lead == Some(robot),
        };
        if search {
            if let Some(state) = query::planning_state(&self.world, robot) {
                if self.mcts.handle(state, out) {
                    return;
                }
                debug!(robot = robot.get(), "tree search found no action");
            }
        }
        if let Some(view) = query::robot_view(&self.world, robot) {
            self.decision.handle(&view, out);
        }
    }

    /// Runs until the run ends and reports the result.
    pub fn run(mut self) -> RunReport {
        info!(
            robots = query::roster(&self.world).len(),
            ledger = query::ledger(&self.world).outstanding_count(),
            planner = ?self.planner,
            "run started"
        );
        let outcome = loop {
            if let TickStatus::Finished(outcome) = self.step() {
                break outcome;
            }
        };
        RunReport {
            outcome,
            metrics: self.analytics.into_metrics(),
        }
    }
}
