#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the warehouse simulator.

mod grid;
mod knowledge;
mod ledger;
mod robot;
mod roster;
mod sandbox;
mod sight;

use std::{collections::BTreeSet, sync::Arc};

use tracing::{debug, info};
use warehouse_core::{
    CellCoord, Command, Direction, Event, ObstacleError, RobotAction, RobotId, RobotMode,
    SimConfig, SpawnError, TileKind,
};

pub use grid::{Bounds, Grid, LoadError, TileSource, TileStore};
pub use knowledge::KnowledgeMap;
pub use ledger::ItemLedger;
pub use robot::{Cargo, Robot, VisitHistory};
pub use roster::{ActionOutcome, Roster};
pub use sandbox::{PlanningState, PlanningStep};
pub use sight::{scan, sight_line};

/// Represents the authoritative warehouse world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    config: Arc<SimConfig>,
    knowledge: Vec<KnowledgeMap>,
    roster: Roster,
    ledger: ItemLedger,
    dynamic_obstacles: BTreeSet<CellCoord>,
    tick_index: u64,
}

impl World {
    /// Creates a world over the provided ground truth with no robots and an empty ledger.
    #[must_use]
    pub fn new(grid: Grid, config: SimConfig) -> Self {
        Self {
            grid,
            config: Arc::new(config),
            knowledge: Vec::new(),
            roster: Roster::default(),
            ledger: ItemLedger::default(),
            dynamic_obstacles: BTreeSet::new(),
            tick_index: 0,
        }
    }

    fn knowledge_slot(&self, robot: RobotId) -> usize {
        if self.config.fleet.shared_knowledge {
            0
        } else {
            usize::try_from(robot.get()).unwrap_or(usize::MAX)
        }
    }

    fn spawn_robot(&mut self, cell: CellCoord, facing: Direction, out_events: &mut Vec<Event>) {
        let rejection = match self.grid.tile(cell) {
            None => Some(SpawnError::OutOfBounds),
            Some(tile) if !tile.kind().is_traversable() => Some(SpawnError::Blocked),
            Some(_) if self.roster.is_occupied(cell) => Some(SpawnError::Occupied),
            Some(_) => None,
        };
        if let Some(reason) = rejection {
            debug!(?cell, ?reason, "spawn rejected");
            out_events.push(Event::SpawnRejected { cell, reason });
            return;
        }

        let id = RobotId::new(u32::try_from(self.roster.len()).unwrap_or(u32::MAX));
        let bounds = self.grid.bounds();
        self.roster.spawn(Robot::new(
            id,
            cell,
            facing,
            self.config.cargo.weight_capacity,
            bounds,
        ));
        if self.config.fleet.shared_knowledge {
            if self.knowledge.is_empty() {
                self.knowledge.push(KnowledgeMap::empty(bounds));
            }
        } else {
            self.knowledge.push(KnowledgeMap::empty(bounds));
        }

        self.observe(id);
        out_events.push(Event::RobotSpawned { robot: id, cell });
    }

    fn act(
        &mut self,
        id: RobotId,
        mode: RobotMode,
        action: RobotAction,
        out_events: &mut Vec<Event>,
    ) {
        let Some(robot) = self.roster.get_mut(id) else {
            return;
        };
        let was_alive = robot.is_alive();
        robot.set_mode(mode);
        let had_outstanding = !self.ledger.is_cleared();

        let outcome = self.roster.perform(
            id,
            action,
            &mut self.grid,
            &mut self.ledger,
            &self.config,
        );
        out_events.push(Event::ActionResolved {
            robot: id,
            action,
            success: outcome.succeeded(),
        });

        match outcome {
            ActionOutcome::Took(item) => out_events.push(Event::ItemTaken {
                robot: id,
                item: item.id(),
            }),
            ActionOutcome::Collected { from, count } => out_events.push(Event::ItemsTransferred {
                from,
                to: id,
                count,
            }),
            ActionOutcome::Passed { to } => out_events.push(Event::ItemsTransferred {
                from: id,
                to,
                count: 1,
            }),
            ActionOutcome::Submitted { count } => {
                out_events.push(Event::ItemsSubmitted { robot: id, count });
            }
            ActionOutcome::Rejected | ActionOutcome::Completed | ActionOutcome::Moved { .. } => {}
        }

        self.observe(id);

        if let Some(robot) = self.roster.get(id) {
            if was_alive && !robot.is_alive() {
                info!(robot = id.get(), cell = ?robot.cell(), "robot battery depleted");
                out_events.push(Event::RobotDied {
                    robot: id,
                    cell: robot.cell(),
                });
            }
        }

        if had_outstanding && self.ledger.is_cleared() {
            info!(tick = self.tick_index, "ledger cleared");
            out_events.push(Event::LedgerCleared);
        }
    }

    /// Sight scan followed by a visit-history update for the robot.
    fn observe(&mut self, id: RobotId) {
        let slot = self.knowledge_slot(id);
        let Some(robot) = self.roster.get_mut(id) else {
            return;
        };
        let (cell, facing) = (robot.cell(), robot.facing());
        if let Some(knowledge) = self.knowledge.get_mut(slot) {
            let _ = scan(&self.grid, knowledge, cell, facing, &self.config.sight);
        }
        robot.update_history();
    }

    fn place_obstacle(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let rejection = match self.grid.tile(cell) {
            None => Some(ObstacleError::OutOfBounds),
            Some(tile) if tile.kind() != TileKind::Floor => Some(ObstacleError::NotFloor),
            Some(_) if self.roster.is_occupied(cell) => Some(ObstacleError::Occupied),
            Some(_) => None,
        };
        match (rejection, self.grid.tile_mut(cell)) {
            (None, Some(tile)) => {
                tile.set_kind(TileKind::Obstacle);
                let _ = self.dynamic_obstacles.insert(cell);
                out_events.push(Event::ObstaclePlaced { cell });
            }
            (reason, _) => {
                let reason = reason.unwrap_or(ObstacleError::OutOfBounds);
                debug!(?cell, ?reason, "obstacle rejected");
                out_events.push(Event::ObstacleRejected { cell, reason });
            }
        }
    }

    fn clear_obstacle(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if !self.dynamic_obstacles.remove(&cell) {
            out_events.push(Event::ObstacleRejected {
                cell,
                reason: ObstacleError::NotDynamic,
            });
            return;
        }
        if let Some(tile) = self.grid.tile_mut(cell) {
            tile.set_kind(TileKind::Floor);
        }
        out_events.push(Event::ObstacleCleared { cell });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnRobot { cell, facing } => world.spawn_robot(cell, facing, out_events),
        Command::AssignLedger { items } => {
            world.ledger = ItemLedger::new(items);
            out_events.push(Event::LedgerAssigned {
                entries: world.ledger.outstanding_count(),
            });
        }
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
        }
        Command::Act {
            robot,
            mode,
            action,
        } => world.act(robot, mode, action, out_events),
        Command::PlaceObstacle { cell } => world.place_obstacle(cell, out_events),
        Command::ClearObstacle { cell } => world.clear_obstacle(cell, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use super::{Grid, ItemLedger, KnowledgeMap, PlanningState, Robot, Roster, World};
    use warehouse_core::{CellCoord, RobotId, SimConfig};

    /// Ground-truth layout, including dynamic obstacles.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Tuning the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimConfig {
        &world.config
    }

    /// Every robot of the run.
    #[must_use]
    pub fn roster(world: &World) -> &Roster {
        &world.roster
    }

    /// Outstanding items.
    #[must_use]
    pub fn ledger(world: &World) -> &ItemLedger {
        &world.ledger
    }

    /// Number of ticks executed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Obstacles placed by the cycling routine that are still standing.
    #[must_use]
    pub fn dynamic_obstacles(world: &World) -> &BTreeSet<CellCoord> {
        &world.dynamic_obstacles
    }

    /// Knowledge map used by the robot.
    #[must_use]
    pub fn knowledge(world: &World, robot: RobotId) -> Option<&KnowledgeMap> {
        world.knowledge.get(world.knowledge_slot(robot))
    }

    /// Everything a planner may consult when choosing the robot's next action.
    #[must_use]
    pub fn robot_view(world: &World, robot: RobotId) -> Option<RobotView<'_>> {
        Some(RobotView {
            robot: world.roster.get(robot)?,
            knowledge: knowledge(world, robot)?,
            roster: &world.roster,
            ledger: &world.ledger,
            config: &world.config,
        })
    }

    /// Detached snapshot of the robot's view for lookahead planning.
    #[must_use]
    pub fn planning_state(world: &World, robot: RobotId) -> Option<PlanningState> {
        let _ = world.roster.get(robot)?;
        Some(PlanningState::new(
            robot,
            knowledge(world, robot)?.clone(),
            world.roster.clone(),
            world.ledger.clone(),
            world.config.clone(),
        ))
    }

    /// Read-only bundle of the state one robot plans against.
    ///
    /// Other robots' positions come from the live roster; tiles come only from
    /// the robot's knowledge map.
    #[derive(Clone, Copy, Debug)]
    pub struct RobotView<'a> {
        /// Robot being planned for.
        pub robot: &'a Robot,
        /// Tiles the robot knows about.
        pub knowledge: &'a KnowledgeMap,
        /// Every robot of the run.
        pub roster: &'a Roster,
        /// Outstanding items.
        pub ledger: &'a ItemLedger,
        /// Run tuning.
        pub config: &'a SimConfig,
    }
}
