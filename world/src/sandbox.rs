//! Throwaway copies of a robot's view of the world used for lookahead.

use std::sync::Arc;

use warehouse_core::{CellCoord, RobotAction, RobotId, SimConfig, TileKind};

use crate::{
    grid::TileSource,
    knowledge::KnowledgeMap,
    ledger::ItemLedger,
    robot::Robot,
    roster::{ActionOutcome, Roster},
    sight::sight_line,
};

/// Snapshot of everything one robot knows, mutable without touching the live world.
///
/// Actions validate against the robot's knowledge map, so unknown cells are
/// never entered and never filled in. Clones share storage until written.
#[derive(Clone, Debug)]
pub struct PlanningState {
    robot: RobotId,
    knowledge: KnowledgeMap,
    roster: Roster,
    ledger: ItemLedger,
    config: Arc<SimConfig>,
}

/// Facts produced by one sandboxed action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanningStep {
    /// Result reported by the robot.
    pub outcome: ActionOutcome,
    /// First unknown cell on the robot's sight line after the action.
    pub sighted: Option<CellCoord>,
}

impl PlanningState {
    pub(crate) fn new(
        robot: RobotId,
        knowledge: KnowledgeMap,
        roster: Roster,
        ledger: ItemLedger,
        config: Arc<SimConfig>,
    ) -> Self {
        Self {
            robot,
            knowledge,
            roster,
            ledger,
            config,
        }
    }

    /// Robot the snapshot plans for.
    #[must_use]
    pub const fn robot_id(&self) -> RobotId {
        self.robot
    }

    /// Current state of the planning robot.
    #[must_use]
    pub fn robot(&self) -> Option<&Robot> {
        self.roster.get(self.robot)
    }

    /// Ledger as seen inside the snapshot.
    #[must_use]
    pub const fn ledger(&self) -> &ItemLedger {
        &self.ledger
    }

    /// Knowledge map as seen inside the snapshot.
    #[must_use]
    pub const fn knowledge(&self) -> &KnowledgeMap {
        &self.knowledge
    }

    /// Tuning the snapshot was taken with.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Applies an action for the planning robot.
    pub fn apply(&mut self, action: RobotAction) -> PlanningStep {
        let outcome = self.roster.perform(
            self.robot,
            action,
            &mut self.knowledge,
            &mut self.ledger,
            &self.config,
        );
        PlanningStep {
            outcome,
            sighted: self.first_unknown_in_sight(),
        }
    }

    /// Straight-line distance from the robot to the closest known exit.
    #[must_use]
    pub fn nearest_exit_distance(&self) -> Option<f32> {
        let cell = self.robot()?.cell();
        self.knowledge
            .tiles_of_kind(TileKind::Exit)
            .map(|tile| tile.cell().euclidean_distance(cell))
            .min_by(f32::total_cmp)
    }

    fn first_unknown_in_sight(&self) -> Option<CellCoord> {
        let robot = self.robot()?;
        for cell in sight_line(
            self.knowledge.bounds(),
            robot.cell(),
            robot.facing(),
            self.config.sight.range,
        ) {
            match self.knowledge.known_tile(cell) {
                None => return Some(cell),
                Some(tile) if tile.kind().is_opaque() => return None,
                Some(_) => {}
            }
        }
        None
    }
}
