//! Fleet of robots and the atomic actions they perform.
//!
//! Every action either applies completely and pays its battery cost, or is
//! rejected without touching any state. Actions validate against a
//! [`TileStore`], which is ground truth for the live world and a knowledge map
//! inside a planning sandbox.

use warehouse_core::{
    CellCoord, Direction, ItemId, RobotAction, RobotId, SimConfig, StockItem, TileKind, Vertical,
    BATTERY_MAX,
};

use crate::{grid::TileStore, ledger::ItemLedger, robot::Robot};

/// Result of an attempted action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action was refused and nothing changed.
    Rejected,
    /// The action succeeded without moving the robot or any item.
    Completed,
    /// The robot changed cell.
    Moved {
        /// Cell the robot left.
        from: CellCoord,
        /// Cell the robot entered.
        to: CellCoord,
    },
    /// The robot took an item from a shelf.
    Took(StockItem),
    /// The robot collected items from a dead robot.
    Collected {
        /// Robot that held the items.
        from: RobotId,
        /// Number of items moved.
        count: u32,
    },
    /// The robot handed an item to a neighbour.
    Passed {
        /// Robot that received the item.
        to: RobotId,
    },
    /// The robot submitted items at an exit.
    Submitted {
        /// Number of ledger entries cleared.
        count: u32,
    },
}

impl ActionOutcome {
    /// Reports whether the action changed state.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Robots of a run ordered by identifier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roster {
    robots: Vec<Robot>,
}

impl Roster {
    /// Every robot, alive or dead, in identifier order.
    #[must_use]
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    /// Number of robots in the fleet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.robots.len()
    }

    /// Reports whether the fleet is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }

    /// Robot with the provided identifier.
    #[must_use]
    pub fn get(&self, id: RobotId) -> Option<&Robot> {
        self.robots.iter().find(|robot| robot.id() == id)
    }

    /// Robot standing on the cell. Dead robots keep occupying their cell.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<&Robot> {
        self.robots.iter().find(|robot| robot.cell() == cell)
    }

    /// Reports whether any robot stands on the cell.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.occupant(cell).is_some()
    }

    /// Identifiers of robots that still have charge.
    pub fn alive(&self) -> impl Iterator<Item = RobotId> + '_ {
        self.robots
            .iter()
            .filter(|robot| robot.is_alive())
            .map(Robot::id)
    }

    /// Number of robots without charge.
    #[must_use]
    pub fn dead_count(&self) -> usize {
        self.robots.iter().filter(|robot| !robot.is_alive()).count()
    }

    /// Every item carried anywhere in the fleet.
    pub fn carried_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.robots
            .iter()
            .flat_map(|robot| robot.cargo().item_ids())
    }

    pub(crate) fn spawn(&mut self, robot: Robot) {
        self.robots.push(robot);
    }

    pub(crate) fn get_mut(&mut self, id: RobotId) -> Option<&mut Robot> {
        self.robots.iter_mut().find(|robot| robot.id() == id)
    }

    fn index_of(&self, id: RobotId) -> Option<usize> {
        self.robots.iter().position(|robot| robot.id() == id)
    }

    /// Attempts one action on behalf of `id`.
    pub fn perform(
        &mut self,
        id: RobotId,
        action: RobotAction,
        tiles: &mut impl TileStore,
        ledger: &mut ItemLedger,
        config: &SimConfig,
    ) -> ActionOutcome {
        let Some(index) = self.index_of(id) else {
            return ActionOutcome::Rejected;
        };
        if !self.robots[index].is_alive() {
            return ActionOutcome::Rejected;
        }

        match action {
            RobotAction::Turn(direction) => self.turn(index, direction, config),
            RobotAction::Move => {
                let facing = self.robots[index].facing();
                self.step(index, facing, &*tiles, config)
            }
            RobotAction::TakeShelfItem => {
                let facing = self.robots[index].facing();
                self.take_shelf_item(index, facing, tiles, config)
            }
            RobotAction::TakeShelfItemFrom(direction) => {
                self.take_shelf_item(index, direction, tiles, config)
            }
            RobotAction::TakeRobotItems(direction) => {
                self.take_robot_items(index, direction, &*tiles, config)
            }
            RobotAction::Charge => self.charge(index, &*tiles, config),
            RobotAction::UseElevator(vertical) => {
                self.use_elevator(index, vertical, &*tiles, config)
            }
            RobotAction::PassItem { item, direction } => {
                self.pass_item(index, item, direction, &*tiles, config)
            }
            RobotAction::SubmitItems => self.submit_items(index, &*tiles, ledger, config),
            RobotAction::Wait => ActionOutcome::Completed,
        }
    }

    fn neighbor(
        &self,
        index: usize,
        direction: Direction,
        tiles: &impl TileStore,
    ) -> Option<CellCoord> {
        tiles.bounds().step(self.robots[index].cell(), direction)
    }

    fn neighbor_index(
        &self,
        index: usize,
        direction: Direction,
        tiles: &impl TileStore,
    ) -> Option<usize> {
        let cell = self.neighbor(index, direction, tiles)?;
        self.robots.iter().position(|robot| robot.cell() == cell)
    }

    fn turn(&mut self, index: usize, direction: Direction, config: &SimConfig) -> ActionOutcome {
        let robot = &mut self.robots[index];
        if robot.facing() == direction {
            return ActionOutcome::Rejected;
        }
        robot.set_facing(direction);
        robot.spend(config.battery.move_cost);
        ActionOutcome::Completed
    }

    fn step(
        &mut self,
        index: usize,
        direction: Direction,
        tiles: &impl TileStore,
        config: &SimConfig,
    ) -> ActionOutcome {
        let cargo = self.robots[index].cargo();
        if cargo.weight() > cargo.capacity() {
            return ActionOutcome::Rejected;
        }
        let Some(to) = self.neighbor(index, direction, tiles) else {
            return ActionOutcome::Rejected;
        };
        if !tiles.is_passable(to) || self.is_occupied(to) {
            return ActionOutcome::Rejected;
        }

        let robot = &mut self.robots[index];
        let from = robot.cell();
        robot.set_cell(to);
        robot.spend(config.battery.move_cost);
        ActionOutcome::Moved { from, to }
    }

    fn take_shelf_item(
        &mut self,
        index: usize,
        direction: Direction,
        tiles: &mut impl TileStore,
        config: &SimConfig,
    ) -> ActionOutcome {
        let Some(shelf) = self.neighbor(index, direction, tiles) else {
            return ActionOutcome::Rejected;
        };
        let Some(tile) = tiles.known_tile(shelf) else {
            return ActionOutcome::Rejected;
        };
        if tile.kind().shelf_access() != Some(direction.opposite()) {
            return ActionOutcome::Rejected;
        }
        let Some(item) = tile.item() else {
            return ActionOutcome::Rejected;
        };
        if !self.robots[index].cargo().can_fit(item) {
            return ActionOutcome::Rejected;
        }
        let Some(item) = tiles.take_item(shelf) else {
            return ActionOutcome::Rejected;
        };

        let robot = &mut self.robots[index];
        if !robot.cargo_mut().insert(item) {
            return ActionOutcome::Rejected;
        }
        robot.spend(config.battery.take_cost);
        ActionOutcome::Took(item)
    }

    fn take_robot_items(
        &mut self,
        index: usize,
        direction: Direction,
        tiles: &impl TileStore,
        config: &SimConfig,
    ) -> ActionOutcome {
        let Some(other) = self.neighbor_index(index, direction, tiles) else {
            return ActionOutcome::Rejected;
        };
        if self.robots[other].is_alive() || self.robots[other].cargo().is_empty() {
            return ActionOutcome::Rejected;
        }

        let mut receiving = *self.robots[index].cargo();
        let transferable: Vec<StockItem> = self.robots[other]
            .cargo()
            .items()
            .filter(|item| receiving.insert(*item))
            .collect();
        if transferable.is_empty() {
            return ActionOutcome::Rejected;
        }

        let from = self.robots[other].id();
        for item in &transferable {
            let _ = self.robots[other].cargo_mut().remove(item.id());
        }
        let robot = &mut self.robots[index];
        *robot.cargo_mut() = receiving;
        robot.spend(config.battery.take_cost);
        ActionOutcome::Collected {
            from,
            count: u32::try_from(transferable.len()).unwrap_or(u32::MAX),
        }
    }

    fn charge(
        &mut self,
        index: usize,
        tiles: &impl TileStore,
        config: &SimConfig,
    ) -> ActionOutcome {
        let robot = &mut self.robots[index];
        let on_charger = tiles
            .known_tile(robot.cell())
            .is_some_and(|tile| tile.kind() == TileKind::Charger);
        if !on_charger || robot.battery() >= BATTERY_MAX {
            return ActionOutcome::Rejected;
        }
        robot.recharge(config.battery.charge_gain);
        ActionOutcome::Completed
    }

    fn use_elevator(
        &mut self,
        index: usize,
        vertical: Vertical,
        tiles: &impl TileStore,
        config: &SimConfig,
    ) -> ActionOutcome {
        let from = self.robots[index].cell();
        let on_elevator = tiles
            .known_tile(from)
            .is_some_and(|tile| tile.kind() == TileKind::Elevator);
        if !on_elevator {
            return ActionOutcome::Rejected;
        }
        let Some(to) = tiles.bounds().elevator_destination(from, vertical) else {
            return ActionOutcome::Rejected;
        };
        if !tiles.is_passable(to) || self.is_occupied(to) {
            return ActionOutcome::Rejected;
        }

        let robot = &mut self.robots[index];
        robot.set_cell(to);
        robot.spend(config.battery.elevator_cost);
        ActionOutcome::Moved { from, to }
    }

    fn pass_item(
        &mut self,
        index: usize,
        item: ItemId,
        direction: Direction,
        tiles: &impl TileStore,
        config: &SimConfig,
    ) -> ActionOutcome {
        let Some(other) = self.neighbor_index(index, direction, tiles) else {
            return ActionOutcome::Rejected;
        };
        let Some(stock) = self.robots[index]
            .cargo()
            .items()
            .find(|carried| carried.id() == item)
        else {
            return ActionOutcome::Rejected;
        };
        let receiver = &self.robots[other];
        if !receiver.is_alive() || !receiver.cargo().can_fit(stock) {
            return ActionOutcome::Rejected;
        }

        let to = receiver.id();
        let _ = self.robots[index].cargo_mut().remove(item);
        let _ = self.robots[other].cargo_mut().insert(stock);
        self.robots[index].spend(config.battery.pass_cost);
        ActionOutcome::Passed { to }
    }

    fn submit_items(
        &mut self,
        index: usize,
        tiles: &impl TileStore,
        ledger: &mut ItemLedger,
        config: &SimConfig,
    ) -> ActionOutcome {
        let robot = &mut self.robots[index];
        let on_exit = tiles
            .known_tile(robot.cell())
            .is_some_and(|tile| tile.kind() == TileKind::Exit);
        if !on_exit {
            return ActionOutcome::Rejected;
        }

        let carried: Vec<ItemId> = robot.cargo().item_ids().collect();
        let mut count = 0_u32;
        for item in carried {
            if ledger.clear_one(item) {
                let _ = robot.cargo_mut().remove(item);
                count += 1;
            }
        }
        if count == 0 {
            return ActionOutcome::Rejected;
        }
        robot.spend(config.battery.submit_cost_per_item * count as f32);
        ActionOutcome::Submitted { count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn roster_on(grid: &Grid, robots: &[(u32, u32, Direction)]) -> Roster {
        let mut roster = Roster::default();
        for (index, (column, row, facing)) in robots.iter().enumerate() {
            roster.spawn(Robot::new(
                RobotId::new(index as u32),
                CellCoord::new(*column, *row),
                *facing,
                6,
                grid.bounds(),
            ));
        }
        roster
    }

    fn robot(roster: &Roster, id: u32) -> &Robot {
        roster.get(RobotId::new(id)).expect("robot exists")
    }

    #[test]
    fn move_off_the_west_edge_fails_without_cost() {
        let mut grid = Grid::parse("1 1 1", 3, 1).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::West)]);
        let mut ledger = ItemLedger::default();

        let outcome = roster.perform(
            RobotId::new(0),
            RobotAction::Move,
            &mut grid,
            &mut ledger,
            &SimConfig::default(),
        );

        assert_eq!(outcome, ActionOutcome::Rejected);
        assert_eq!(robot(&roster, 0).battery(), BATTERY_MAX);
        assert_eq!(robot(&roster, 0).cell(), CellCoord::new(0, 0));
    }

    #[test]
    fn successful_move_pays_exactly_the_move_cost() {
        let mut grid = Grid::parse("1 1 1", 3, 1).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::East)]);
        let mut ledger = ItemLedger::default();
        let config = SimConfig::default();

        let outcome = roster.perform(
            RobotId::new(0),
            RobotAction::Move,
            &mut grid,
            &mut ledger,
            &config,
        );

        assert!(outcome.succeeded());
        assert_eq!(robot(&roster, 0).cell(), CellCoord::new(1, 0));
        assert_eq!(
            robot(&roster, 0).battery(),
            BATTERY_MAX - config.battery.move_cost
        );
    }

    #[test]
    fn robots_block_each_other() {
        let mut grid = Grid::parse("1 1", 2, 1).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::East), (1, 0, Direction::West)]);
        let mut ledger = ItemLedger::default();

        let outcome = roster.perform(
            RobotId::new(0),
            RobotAction::Move,
            &mut grid,
            &mut ledger,
            &SimConfig::default(),
        );
        assert_eq!(outcome, ActionOutcome::Rejected);
    }

    #[test]
    fn turning_toward_the_current_facing_fails() {
        let mut grid = Grid::parse("1", 1, 1).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::North)]);
        let mut ledger = ItemLedger::default();
        let config = SimConfig::default();

        assert!(!roster
            .perform(
                RobotId::new(0),
                RobotAction::Turn(Direction::North),
                &mut grid,
                &mut ledger,
                &config
            )
            .succeeded());
        assert!(roster
            .perform(
                RobotId::new(0),
                RobotAction::Turn(Direction::South),
                &mut grid,
                &mut ledger,
                &config
            )
            .succeeded());
        assert_eq!(robot(&roster, 0).facing(), Direction::South);
    }

    #[test]
    fn shelves_only_yield_from_their_access_side() {
        // Shelf at (1,0) is accessed from the south, i.e. from (1,1).
        let mut grid = Grid::parse("1 4:7 1\n1 1 1", 3, 2).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::East), (1, 1, Direction::North)]);
        let mut ledger = ItemLedger::default();
        let config = SimConfig::default();

        let wrong_side = roster.perform(
            RobotId::new(0),
            RobotAction::TakeShelfItem,
            &mut grid,
            &mut ledger,
            &config,
        );
        assert_eq!(wrong_side, ActionOutcome::Rejected);

        let right_side = roster.perform(
            RobotId::new(1),
            RobotAction::TakeShelfItem,
            &mut grid,
            &mut ledger,
            &config,
        );
        assert!(matches!(right_side, ActionOutcome::Took(item) if item.id() == ItemId::new(7)));
        assert_eq!(
            grid.tile(CellCoord::new(1, 0)).and_then(|tile| tile.item()),
            None
        );
    }

    #[test]
    fn shelf_items_heavier_than_the_free_capacity_stay_put() {
        let mut grid = Grid::parse("1 5:3:7", 2, 1).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::East)]);
        let mut ledger = ItemLedger::default();

        let outcome = roster.perform(
            RobotId::new(0),
            RobotAction::TakeShelfItem,
            &mut grid,
            &mut ledger,
            &SimConfig::default(),
        );

        assert_eq!(outcome, ActionOutcome::Rejected);
        assert!(robot(&roster, 0).cargo().is_empty());
        assert!(grid.stocked_items().next().is_some());
    }

    #[test]
    fn charging_a_full_battery_is_rejected() {
        let mut grid = Grid::parse("6", 1, 1).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::North)]);
        let mut ledger = ItemLedger::default();

        for _ in 0..3 {
            let outcome = roster.perform(
                RobotId::new(0),
                RobotAction::Charge,
                &mut grid,
                &mut ledger,
                &SimConfig::default(),
            );
            assert_eq!(outcome, ActionOutcome::Rejected);
            assert_eq!(robot(&roster, 0).battery(), BATTERY_MAX);
        }
    }

    #[test]
    fn charging_caps_at_the_maximum() {
        let mut grid = Grid::parse("6 1", 2, 1).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::South)]);
        let mut ledger = ItemLedger::default();
        let config = SimConfig::default();

        assert!(roster
            .perform(
                RobotId::new(0),
                RobotAction::Turn(Direction::East),
                &mut grid,
                &mut ledger,
                &config
            )
            .succeeded());
        assert!(roster
            .perform(RobotId::new(0), RobotAction::Charge, &mut grid, &mut ledger, &config)
            .succeeded());
        assert_eq!(robot(&roster, 0).battery(), BATTERY_MAX);
    }

    #[test]
    fn dead_robots_hand_over_what_fits() {
        let mut grid = Grid::parse("1 4:1:4 4:2:4\n1 1 1", 3, 2).expect("valid map");
        let mut roster = roster_on(&grid, &[(1, 1, Direction::North), (2, 1, Direction::North)]);
        let mut ledger = ItemLedger::default();
        let config = SimConfig::default();

        assert!(roster
            .perform(RobotId::new(0), RobotAction::TakeShelfItem, &mut grid, &mut ledger, &config)
            .succeeded());
        assert!(roster
            .perform(RobotId::new(1), RobotAction::TakeShelfItem, &mut grid, &mut ledger, &config)
            .succeeded());

        let rescue = RobotAction::TakeRobotItems(Direction::West);
        assert_eq!(
            roster.perform(RobotId::new(1), rescue, &mut grid, &mut ledger, &config),
            ActionOutcome::Rejected
        );

        roster
            .get_mut(RobotId::new(0))
            .expect("robot exists")
            .spend(BATTERY_MAX);

        // 4 + 4 exceeds the capacity of 6.
        assert_eq!(
            roster.perform(RobotId::new(1), rescue, &mut grid, &mut ledger, &config),
            ActionOutcome::Rejected
        );
    }

    #[test]
    fn rescue_moves_items_from_the_dead_robot() {
        let mut grid = Grid::parse("1 4:1:2 1\n1 1 1", 3, 2).expect("valid map");
        let mut roster = roster_on(&grid, &[(1, 1, Direction::North), (2, 1, Direction::West)]);
        let mut ledger = ItemLedger::default();
        let config = SimConfig::default();

        assert!(roster
            .perform(RobotId::new(0), RobotAction::TakeShelfItem, &mut grid, &mut ledger, &config)
            .succeeded());
        roster
            .get_mut(RobotId::new(0))
            .expect("robot exists")
            .spend(BATTERY_MAX);

        let outcome = roster.perform(
            RobotId::new(1),
            RobotAction::TakeRobotItems(Direction::West),
            &mut grid,
            &mut ledger,
            &config,
        );

        assert_eq!(
            outcome,
            ActionOutcome::Collected {
                from: RobotId::new(0),
                count: 1
            }
        );
        assert!(robot(&roster, 0).cargo().is_empty());
        assert!(robot(&roster, 1).cargo().contains(ItemId::new(1)));
    }

    #[test]
    fn pass_item_requires_a_live_neighbour_with_room() {
        let mut grid = Grid::parse("4:3:1 1\n1 1", 2, 2).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 1, Direction::North), (1, 1, Direction::West)]);
        let mut ledger = ItemLedger::default();
        let config = SimConfig::default();

        assert!(roster
            .perform(RobotId::new(0), RobotAction::TakeShelfItem, &mut grid, &mut ledger, &config)
            .succeeded());

        let pass = RobotAction::PassItem {
            item: ItemId::new(3),
            direction: Direction::East,
        };
        assert_eq!(
            roster.perform(RobotId::new(0), pass, &mut grid, &mut ledger, &config),
            ActionOutcome::Passed {
                to: RobotId::new(1)
            }
        );
        assert!(robot(&roster, 1).cargo().contains(ItemId::new(3)));
        assert!(robot(&roster, 0).cargo().is_empty());

        // Nothing left to pass.
        assert_eq!(
            roster.perform(RobotId::new(0), pass, &mut grid, &mut ledger, &config),
            ActionOutcome::Rejected
        );
    }

    #[test]
    fn submit_clears_only_matching_entries() {
        let mut grid = Grid::parse("4:5:1 1\n8 1", 2, 2).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 1, Direction::North)]);
        let mut ledger = ItemLedger::new([ItemId::new(2), ItemId::new(5), ItemId::new(5)]);
        let config = SimConfig::default();

        assert!(roster
            .perform(RobotId::new(0), RobotAction::TakeShelfItem, &mut grid, &mut ledger, &config)
            .succeeded());
        let outcome = roster.perform(
            RobotId::new(0),
            RobotAction::SubmitItems,
            &mut grid,
            &mut ledger,
            &config,
        );

        assert_eq!(outcome, ActionOutcome::Submitted { count: 1 });
        assert_eq!(
            ledger.entries(),
            &[Some(ItemId::new(2)), None, Some(ItemId::new(5))]
        );
        assert_eq!(
            roster.perform(
                RobotId::new(0),
                RobotAction::SubmitItems,
                &mut grid,
                &mut ledger,
                &config
            ),
            ActionOutcome::Rejected
        );
    }

    #[test]
    fn dead_robots_cannot_even_wait() {
        let mut grid = Grid::parse("1", 1, 1).expect("valid map");
        let mut roster = roster_on(&grid, &[(0, 0, Direction::North)]);
        let mut ledger = ItemLedger::default();
        roster
            .get_mut(RobotId::new(0))
            .expect("robot exists")
            .spend(BATTERY_MAX);

        assert_eq!(
            roster.perform(
                RobotId::new(0),
                RobotAction::Wait,
                &mut grid,
                &mut ledger,
                &SimConfig::default()
            ),
            ActionOutcome::Rejected
        );
    }
}
