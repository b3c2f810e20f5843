#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rule-based decision system that picks one action per live robot and tick.
//!
//! Modes are considered in a fixed priority: finish charging, seek a charger
//! when the battery runs low, rescue cargo from dead robots, fetch needed
//! items, deliver them to an exit, and otherwise explore the frontier of the
//! robot's knowledge map.

use warehouse_core::{
    CellCoord, Command, Direction, RobotAction, RobotMode, StockItem, TileKind, Vertical,
    BATTERY_MAX,
};
use warehouse_world::{query::RobotView, TileSource};

/// Mode and action chosen for a robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Choice {
    /// Mode the robot is switched to.
    pub mode: RobotMode,
    /// Action attempted this tick.
    pub action: RobotAction,
}

impl Choice {
    /// Creates a new choice.
    #[must_use]
    pub const fn new(mode: RobotMode, action: RobotAction) -> Self {
        Self { mode, action }
    }
}

/// Stateless heuristic planner. All memory lives on the robot itself.
#[derive(Debug, Default)]
pub struct Decision;

impl Decision {
    /// Creates the decision system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Emits the action command for the robot behind `view`. Dead robots emit nothing.
    pub fn handle(&self, view: &RobotView<'_>, out: &mut Vec<Command>) {
        if let Some(choice) = self.choose(view) {
            out.push(Command::Act {
                robot: view.robot.id(),
                mode: choice.mode,
                action: choice.action,
            });
        }
    }

    /// Picks the mode and action for the robot behind `view`.
    #[must_use]
    pub fn choose(&self, view: &RobotView<'_>) -> Option<Choice> {
        let robot = view.robot;
        if !robot.is_alive() {
            return None;
        }
        let battery = &view.config.battery;

        if standing_on(view, TileKind::Charger)
            && robot.battery() < BATTERY_MAX
            && (robot.mode() == RobotMode::Charge || robot.battery() < battery.low_threshold)
        {
            return Some(Choice::new(RobotMode::Charge, RobotAction::Charge));
        }

        let charger = nearest(
            robot.cell(),
            view.knowledge
                .tiles_of_kind(TileKind::Charger)
                .map(|tile| tile.cell()),
        );
        if robot.battery() < battery.low_threshold {
            return Some(match charger {
                Some(goal) => navigate(view, RobotMode::Charge, Some(goal)),
                None => explore(view),
            });
        }
        if charger.is_none() && robot.battery() < battery.charger_search_threshold {
            return Some(explore(view));
        }

        if let Some(choice) = rescue(view) {
            return Some(choice);
        }
        if let Some(choice) = fetch(view) {
            return Some(choice);
        }
        if let Some(choice) = submit(view) {
            return Some(choice);
        }
        Some(explore(view))
    }
}

fn standing_on(view: &RobotView<'_>, kind: TileKind) -> bool {
    view.knowledge
        .known_tile(view.robot.cell())
        .is_some_and(|tile| tile.kind() == kind)
}

/// Closest cell by straight-line distance. Ties keep the earliest candidate.
fn nearest(from: CellCoord, cells: impl IntoIterator<Item = CellCoord>) -> Option<CellCoord> {
    let mut best: Option<(f32, CellCoord)> = None;
    for cell in cells {
        let distance = from.euclidean_distance(cell);
        if best.map_or(true, |(closest, _)| distance < closest) {
            best = Some((distance, cell));
        }
    }
    best.map(|(_, cell)| cell)
}

fn rescue(view: &RobotView<'_>) -> Option<Choice> {
    let robot = view.robot;
    if !robot.cargo().is_empty() || robot.battery() <= view.config.battery.rescue_threshold {
        return None;
    }
    let stranded = view
        .roster
        .robots()
        .iter()
        .filter(|other| other.id() != robot.id() && !other.is_alive() && !other.cargo().is_empty())
        .map(|other| other.cell());
    let target = nearest(robot.cell(), stranded)?;

    let bounds = view.knowledge.bounds();
    let adjacent = Direction::ALL
        .into_iter()
        .find(|direction| bounds.step(robot.cell(), *direction) == Some(target));
    Some(match adjacent {
        Some(direction) => Choice::new(RobotMode::Rescue, RobotAction::TakeRobotItems(direction)),
        None => navigate(view, RobotMode::Rescue, Some(target)),
    })
}

fn fetch(view: &RobotView<'_>) -> Option<Choice> {
    let robot = view.robot;
    let cargo = robot.cargo();
    let needed = view.ledger.still_needed(view.roster.carried_items());
    let lightest = needed
        .iter()
        .map(|id| {
            view.knowledge
                .known_tiles()
                .filter_map(|tile| tile.item())
                .find(|item| item.id() == *id)
                .unwrap_or_else(|| StockItem::with_default_weight(*id))
        })
        .min_by_key(|item| item.weight())?;
    if !cargo.can_fit(lightest) {
        return None;
    }

    let bounds = view.knowledge.bounds();
    let mut best: Option<(f32, CellCoord, Direction)> = None;
    for tile in view.knowledge.known_tiles() {
        let (Some(access), Some(item)) = (tile.kind().shelf_access(), tile.item()) else {
            continue;
        };
        if !needed.contains(&item.id()) || !cargo.can_fit(item) {
            continue;
        }
        let Some(stand) = bounds.step(tile.cell(), access) else {
            continue;
        };
        if view
            .knowledge
            .known_tile(stand)
            .is_some_and(|known| !known.kind().is_traversable())
        {
            continue;
        }
        let distance = robot.cell().euclidean_distance(stand);
        if best.map_or(true, |(closest, ..)| distance < closest) {
            best = Some((distance, stand, access.opposite()));
        }
    }

    match best {
        Some((_, stand, toward)) if robot.cell() == stand => {
            let action = if robot.facing() == toward {
                RobotAction::TakeShelfItem
            } else {
                RobotAction::Turn(toward)
            };
            Some(Choice::new(RobotMode::Fetch, action))
        }
        Some((_, stand, _)) => Some(navigate(view, RobotMode::Fetch, Some(stand))),
        None => view
            .knowledge
            .frontier()
            .next()
            .is_some()
            .then(|| explore(view)),
    }
}

fn submit(view: &RobotView<'_>) -> Option<Choice> {
    let robot = view.robot;
    if !robot.cargo().item_ids().any(|id| view.ledger.needs(id)) {
        return None;
    }
    let exits = view
        .knowledge
        .tiles_of_kind(TileKind::Exit)
        .map(|tile| tile.cell());
    let exit = nearest(robot.cell(), exits)?;
    if robot.cell() == exit {
        return Some(Choice::new(RobotMode::Submit, RobotAction::SubmitItems));
    }
    Some(navigate(view, RobotMode::Submit, Some(exit)))
}

/// Heads for the nearest frontier cell. Once none is left, rides elevators
/// whose destination has never been sighted.
fn explore(view: &RobotView<'_>) -> Choice {
    let robot = view.robot;
    let knowledge = view.knowledge;
    if let Some(goal) = nearest(robot.cell(), knowledge.frontier()) {
        return navigate(view, RobotMode::Explore, Some(goal));
    }

    let bounds = knowledge.bounds();
    let unexplored = |cell: CellCoord| {
        [Vertical::Up, Vertical::Down].into_iter().find(|vertical| {
            ride_is_clear(view, cell, *vertical)
                && bounds
                    .elevator_destination(cell, *vertical)
                    .is_some_and(|destination| !knowledge.is_known(destination))
        })
    };
    if standing_on(view, TileKind::Elevator) {
        if let Some(vertical) = unexplored(robot.cell()) {
            return Choice::new(RobotMode::Explore, RobotAction::UseElevator(vertical));
        }
    }
    let elevators = knowledge
        .tiles_of_kind(TileKind::Elevator)
        .map(|tile| tile.cell())
        .filter(|cell| unexplored(*cell).is_some());
    navigate(view, RobotMode::Explore, nearest(robot.cell(), elevators))
}

/// One greedy step toward `goal`.
///
/// Each neighbour scores `history_weight * visits + distance(neighbour, goal)`.
/// Known non-traversable cells and occupied cells are excluded; unknown cells
/// are allowed. The robot turns first when the best step is not ahead.
fn navigate(view: &RobotView<'_>, mode: RobotMode, goal: Option<CellCoord>) -> Choice {
    let robot = view.robot;
    let knowledge = view.knowledge;
    let bounds = knowledge.bounds();

    let mut goal = goal;
    if let Some(target) = goal {
        let (here, there) = (bounds.floor_of(robot.cell()), bounds.floor_of(target));
        if here != there {
            let vertical = if there < here {
                Vertical::Up
            } else {
                Vertical::Down
            };
            if standing_on(view, TileKind::Elevator)
                && ride_is_clear(view, robot.cell(), vertical)
            {
                return Choice::new(mode, RobotAction::UseElevator(vertical));
            }
            let elevators = knowledge
                .tiles_of_kind(TileKind::Elevator)
                .map(|tile| tile.cell())
                .filter(|cell| {
                    bounds.floor_of(*cell) == here && ride_is_clear(view, *cell, vertical)
                });
            if let Some(elevator) = nearest(robot.cell(), elevators) {
                goal = Some(elevator);
            }
        }
    }

    let weight = view.config.heuristic.history_weight;
    let mut open: Option<(f32, Direction, CellCoord)> = None;
    let mut free: Option<(f32, Direction)> = None;
    for direction in Direction::ALL {
        let Some(next) = bounds.step(robot.cell(), direction) else {
            continue;
        };
        if knowledge
            .known_tile(next)
            .is_some_and(|tile| !tile.kind().is_traversable())
        {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let visits = robot.visits(next) as f32;
        let cost = weight * visits + goal.map_or(0.0, |target| next.euclidean_distance(target));
        if open.map_or(true, |(best, ..)| cost < best) {
            open = Some((cost, direction, next));
        }
        if !view.roster.is_occupied(next) && free.map_or(true, |(best, _)| cost < best) {
            free = Some((cost, direction));
        }
    }

    if mode == RobotMode::Submit {
        if let Some(choice) = open.and_then(|(_, direction, next)| hand_over(view, direction, next)) {
            return choice;
        }
    }

    match free {
        None => Choice::new(mode, RobotAction::Wait),
        Some((_, direction)) if direction == robot.facing() => {
            Choice::new(mode, RobotAction::Move)
        }
        Some((_, direction)) => Choice::new(mode, RobotAction::Turn(direction)),
    }
}

/// Reports whether riding the elevator at `cell` lands on a cell that is free
/// and not known to be blocked.
fn ride_is_clear(view: &RobotView<'_>, cell: CellCoord, vertical: Vertical) -> bool {
    view.knowledge
        .bounds()
        .elevator_destination(cell, vertical)
        .is_some_and(|destination| {
            !view.roster.is_occupied(destination)
                && !view
                    .knowledge
                    .known_tile(destination)
                    .is_some_and(|tile| !tile.kind().is_traversable())
        })
}

/// Pass a needed item to a live robot blocking the best step toward the exit.
///
/// Robots already carrying outstanding items are not handed more, nor are
/// robots whose nearest known exit lies back past the giver.
fn hand_over(view: &RobotView<'_>, direction: Direction, next: CellCoord) -> Option<Choice> {
    let neighbour = view.roster.occupant(next).filter(|other| other.is_alive())?;
    if neighbour.cargo().item_ids().any(|id| view.ledger.needs(id)) {
        return None;
    }
    let exits = view
        .knowledge
        .tiles_of_kind(TileKind::Exit)
        .map(|tile| tile.cell());
    if let Some(exit) = nearest(neighbour.cell(), exits) {
        if view.robot.cell().euclidean_distance(exit) < neighbour.cell().euclidean_distance(exit) {
            return None;
        }
    }
    let item = view
        .robot
        .cargo()
        .items()
        .find(|item| view.ledger.needs(item.id()) && neighbour.cargo().can_fit(*item))?;
    Some(Choice::new(
        RobotMode::Pass,
        RobotAction::PassItem {
            item: item.id(),
            direction,
        },
    ))
}
