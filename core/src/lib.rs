#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the warehouse robot simulator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

mod config;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{
    BatteryTuning, CargoTuning, FleetTuning, FloorTuning, HeuristicTuning, LedgerTuning,
    MctsTuning, ObstacleTuning, PlannerKind, RunLimits, SightTuning, SimConfig,
};

/// Upper bound of every robot battery.
pub const BATTERY_MAX: f32 = 100.0;

/// Number of item slots carried by every robot.
pub const CARGO_SLOTS: usize = 4;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Places a fresh robot with a full battery on the provided cell.
    SpawnRobot {
        /// Cell the robot starts on.
        cell: CellCoord,
        /// Initial facing of the robot.
        facing: Direction,
    },
    /// Replaces the item ledger with the provided outstanding items.
    AssignLedger {
        /// Items that must be retrieved and submitted.
        items: Vec<ItemId>,
    },
    /// Advances the simulation clock by one tick.
    Tick,
    /// Applies a single action on behalf of a robot.
    Act {
        /// Robot performing the action.
        robot: RobotId,
        /// Objective the planner pursued when it chose the action.
        mode: RobotMode,
        /// Action to attempt.
        action: RobotAction,
    },
    /// Turns a floor cell into a dynamic obstacle.
    PlaceObstacle {
        /// Cell receiving the obstacle.
        cell: CellCoord,
    },
    /// Returns a dynamic obstacle cell to floor.
    ClearObstacle {
        /// Cell holding the obstacle.
        cell: CellCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just started.
        tick: u64,
    },
    /// Confirms that a robot joined the fleet.
    RobotSpawned {
        /// Identifier assigned to the robot.
        robot: RobotId,
        /// Cell the robot occupies.
        cell: CellCoord,
    },
    /// Reports that a spawn request was refused.
    SpawnRejected {
        /// Requested spawn cell.
        cell: CellCoord,
        /// Reason the cell could not host a robot.
        reason: SpawnError,
    },
    /// Confirms that a new ledger is in force.
    LedgerAssigned {
        /// Number of outstanding entries.
        entries: usize,
    },
    /// Reports the outcome of an attempted robot action.
    ActionResolved {
        /// Robot that attempted the action.
        robot: RobotId,
        /// Action that was attempted.
        action: RobotAction,
        /// Whether the action changed state.
        success: bool,
    },
    /// Confirms that a robot removed an item from a shelf.
    ItemTaken {
        /// Robot now carrying the item.
        robot: RobotId,
        /// Item taken from the shelf.
        item: ItemId,
    },
    /// Confirms that items moved between two robots.
    ItemsTransferred {
        /// Robot that gave the items up.
        from: RobotId,
        /// Robot that received the items.
        to: RobotId,
        /// Number of items moved.
        count: u32,
    },
    /// Confirms that items were accepted at an exit.
    ItemsSubmitted {
        /// Robot that submitted.
        robot: RobotId,
        /// Number of ledger entries cleared.
        count: u32,
    },
    /// Announces that a robot ran out of battery.
    RobotDied {
        /// Robot that became inert.
        robot: RobotId,
        /// Cell the robot keeps occupying.
        cell: CellCoord,
    },
    /// Confirms that a dynamic obstacle appeared.
    ObstaclePlaced {
        /// Cell now blocked.
        cell: CellCoord,
    },
    /// Confirms that a dynamic obstacle disappeared.
    ObstacleCleared {
        /// Cell restored to floor.
        cell: CellCoord,
    },
    /// Reports that an obstacle request was refused.
    ObstacleRejected {
        /// Requested cell.
        cell: CellCoord,
        /// Reason the request failed.
        reason: ObstacleError,
    },
    /// Announces that every ledger entry has been submitted.
    LedgerCleared,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// The cell lies outside the grid.
    OutOfBounds,
    /// The cell is not traversable.
    Blocked,
    /// Another robot already stands on the cell.
    Occupied,
}

/// Reasons an obstacle request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleError {
    /// The cell lies outside the grid.
    OutOfBounds,
    /// Only plain floor can turn into an obstacle.
    NotFloor,
    /// A robot stands on the cell.
    Occupied,
    /// The cell does not hold an obstacle created by the cycling routine.
    NotDynamic,
}

/// Cardinal directions used for facing and single-cell steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward increasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

/// `(column delta, row delta, opposite)` for every direction, indexed by declaration order.
const DIRECTION_TABLE: [(i64, i64, Direction); 4] = [
    (0, -1, Direction::South),
    (1, 0, Direction::West),
    (0, 1, Direction::North),
    (-1, 0, Direction::East),
];

impl Direction {
    /// Every direction in evaluation order. Ties between directions resolve in this order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    const fn table_index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Column and row delta of a single step.
    #[must_use]
    pub const fn offset(self) -> (i64, i64) {
        let (dx, dy, _) = DIRECTION_TABLE[self.table_index()];
        (dx, dy)
    }

    /// Direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        DIRECTION_TABLE[self.table_index()].2
    }
}

/// Vertical travel available on elevator tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vertical {
    /// To the floor drawn above in the map (lower row indices).
    Up,
    /// To the floor drawn below in the map (higher row indices).
    Down,
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the straight-line distance between two cell centres.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f32 {
        let dx = self.column().abs_diff(other.column()) as f32;
        let dy = self.row().abs_diff(other.row()) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Neighbouring cell one step in `direction`, if it lies inside a `columns` x `rows` grid.
    #[must_use]
    pub fn step(self, direction: Direction, columns: u32, rows: u32) -> Option<CellCoord> {
        let (dx, dy) = direction.offset();
        self.offset_by(dx, dy, columns, rows)
    }

    /// Cell displaced by the provided deltas, if it lies inside a `columns` x `rows` grid.
    #[must_use]
    pub fn offset_by(self, dx: i64, dy: i64, columns: u32, rows: u32) -> Option<CellCoord> {
        let column = i64::from(self.column) + dx;
        let row = i64::from(self.row) + dy;
        if column < 0 || row < 0 || column >= i64::from(columns) || row >= i64::from(rows) {
            return None;
        }
        Some(CellCoord::new(
            u32::try_from(column).ok()?,
            u32::try_from(row).ok()?,
        ))
    }

    /// Direction leading from `self` to an orthogonally adjacent `other`.
    #[must_use]
    pub fn direction_to(self, other: CellCoord) -> Option<Direction> {
        Direction::ALL.into_iter().find(|direction| {
            let (dx, dy) = direction.offset();
            i64::from(self.column) + dx == i64::from(other.column)
                && i64::from(self.row) + dy == i64::from(other.row)
        })
    }
}

/// Identifier of a stocked item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Weight assigned to the item when a map does not state one.
    ///
    /// Weights cycle through `1..=3` by identifier.
    #[must_use]
    pub const fn default_weight(&self) -> u32 {
        1 + self.0.saturating_sub(1) % 3
    }
}

/// Item stocked on a shelf or carried by a robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockItem {
    id: ItemId,
    weight: u32,
}

impl StockItem {
    /// Creates an item with an explicit weight.
    #[must_use]
    pub const fn new(id: ItemId, weight: u32) -> Self {
        Self { id, weight }
    }

    /// Creates an item carrying its identifier's default weight.
    #[must_use]
    pub const fn with_default_weight(id: ItemId) -> Self {
        Self {
            id,
            weight: id.default_weight(),
        }
    }

    /// Identifier of the item.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Weight the item contributes to a robot's load.
    #[must_use]
    pub const fn weight(&self) -> u32 {
        self.weight
    }
}

/// Classification of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Outside the warehouse floor.
    Void,
    /// Plain traversable floor.
    Floor,
    /// Storage rack whose item can only be taken from the neighbouring cell in `access`.
    Shelf {
        /// Side of the shelf a robot must stand on.
        access: Direction,
    },
    /// Charging pad.
    Charger,
    /// Vertical transport between stacked floors.
    Elevator,
    /// Submission point for retrieved items.
    Exit,
    /// Blocked floor.
    Obstacle,
}

impl TileKind {
    /// Decodes a map file tile code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        let kind = match code {
            0 => Self::Void,
            1 => Self::Floor,
            2 => Self::Shelf {
                access: Direction::North,
            },
            3 => Self::Shelf {
                access: Direction::East,
            },
            4 => Self::Shelf {
                access: Direction::South,
            },
            5 => Self::Shelf {
                access: Direction::West,
            },
            6 => Self::Charger,
            7 => Self::Elevator,
            8 => Self::Exit,
            9 => Self::Obstacle,
            _ => return None,
        };
        Some(kind)
    }

    /// Map file code of the tile kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Void => 0,
            Self::Floor => 1,
            Self::Shelf {
                access: Direction::North,
            } => 2,
            Self::Shelf {
                access: Direction::East,
            } => 3,
            Self::Shelf {
                access: Direction::South,
            } => 4,
            Self::Shelf {
                access: Direction::West,
            } => 5,
            Self::Charger => 6,
            Self::Elevator => 7,
            Self::Exit => 8,
            Self::Obstacle => 9,
        }
    }

    /// Reports whether robots may stand on the tile.
    #[must_use]
    pub const fn is_traversable(self) -> bool {
        matches!(
            self,
            Self::Floor | Self::Charger | Self::Elevator | Self::Exit
        )
    }

    /// Reports whether the tile stops a sight scan.
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        matches!(self, Self::Void | Self::Shelf { .. } | Self::Obstacle)
    }

    /// Access side when the tile is a shelf.
    #[must_use]
    pub const fn shelf_access(self) -> Option<Direction> {
        match self {
            Self::Shelf { access } => Some(access),
            _ => None,
        }
    }
}

/// One cell of the warehouse.
///
/// The item slot is only populated for shelves; every constructor and mutator
/// upholds that invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    cell: CellCoord,
    kind: TileKind,
    item: Option<StockItem>,
}

impl Tile {
    /// Creates a tile without stock.
    #[must_use]
    pub const fn new(cell: CellCoord, kind: TileKind) -> Self {
        Self {
            cell,
            kind,
            item: None,
        }
    }

    /// Creates a shelf tile holding the provided item.
    #[must_use]
    pub const fn shelf(cell: CellCoord, access: Direction, item: Option<StockItem>) -> Self {
        Self {
            cell,
            kind: TileKind::Shelf { access },
            item,
        }
    }

    /// Cell the tile covers.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Classification of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Item stocked on the tile, if it is a shelf holding one.
    #[must_use]
    pub const fn item(&self) -> Option<StockItem> {
        self.item
    }

    /// Removes and returns the stocked item.
    pub fn take_item(&mut self) -> Option<StockItem> {
        self.item.take()
    }

    /// Changes the tile kind, discarding stock when the new kind is not a shelf.
    pub fn set_kind(&mut self, kind: TileKind) {
        self.kind = kind;
        if kind.shelf_access().is_none() {
            self.item = None;
        }
    }
}

/// Unique identifier assigned to a robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RobotId(u32);

impl RobotId {
    /// Creates a new robot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// High-level objective a robot pursues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotMode {
    /// Discovering unknown parts of the warehouse.
    #[default]
    Explore,
    /// Heading to a shelf that holds a needed item.
    Fetch,
    /// Heading to, or sitting on, a charger.
    Charge,
    /// Heading to an exit to submit carried items.
    Submit,
    /// Heading to a dead robot to recover its cargo.
    Rescue,
    /// Handing an item to a robot blocking the way.
    Pass,
}

/// Battery bands used by presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatteryTier {
    /// At least 75%.
    Full,
    /// At least 50%.
    Medium,
    /// At least 25%.
    Low,
    /// Below 25%.
    Critical,
}

impl BatteryTier {
    /// Classifies a battery level.
    #[must_use]
    pub fn from_level(level: f32) -> Self {
        if level >= 75.0 {
            Self::Full
        } else if level >= 50.0 {
            Self::Medium
        } else if level >= 25.0 {
            Self::Low
        } else {
            Self::Critical
        }
    }
}

/// Atomic actions a robot can attempt in a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotAction {
    /// Face the given direction.
    Turn(Direction),
    /// Step one cell along the current facing.
    Move,
    /// Take the item from the shelf in front of the robot.
    TakeShelfItem,
    /// Take the item from the shelf in the given direction.
    TakeShelfItemFrom(Direction),
    /// Collect the cargo of the dead robot in the given direction.
    TakeRobotItems(Direction),
    /// Charge on the current charger tile.
    Charge,
    /// Ride the elevator one floor.
    UseElevator(Vertical),
    /// Hand a carried item to the robot in the given direction.
    PassItem {
        /// Item to hand over.
        item: ItemId,
        /// Side of the receiving robot.
        direction: Direction,
    },
    /// Submit every needed carried item at the current exit.
    SubmitItems,
    /// Do nothing this tick.
    Wait,
}

impl RobotAction {
    /// Discrete action set explored by the tree search planner.
    pub const PLANNING_SET: [RobotAction; 11] = [
        RobotAction::Turn(Direction::North),
        RobotAction::Turn(Direction::East),
        RobotAction::Turn(Direction::South),
        RobotAction::Turn(Direction::West),
        RobotAction::Move,
        RobotAction::TakeShelfItem,
        RobotAction::Charge,
        RobotAction::UseElevator(Vertical::Up),
        RobotAction::UseElevator(Vertical::Down),
        RobotAction::SubmitItems,
        RobotAction::Wait,
    ];
}

/// Reasons a run ended unsuccessfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// More than half of the fleet ran out of battery.
    FleetLost,
    /// The tick budget was exhausted before the ledger was cleared.
    TickBudgetExceeded,
}

/// Reasons a run was not attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// No robot could be placed on the map.
    NoRobots,
    /// The ledger holds no item to retrieve.
    EmptyLedger,
}

/// Terminal state of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every ledger entry was submitted.
    Success,
    /// The run ended without clearing the ledger.
    Failure(FailureReason),
    /// The run never started.
    Skipped(SkipReason),
}

/// Aggregate statistics of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Ticks executed.
    pub ticks: u64,
    /// Ledger entries cleared by submissions.
    pub items_retrieved: u32,
    /// Robots that ran out of battery.
    pub dead_robots: u32,
    /// Actions attempted by live robots.
    pub actions_attempted: u64,
    /// Attempted actions that were rejected.
    pub actions_failed: u64,
    /// Dynamic obstacles placed by the cycling routine.
    pub obstacles_placed: u32,
    /// Wall-clock time spent running ticks.
    pub wall_clock: Duration,
}

#[cfg(test)]
mod tests {
    use super::{
        BatteryTier, CellCoord, Direction, ItemId, RobotAction, RunOutcome, SkipReason, StockItem,
        Tile, TileKind,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn euclidean_distance_matches_pythagoras() {
        let origin = CellCoord::new(0, 0);
        let destination = CellCoord::new(3, 4);
        assert!((origin.euclidean_distance(destination) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn opposite_directions_cancel_out() {
        for direction in Direction::ALL {
            let (dx, dy) = direction.offset();
            let (ox, oy) = direction.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn step_rejects_cells_beyond_the_edge() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.step(Direction::West, 3, 3), None);
        assert_eq!(corner.step(Direction::North, 3, 3), None);
        assert_eq!(
            corner.step(Direction::East, 3, 3),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(CellCoord::new(2, 2).step(Direction::South, 3, 3), None);
    }

    #[test]
    fn direction_to_requires_adjacency() {
        let origin = CellCoord::new(2, 2);
        assert_eq!(
            origin.direction_to(CellCoord::new(2, 1)),
            Some(Direction::North)
        );
        assert_eq!(
            origin.direction_to(CellCoord::new(1, 2)),
            Some(Direction::West)
        );
        assert_eq!(origin.direction_to(CellCoord::new(3, 3)), None);
        assert_eq!(origin.direction_to(origin), None);
    }

    #[test]
    fn tile_codes_round_trip() {
        for code in 0..=9 {
            let kind = TileKind::from_code(code).expect("known code");
            assert_eq!(kind.code(), code);
        }
        assert_eq!(TileKind::from_code(10), None);
    }

    #[test]
    fn shelves_block_and_occlude() {
        let shelf = TileKind::Shelf {
            access: Direction::South,
        };
        assert!(!shelf.is_traversable());
        assert!(shelf.is_opaque());
        assert!(TileKind::Exit.is_traversable());
        assert!(!TileKind::Charger.is_opaque());
    }

    #[test]
    fn set_kind_discards_stock_on_non_shelves() {
        let item = StockItem::with_default_weight(ItemId::new(4));
        let mut tile = Tile::shelf(CellCoord::new(0, 0), Direction::East, Some(item));
        assert_eq!(tile.item(), Some(item));
        tile.set_kind(TileKind::Floor);
        assert_eq!(tile.item(), None);
    }

    #[test]
    fn default_weights_cycle() {
        assert_eq!(ItemId::new(1).default_weight(), 1);
        assert_eq!(ItemId::new(2).default_weight(), 2);
        assert_eq!(ItemId::new(3).default_weight(), 3);
        assert_eq!(ItemId::new(4).default_weight(), 1);
        assert_eq!(ItemId::new(0).default_weight(), 1);
    }

    #[test]
    fn battery_tiers_partition_the_range() {
        assert_eq!(BatteryTier::from_level(100.0), BatteryTier::Full);
        assert_eq!(BatteryTier::from_level(60.0), BatteryTier::Medium);
        assert_eq!(BatteryTier::from_level(25.0), BatteryTier::Low);
        assert_eq!(BatteryTier::from_level(0.0), BatteryTier::Critical);
    }

    #[test]
    fn planning_actions_round_trip_through_bincode() {
        for action in RobotAction::PLANNING_SET {
            assert_round_trip(&action);
        }
        assert_round_trip(&RunOutcome::Skipped(SkipReason::EmptyLedger));
    }
}
