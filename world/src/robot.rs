//! Physical robot state: position, battery, cargo, and visit history.

use std::sync::Arc;

use warehouse_core::{
    BatteryTier, CellCoord, Direction, ItemId, RobotId, RobotMode, StockItem, BATTERY_MAX,
    CARGO_SLOTS,
};

use crate::grid::Bounds;

/// Fixed set of item slots bounded by a total weight capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cargo {
    slots: [Option<StockItem>; CARGO_SLOTS],
    capacity: u32,
}

impl Cargo {
    /// Creates empty cargo with the provided weight capacity.
    #[must_use]
    pub const fn new(capacity: u32) -> Self {
        Self {
            slots: [None; CARGO_SLOTS],
            capacity,
        }
    }

    /// Maximum summed weight.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Summed weight of all carried items.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.items().map(|item| item.weight()).sum()
    }

    /// Carried items in slot order.
    pub fn items(&self) -> impl Iterator<Item = StockItem> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Identifiers of the carried items in slot order.
    pub fn item_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items().map(|item| item.id())
    }

    /// Reports whether nothing is carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Reports whether the item is carried.
    #[must_use]
    pub fn contains(&self, id: ItemId) -> bool {
        self.item_ids().any(|carried| carried == id)
    }

    /// Reports whether the item would fit into a free slot without exceeding capacity.
    #[must_use]
    pub fn can_fit(&self, item: StockItem) -> bool {
        self.slots.iter().any(Option::is_none)
            && self.weight().saturating_add(item.weight()) <= self.capacity
    }

    pub(crate) fn insert(&mut self, item: StockItem) -> bool {
        if !self.can_fit(item) {
            return false;
        }
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(item);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> Option<StockItem> {
        self.slots
            .iter_mut()
            .find(|slot| slot.is_some_and(|item| item.id() == id))
            .and_then(Option::take)
    }
}

/// Per-cell visit counters shared copy-on-write between snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitHistory {
    bounds: Bounds,
    counts: Arc<Vec<u32>>,
}

impl VisitHistory {
    fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            counts: Arc::new(vec![0; bounds.len()]),
        }
    }

    /// Number of ticks the robot ended on the cell.
    #[must_use]
    pub fn count(&self, cell: CellCoord) -> u32 {
        self.bounds
            .index(cell)
            .and_then(|index| self.counts.get(index).copied())
            .unwrap_or(0)
    }

    fn record(&mut self, cell: CellCoord) {
        if let Some(index) = self.bounds.index(cell) {
            if let Some(count) = Arc::make_mut(&mut self.counts).get_mut(index) {
                *count = count.saturating_add(1);
            }
        }
    }
}

/// Mobile agent living on the warehouse grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Robot {
    id: RobotId,
    cell: CellCoord,
    facing: Direction,
    battery: f32,
    cargo: Cargo,
    mode: RobotMode,
    history: VisitHistory,
}

impl Robot {
    pub(crate) fn new(
        id: RobotId,
        cell: CellCoord,
        facing: Direction,
        capacity: u32,
        bounds: Bounds,
    ) -> Self {
        Self {
            id,
            cell,
            facing,
            battery: BATTERY_MAX,
            cargo: Cargo::new(capacity),
            mode: RobotMode::default(),
            history: VisitHistory::new(bounds),
        }
    }

    /// Identifier of the robot.
    #[must_use]
    pub const fn id(&self) -> RobotId {
        self.id
    }

    /// Cell the robot occupies.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Direction the robot faces.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Battery level in `[0, 100]`.
    #[must_use]
    pub const fn battery(&self) -> f32 {
        self.battery
    }

    /// Battery band used by presentation layers.
    #[must_use]
    pub fn battery_tier(&self) -> BatteryTier {
        BatteryTier::from_level(self.battery)
    }

    /// Reports whether the robot still has charge.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.battery > 0.0
    }

    /// Items carried by the robot.
    #[must_use]
    pub const fn cargo(&self) -> &Cargo {
        &self.cargo
    }

    /// Objective the robot pursued during its last action.
    #[must_use]
    pub const fn mode(&self) -> RobotMode {
        self.mode
    }

    /// Visit counters of the robot.
    #[must_use]
    pub const fn history(&self) -> &VisitHistory {
        &self.history
    }

    /// Number of times the robot ended a tick on the cell.
    #[must_use]
    pub fn visits(&self, cell: CellCoord) -> u32 {
        self.history.count(cell)
    }

    pub(crate) fn update_history(&mut self) {
        self.history.record(self.cell);
    }

    pub(crate) fn set_mode(&mut self, mode: RobotMode) {
        self.mode = mode;
    }

    pub(crate) fn set_cell(&mut self, cell: CellCoord) {
        self.cell = cell;
    }

    pub(crate) fn set_facing(&mut self, facing: Direction) {
        self.facing = facing;
    }

    pub(crate) fn cargo_mut(&mut self) -> &mut Cargo {
        &mut self.cargo
    }

    pub(crate) fn spend(&mut self, cost: f32) {
        self.battery = (self.battery - cost).clamp(0.0, BATTERY_MAX);
    }

    pub(crate) fn recharge(&mut self, gain: f32) {
        self.battery = (self.battery + gain).clamp(0.0, BATTERY_MAX);
    }
}
