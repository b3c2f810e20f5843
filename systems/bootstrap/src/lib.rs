#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the fleet and the ledger for a run.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use warehouse_core::{Command, Direction, FleetTuning, ItemId, LedgerTuning, TileKind};
use warehouse_world::Grid;

/// Offset applied to the fleet seed so bootstrap draws its own random stream.
pub const BOOTSTRAP_STREAM: u64 = 1;

/// Seeded placement of robots and selection of ledger items.
#[derive(Debug)]
pub struct Bootstrap {
    rng: ChaCha8Rng,
}

impl Bootstrap {
    /// Creates a bootstrap system drawing from the run seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(BOOTSTRAP_STREAM)),
        }
    }

    /// Emits one spawn command per robot on distinct, randomly chosen floor cells.
    ///
    /// Chargers, elevators, and exits are left free. Fewer robots are spawned
    /// when the map runs out of floor.
    pub fn spawn_fleet(&mut self, grid: &Grid, fleet: &FleetTuning, out: &mut Vec<Command>) {
        let mut cells: Vec<_> = grid
            .tiles()
            .iter()
            .filter(|tile| tile.kind() == TileKind::Floor)
            .map(|tile| tile.cell())
            .collect();
        cells.shuffle(&mut self.rng);

        let count = usize::try_from(fleet.robots).unwrap_or(usize::MAX);
        for cell in cells.into_iter().take(count) {
            let facing = Direction::ALL
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(Direction::North);
            out.push(Command::SpawnRobot { cell, facing });
        }
    }

    /// Emits a ledger drawn from the items stocked on the map.
    ///
    /// Each stocked item is drawn at most once.
    pub fn assign_ledger(&mut self, grid: &Grid, ledger: &LedgerTuning, out: &mut Vec<Command>) {
        let mut stock: Vec<ItemId> = grid.stocked_items().map(|item| item.id()).collect();
        stock.shuffle(&mut self.rng);
        stock.truncate(usize::try_from(ledger.entries).unwrap_or(usize::MAX));
        out.push(Command::AssignLedger { items: stock });
    }
}
