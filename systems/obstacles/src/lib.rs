#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic obstacle cycling system that reshapes the warehouse floor.

use std::collections::BTreeSet;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;
use warehouse_core::{CellCoord, Command, Event, ObstacleTuning, TileKind};
use warehouse_world::{Grid, Roster};

/// Offset applied to the fleet seed so obstacle cycling draws its own random stream.
pub const OBSTACLE_STREAM: u64 = 2;

/// Pure system that periodically clears its obstacles and scatters a fresh set.
#[derive(Debug)]
pub struct Obstacles {
    tuning: ObstacleTuning,
    rng: ChaCha8Rng,
}

impl Obstacles {
    /// Creates a new obstacle system using the supplied cadence and run seed.
    #[must_use]
    pub fn new(tuning: ObstacleTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(OBSTACLE_STREAM)),
        }
    }

    /// Consumes world events and immutable views to emit obstacle commands.
    ///
    /// On every tick that is a multiple of the interval the current dynamic
    /// obstacles are cleared and `count` new ones are placed on floor cells
    /// that no robot occupies. Candidates that collide with a robot or an
    /// earlier pick are re-rolled up to `max_attempts` times.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        roster: &Roster,
        active: &BTreeSet<CellCoord>,
        out: &mut Vec<Command>,
    ) {
        if self.tuning.count == 0 || self.tuning.interval == 0 {
            return;
        }

        let cycle_due = events.iter().any(|event| {
            matches!(event, Event::TimeAdvanced { tick } if tick % self.tuning.interval == 0)
        });
        if !cycle_due {
            return;
        }

        out.extend(
            active
                .iter()
                .map(|cell| Command::ClearObstacle { cell: *cell }),
        );

        let candidates: Vec<CellCoord> = grid
            .tiles()
            .iter()
            .filter(|tile| tile.kind() == TileKind::Floor || active.contains(&tile.cell()))
            .map(|tile| tile.cell())
            .collect();
        if candidates.is_empty() {
            return;
        }

        let mut picked = BTreeSet::new();
        for _ in 0..self.tuning.count {
            match self.roll(&candidates, roster, &picked) {
                Some(cell) => {
                    let _ = picked.insert(cell);
                    out.push(Command::PlaceObstacle { cell });
                }
                None => debug!(
                    attempts = self.tuning.max_attempts,
                    "obstacle placement abandoned"
                ),
            }
        }
    }

    fn roll(
        &mut self,
        candidates: &[CellCoord],
        roster: &Roster,
        picked: &BTreeSet<CellCoord>,
    ) -> Option<CellCoord> {
        for _ in 0..self.tuning.max_attempts {
            let cell = *candidates.choose(&mut self.rng)?;
            if !roster.is_occupied(cell) && !picked.contains(&cell) {
                return Some(cell);
            }
        }
        None
    }
}
