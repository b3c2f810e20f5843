//! Line-of-sight scanning along a robot's facing.

use warehouse_core::{CellCoord, Direction, SightTuning};

use crate::{
    grid::{Bounds, TileSource},
    knowledge::KnowledgeMap,
};

/// Cells covered by a scan: the origin, then up to `range` cells ahead.
///
/// The line ends at the map edge or at a floor boundary.
pub fn sight_line(
    bounds: Bounds,
    origin: CellCoord,
    facing: Direction,
    range: u32,
) -> impl Iterator<Item = CellCoord> {
    let ahead = usize::try_from(range).unwrap_or(usize::MAX);
    std::iter::successors(Some(origin), move |cell| bounds.step(*cell, facing))
        .take(ahead.saturating_add(1))
}

/// Copies the tiles along the sight line from `truth` into `knowledge`.
///
/// The scan stops after the first opaque tile. Returns the discovery bonus
/// earned by the cells that were unknown before the scan.
pub fn scan(
    truth: &impl TileSource,
    knowledge: &mut KnowledgeMap,
    origin: CellCoord,
    facing: Direction,
    tuning: &SightTuning,
) -> f32 {
    let mut discovered = 0_u32;
    for cell in sight_line(truth.bounds(), origin, facing, tuning.range) {
        let Some(tile) = truth.known_tile(cell) else {
            break;
        };
        if knowledge.record(tile) {
            discovered += 1;
        }
        if tile.kind().is_opaque() {
            break;
        }
    }
    tuning.discovery_bonus * discovered as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn scan_stops_after_the_first_opaque_tile() {
        let grid = Grid::parse("1 1 9 1 1", 5, 1).expect("valid map");
        let mut knowledge = KnowledgeMap::empty(grid.bounds());
        let tuning = SightTuning {
            range: 10,
            discovery_bonus: 2.0,
        };

        let reward = scan(
            &grid,
            &mut knowledge,
            CellCoord::new(0, 0),
            Direction::East,
            &tuning,
        );

        assert_eq!(reward, 6.0);
        assert!(knowledge.is_known(CellCoord::new(2, 0)));
        assert!(!knowledge.is_known(CellCoord::new(3, 0)));
    }

    #[test]
    fn scan_respects_range_and_rewards_new_cells_once() {
        let grid = Grid::parse("1 1 1 1 1", 5, 1).expect("valid map");
        let mut knowledge = KnowledgeMap::empty(grid.bounds());
        let tuning = SightTuning {
            range: 2,
            discovery_bonus: 1.0,
        };
        let origin = CellCoord::new(0, 0);

        assert_eq!(
            scan(&grid, &mut knowledge, origin, Direction::East, &tuning),
            3.0
        );
        assert_eq!(
            scan(&grid, &mut knowledge, origin, Direction::East, &tuning),
            0.0
        );
        assert_eq!(knowledge.known_count(), 3);
    }

    #[test]
    fn sight_line_ends_at_the_edge() {
        let bounds = Bounds::new(3, 3);
        let cells: Vec<_> =
            sight_line(bounds, CellCoord::new(1, 1), Direction::North, 5).collect();
        assert_eq!(cells, vec![CellCoord::new(1, 1), CellCoord::new(1, 0)]);
    }
}
