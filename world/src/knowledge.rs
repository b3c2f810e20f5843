//! Sensor-discovered copies of the ground-truth grid.

use std::sync::Arc;

use warehouse_core::{CellCoord, Direction, StockItem, Tile, TileKind};

use crate::grid::{Bounds, TileSource, TileStore};

/// Partial copy of the warehouse assembled from sight scans.
///
/// Storage sits behind an [`Arc`] and is copied on the first write, so
/// planning snapshots share memory with the live map until they diverge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnowledgeMap {
    bounds: Bounds,
    tiles: Arc<Vec<Option<Tile>>>,
}

impl KnowledgeMap {
    /// Creates a map that knows nothing about the warehouse.
    #[must_use]
    pub fn empty(bounds: Bounds) -> Self {
        Self {
            bounds,
            tiles: Arc::new(vec![None; bounds.len()]),
        }
    }

    /// Stores or refreshes a tile. Returns `true` when the cell was unknown.
    pub fn record(&mut self, tile: Tile) -> bool {
        let Some(index) = self.bounds.index(tile.cell()) else {
            return false;
        };
        if self.tiles.get(index).copied().flatten() == Some(tile) {
            return false;
        }
        let tiles = Arc::make_mut(&mut self.tiles);
        match tiles.get_mut(index) {
            Some(slot) => slot.replace(tile).is_none(),
            None => false,
        }
    }

    /// Reports whether the cell has been sighted.
    #[must_use]
    pub fn is_known(&self, cell: CellCoord) -> bool {
        self.known_tile(cell).is_some()
    }

    /// Number of sighted cells.
    #[must_use]
    pub fn known_count(&self) -> usize {
        self.tiles.iter().filter(|slot| slot.is_some()).count()
    }

    /// Known tiles in row-major order.
    pub fn known_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.iter().flatten()
    }

    /// Known tiles of the provided kind, in row-major order.
    pub fn tiles_of_kind(&self, kind: TileKind) -> impl Iterator<Item = &Tile> + '_ {
        self.known_tiles().filter(move |tile| tile.kind() == kind)
    }

    /// Unknown cells that border a known traversable cell.
    pub fn frontier(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let bounds = self.bounds;
        bounds.cells().filter(move |cell| {
            !self.is_known(*cell)
                && Direction::ALL.into_iter().any(|direction| {
                    bounds
                        .step(*cell, direction)
                        .is_some_and(|neighbor| self.is_passable(neighbor))
                })
        })
    }
}

impl TileSource for KnowledgeMap {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn known_tile(&self, cell: CellCoord) -> Option<Tile> {
        self.bounds
            .index(cell)
            .and_then(|index| self.tiles.get(index).copied().flatten())
    }
}

impl TileStore for KnowledgeMap {
    fn take_item(&mut self, cell: CellCoord) -> Option<StockItem> {
        let index = self.bounds.index(cell)?;
        if self.tiles.get(index).copied().flatten()?.item().is_none() {
            return None;
        }
        Arc::make_mut(&mut self.tiles)
            .get_mut(index)
            .and_then(Option::as_mut)
            .and_then(Tile::take_item)
    }
}
