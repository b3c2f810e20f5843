//! Ground-truth tile layout and the plain-text map parser.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;
use warehouse_core::{CellCoord, Direction, ItemId, StockItem, Tile, TileKind, Vertical};

/// Errors that prevent a map from being turned into a [`Grid`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The map file could not be read.
    #[error("failed to read map file {path}")]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The caller asked for a grid without cells.
    #[error("map dimensions must be non-zero, got {columns}x{rows}")]
    EmptyDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The text ended before every cell was described.
    #[error("unexpected end of map after tile {parsed} of {expected}")]
    Truncated {
        /// Number of tiles read successfully.
        parsed: usize,
        /// Number of tiles the dimensions require.
        expected: usize,
    },
    /// A token could not be read as a tile description.
    #[error("invalid token `{token}` at tile {index}")]
    InvalidToken {
        /// Row-major index of the offending tile.
        index: usize,
        /// Token as written in the map.
        token: String,
    },
    /// A token named a tile type that does not exist.
    #[error("invalid tile type {code} at tile {index}")]
    InvalidCode {
        /// Row-major index of the offending tile.
        index: usize,
        /// Code found in the map.
        code: u32,
    },
    /// A non-shelf tile carried an item suffix.
    #[error("tile {index} carries an item but is not a shelf")]
    ItemOnNonShelf {
        /// Row-major index of the offending tile.
        index: usize,
    },
    /// The text describes more cells than the dimensions allow.
    #[error("map holds more than {expected} tiles")]
    TrailingTokens {
        /// Number of tiles the dimensions require.
        expected: usize,
    },
    /// The floor height does not split the map into whole floors.
    #[error("{rows} rows cannot be split into floors of {rows_per_floor} rows")]
    FloorLayout {
        /// Total number of rows.
        rows: u32,
        /// Requested rows per floor.
        rows_per_floor: u32,
    },
}

/// Dimensions of a warehouse together with its floor layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds {
    columns: u32,
    rows: u32,
    rows_per_floor: Option<u32>,
}

impl Bounds {
    /// Creates single-floor bounds.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            rows_per_floor: None,
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows across all floors.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Rows occupied by one floor, when the map stacks several floors.
    #[must_use]
    pub const fn rows_per_floor(&self) -> Option<u32> {
        self.rows_per_floor
    }

    /// Number of cells covered by the bounds.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(u64::from(self.columns) * u64::from(self.rows)).unwrap_or(0)
    }

    /// Reports whether the bounds cover no cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports whether the cell lies inside the bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Row-major index of the cell.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    /// Floor number of the cell. Single-floor maps only have floor zero.
    #[must_use]
    pub fn floor_of(&self, cell: CellCoord) -> u32 {
        match self.rows_per_floor {
            Some(height) if height > 0 => cell.row() / height,
            _ => 0,
        }
    }

    /// Neighbour one step in `direction`, provided it stays on the same floor.
    #[must_use]
    pub fn step(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let next = cell.step(direction, self.columns, self.rows)?;
        (self.floor_of(next) == self.floor_of(cell)).then_some(next)
    }

    /// Cell reached by riding an elevator one floor up or down.
    #[must_use]
    pub fn elevator_destination(&self, cell: CellCoord, vertical: Vertical) -> Option<CellCoord> {
        let height = i64::from(self.rows_per_floor?);
        let dy = match vertical {
            Vertical::Up => -height,
            Vertical::Down => height,
        };
        cell.offset_by(0, dy, self.columns, self.rows)
    }
}

/// Read access to a tile layout.
///
/// Ground truth answers for every in-bounds cell; knowledge maps answer only
/// for cells that have been sighted.
pub trait TileSource {
    /// Dimensions of the layout.
    fn bounds(&self) -> Bounds;

    /// Tile at the cell, if it is known.
    fn known_tile(&self, cell: CellCoord) -> Option<Tile>;

    /// Reports whether a robot may enter the cell according to this layout.
    fn is_passable(&self, cell: CellCoord) -> bool {
        self.known_tile(cell)
            .is_some_and(|tile| tile.kind().is_traversable())
    }
}

/// Layouts whose shelf stock can be consumed.
pub trait TileStore: TileSource {
    /// Removes the item stocked on the shelf at `cell`.
    fn take_item(&mut self, cell: CellCoord) -> Option<StockItem>;
}

/// Ground-truth tile layout of a warehouse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    bounds: Bounds,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Parses a whitespace separated, row-major list of tile codes.
    ///
    /// Shelf tokens may name their item as `code:item` or `code:item:weight`.
    /// Item `0` marks an empty shelf. Shelves without an explicit item stock
    /// the item matching their 1-based ordinal in scan order.
    pub fn parse(text: &str, columns: u32, rows: u32) -> Result<Self, LoadError> {
        let bounds = Bounds::new(columns, rows);
        if bounds.is_empty() {
            return Err(LoadError::EmptyDimensions { columns, rows });
        }

        let expected = bounds.len();
        let mut tokens = text.split_whitespace();
        let mut tiles = Vec::with_capacity(expected);
        let mut shelf_ordinal = 0_u32;

        for (index, cell) in bounds.cells().enumerate() {
            let Some(token) = tokens.next() else {
                return Err(LoadError::Truncated {
                    parsed: index,
                    expected,
                });
            };
            let tile = parse_token(token, index, cell, &mut shelf_ordinal)?;
            tiles.push(tile);
        }

        if tokens.next().is_some() {
            return Err(LoadError::TrailingTokens { expected });
        }

        debug!(columns, rows, shelves = shelf_ordinal, "parsed warehouse map");
        Ok(Self { bounds, tiles })
    }

    /// Reads and parses a map file.
    pub fn load(path: impl AsRef<Path>, columns: u32, rows: u32) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, columns, rows)
    }

    /// Splits the map into stacked floors of `rows_per_floor` rows each.
    pub fn with_rows_per_floor(mut self, rows_per_floor: Option<u32>) -> Result<Self, LoadError> {
        if let Some(height) = rows_per_floor {
            if height == 0 || self.bounds.rows % height != 0 {
                return Err(LoadError::FloorLayout {
                    rows: self.bounds.rows,
                    rows_per_floor: height,
                });
            }
        }
        self.bounds.rows_per_floor = rows_per_floor;
        Ok(self)
    }

    /// Dimensions and floor layout of the grid.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Tile covering the cell.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<&Tile> {
        self.bounds
            .index(cell)
            .and_then(|index| self.tiles.get(index))
    }

    /// Every tile in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Items currently stocked on shelves, in scan order.
    pub fn stocked_items(&self) -> impl Iterator<Item = StockItem> + '_ {
        self.tiles.iter().filter_map(Tile::item)
    }

    pub(crate) fn tile_mut(&mut self, cell: CellCoord) -> Option<&mut Tile> {
        let index = self.bounds.index(cell)?;
        self.tiles.get_mut(index)
    }
}

impl TileSource for Grid {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn known_tile(&self, cell: CellCoord) -> Option<Tile> {
        self.tile(cell).copied()
    }
}

impl TileStore for Grid {
    fn take_item(&mut self, cell: CellCoord) -> Option<StockItem> {
        self.tile_mut(cell).and_then(Tile::take_item)
    }
}

fn parse_token(
    token: &str,
    index: usize,
    cell: CellCoord,
    shelf_ordinal: &mut u32,
) -> Result<Tile, LoadError> {
    let invalid = || LoadError::InvalidToken {
        index,
        token: token.to_owned(),
    };

    let mut parts = token.split(':');
    let code: u32 = parts
        .next()
        .and_then(|part| part.parse().ok())
        .ok_or_else(invalid)?;
    let item: Option<u32> = parts
        .next()
        .map(|part| part.parse().map_err(|_| invalid()))
        .transpose()?;
    let weight: Option<u32> = parts
        .next()
        .map(|part| part.parse().map_err(|_| invalid()))
        .transpose()?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    let kind = u8::try_from(code)
        .ok()
        .and_then(TileKind::from_code)
        .ok_or(LoadError::InvalidCode { index, code })?;

    let Some(access) = kind.shelf_access() else {
        if item.is_some() {
            return Err(LoadError::ItemOnNonShelf { index });
        }
        return Ok(Tile::new(cell, kind));
    };

    *shelf_ordinal += 1;
    let id = item.unwrap_or(*shelf_ordinal);
    let stock = (id != 0).then(|| {
        let id = ItemId::new(id);
        weight.map_or_else(
            || StockItem::with_default_weight(id),
            |weight| StockItem::new(id, weight),
        )
    });
    Ok(Tile::shelf(cell, access, stock))
}
