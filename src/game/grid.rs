use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use thiserror::Error;

use crate::{
    dictionary::WordOracle,
    models::{Letter, Position, Tile, TileId},
    utils::letters::LetterSource,
};

pub const MIN_GRID_SIZE: usize = 3;

/// Boards at least this large get the playable-words pass on creation
pub const PLAYABLE_CHECK_MIN_SIZE: usize = 8;
/// Distinct straight-line words a fresh large board should offer
pub const PLAYABLE_WORD_TARGET: usize = 4;
pub const PLAYABLE_WORD_LENGTH: usize = 4;
pub const MAX_GENERATION_ATTEMPTS: usize = 10;
/// Share of cells swapped for common letters on each failed attempt
pub const COMMON_LETTER_FRACTION: f64 = 0.3;

/// All eight straight-line directions as (row, col) steps
const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("grid size {0} is too small, minimum is {MIN_GRID_SIZE}")]
    InvalidSize(usize),
    #[error("position ({row}, {col}) is outside a {size}x{size} grid")]
    OutOfBounds { row: usize, col: usize, size: usize },
}

/// Square matrix of cells. A cell is `None` only while a cascade is in flight.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    cells: Vec<Vec<Option<Tile>>>,
    next_id: u64,
}

impl Grid {
    /// Create a grid where every cell is a hole
    pub fn empty(size: usize) -> Result<Self, GridError> {
        if size < MIN_GRID_SIZE {
            return Err(GridError::InvalidSize(size));
        }
        Ok(Self {
            size,
            cells: vec![vec![None; size]; size],
            next_id: 0,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    pub fn check_bounds(&self, pos: Position) -> Result<(), GridError> {
        if self.in_bounds(pos) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                row: pos.row,
                col: pos.col,
                size: self.size,
            })
        }
    }

    pub fn get(&self, pos: Position) -> Option<&Tile> {
        self.cells.get(pos.row)?.get(pos.col)?.as_ref()
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        self.cells.get_mut(pos.row)?.get_mut(pos.col)?.as_mut()
    }

    /// Create a tile in a cell, replacing whatever was there
    pub fn spawn(&mut self, pos: Position, letter: Letter, spore_threshold: u32) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        self.cells[pos.row][pos.col] = Some(Tile {
            id,
            letter,
            row: pos.row,
            col: pos.col,
            spore_count: 0,
            spore_threshold,
        });
        id
    }

    /// Remove the tile from a cell, leaving a hole
    pub fn take(&mut self, pos: Position) -> Option<Tile> {
        self.cells.get_mut(pos.row)?.get_mut(pos.col)?.take()
    }

    /// Put a tile into a cell and record the cell on the tile
    pub fn place(&mut self, pos: Position, mut tile: Tile) {
        tile.set_position(pos);
        self.cells[pos.row][pos.col] = Some(tile);
    }

    /// Find a tile by scanning every cell
    pub fn locate(&self, id: TileId) -> Option<Position> {
        self.positions()
            .find(|pos| self.get(*pos).map(|t| t.id) == Some(id))
    }

    /// Where a tile really is. Checks the remembered cell first; on a mismatch
    /// the grid is scanned and the tile's stored coordinates are corrected.
    pub fn resolve(&mut self, id: TileId, remembered: Position) -> Option<Position> {
        if self.get(remembered).map(|t| t.id) == Some(id) {
            if let Some(tile) = self.get_mut(remembered) {
                if tile.position() != remembered {
                    tile.set_position(remembered);
                }
            }
            return Some(remembered);
        }

        let actual = self.locate(id)?;
        tracing::warn!(
            "Tile {:?} expected at {:?} but found at {:?}, correcting",
            id,
            remembered,
            actual
        );
        if let Some(tile) = self.get_mut(actual) {
            tile.set_position(actual);
        }
        Some(actual)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Position::new(row, col)))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().flatten().flatten()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.cells.iter_mut().flatten().flatten()
    }

    pub fn holes(&self) -> Vec<Position> {
        self.positions()
            .filter(|pos| self.get(*pos).is_none())
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.tiles().count() == self.size * self.size
    }

    /// Apply a new explosion threshold to every live tile
    pub fn sync_thresholds(&mut self, spore_threshold: u32) {
        for tile in self.tiles_mut() {
            tile.spore_threshold = spore_threshold;
        }
    }

    /// Drop every tile
    pub fn clear(&mut self) {
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = None;
            }
        }
    }

    /// Letters read along a path, or None if the path crosses a hole
    pub fn word_at(&self, positions: &[Position]) -> Option<String> {
        positions
            .iter()
            .map(|pos| self.get(*pos).map(|tile| tile.letter.ch))
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for col in 0..self.size {
            write!(f, "{:>2}", col)?;
        }
        writeln!(f)?;
        for (r, row) in self.cells.iter().enumerate() {
            write!(f, "{:>2} ", r)?;
            for cell in row {
                match cell {
                    Some(tile) => write!(f, " {}", tile.letter.ch)?,
                    None => write!(f, " .")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub struct GridGenerator;

impl GridGenerator {
    /// Generate a fully populated grid from a letter source
    pub fn generate(
        size: usize,
        letters: &mut dyn LetterSource,
        spore_threshold: u32,
    ) -> Result<Grid, GridError> {
        let mut grid = Grid::empty(size)?;
        Self::fill(&mut grid, letters, spore_threshold);
        Ok(grid)
    }

    /// Fill every hole, top to bottom
    pub fn fill(grid: &mut Grid, letters: &mut dyn LetterSource, spore_threshold: u32) {
        for pos in grid.holes() {
            grid.spawn(pos, letters.next_letter(), spore_threshold);
        }
    }

    /// Generate a fresh board. Large boards are nudged toward having a few
    /// straight-line words by swapping in common letters; this is a
    /// best-effort pass bounded by `MAX_GENERATION_ATTEMPTS`.
    pub fn generate_playable(
        size: usize,
        letters: &mut dyn LetterSource,
        oracle: &dyn WordOracle,
        spore_threshold: u32,
        rng: &mut impl Rng,
    ) -> Result<Grid, GridError> {
        let mut grid = Self::generate(size, letters, spore_threshold)?;
        if size < PLAYABLE_CHECK_MIN_SIZE || !oracle.is_ready() {
            return Ok(grid);
        }

        for attempt in 0..MAX_GENERATION_ATTEMPTS {
            let found = Self::line_words(&grid, PLAYABLE_WORD_LENGTH, oracle).len();
            if found >= PLAYABLE_WORD_TARGET {
                tracing::debug!(
                    "Board has {} line words after {} adjustments",
                    found,
                    attempt
                );
                return Ok(grid);
            }
            Self::seed_common_letters(&mut grid, letters, spore_threshold, rng);
        }

        tracing::debug!(
            "Board still short of {} line words after {} attempts",
            PLAYABLE_WORD_TARGET,
            MAX_GENERATION_ATTEMPTS
        );
        Ok(grid)
    }

    fn seed_common_letters(
        grid: &mut Grid,
        letters: &mut dyn LetterSource,
        spore_threshold: u32,
        rng: &mut impl Rng,
    ) {
        let positions: Vec<Position> = grid.positions().collect();
        for pos in positions {
            if rng.random_bool(COMMON_LETTER_FRACTION) {
                grid.spawn(pos, letters.common_letter(), spore_threshold);
            }
        }
    }

    /// Distinct dictionary words of exactly `length` letters readable along
    /// any of the eight straight-line directions
    pub fn line_words(grid: &Grid, length: usize, oracle: &dyn WordOracle) -> BTreeSet<String> {
        let mut words = BTreeSet::new();
        if length == 0 {
            return words;
        }

        for start in grid.positions() {
            for (dr, dc) in DIRECTIONS {
                let Some(path) = Self::line_path(grid, start, dr, dc, length) else {
                    continue;
                };
                if let Some(word) = grid.word_at(&path) {
                    if oracle.is_valid(&word) {
                        words.insert(word);
                    }
                }
            }
        }

        words
    }

    fn line_path(
        grid: &Grid,
        start: Position,
        dr: isize,
        dc: isize,
        length: usize,
    ) -> Option<Vec<Position>> {
        (0..length as isize)
            .map(|step| {
                let row = start.row as isize + dr * step;
                let col = start.col as isize + dc * step;
                if row < 0 || col < 0 {
                    return None;
                }
                let pos = Position::new(row as usize, col as usize);
                grid.in_bounds(pos).then_some(pos)
            })
            .collect()
    }
}
