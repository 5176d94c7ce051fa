use serde::{Deserialize, Serialize};

/// A cell coordinate on the grid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Chebyshev distance between two cells
    pub fn chebyshev(&self, other: &Position) -> usize {
        let row_diff = self.row.abs_diff(other.row);
        let col_diff = self.col.abs_diff(other.col);
        row_diff.max(col_diff)
    }

    /// Two distinct cells touching horizontally, vertically or diagonally
    pub fn is_adjacent(&self, other: &Position) -> bool {
        self.chebyshev(other) == 1
    }

    pub fn euclidean(&self, other: &Position) -> f64 {
        let dr = self.row as f64 - other.row as f64;
        let dc = self.col as f64 - other.col as f64;
        (dr * dr + dc * dc).sqrt()
    }
}

/// Identity of a tile for its whole lifetime on the grid.
/// Ids are never reused within one grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TileId(pub u64);

/// A letter as produced by a letter source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct Letter {
    pub ch: char,
    pub points: u32,
}

impl Letter {
    pub fn new(ch: char, points: u32) -> Self {
        Self {
            ch: ch.to_ascii_uppercase(),
            points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub letter: Letter,
    /// Cell the tile believes it occupies. Kept in sync by the grid;
    /// the cascade engine re-locates the tile if this ever drifts.
    pub row: usize,
    pub col: usize,
    pub spore_count: u32,
    pub spore_threshold: u32,
}

impl Tile {
    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }

    pub fn set_position(&mut self, pos: Position) {
        self.row = pos.row;
        self.col = pos.col;
    }

    pub fn is_charged(&self) -> bool {
        self.spore_count >= self.spore_threshold
    }

    /// Fraction of the way to explosion, 0.0 for an uncharged tile
    pub fn charge_ratio(&self) -> f64 {
        if self.spore_threshold == 0 {
            return 1.0;
        }
        self.spore_count as f64 / self.spore_threshold as f64
    }
}
