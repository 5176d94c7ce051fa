use crate::models::{Position, Tile, TileId};

/// Shortest path that is handed to the evaluator on release
pub const MIN_WORD_LENGTH: usize = 3;

/// A tile as remembered by the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedTile {
    pub id: TileId,
    pub position: Position,
}

impl From<&Tile> for SelectedTile {
    fn from(tile: &Tile) -> Self {
        Self {
            id: tile.id,
            position: tile.position(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendOutcome {
    Appended,
    /// The previous tile was re-entered, so the last tile was dropped
    Backtracked,
    Ignored,
}

/// The player's in-progress chain of adjacent tiles, in pick order
#[derive(Debug, Clone, Default)]
pub struct SelectionPath {
    tiles: Vec<SelectedTile>,
}

impl SelectionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new chain at `tile`, discarding any previous one
    pub fn begin(&mut self, tile: SelectedTile) {
        self.tiles.clear();
        self.tiles.push(tile);
    }

    /// Grow the chain by one tile, or retract it when the player drags back
    /// onto the second-to-last tile
    pub fn extend(&mut self, tile: SelectedTile) -> ExtendOutcome {
        let Some(last) = self.tiles.last() else {
            return ExtendOutcome::Ignored;
        };

        if last.id == tile.id || !last.position.is_adjacent(&tile.position) {
            return ExtendOutcome::Ignored;
        }

        let len = self.tiles.len();
        if len >= 2 && self.tiles[len - 2].id == tile.id {
            self.tiles.pop();
            return ExtendOutcome::Backtracked;
        }

        if self.contains(tile.id) {
            return ExtendOutcome::Ignored;
        }

        self.tiles.push(tile);
        ExtendOutcome::Appended
    }

    /// Finish the gesture. The chain is cleared either way; it is returned
    /// only when it is long enough to be a word.
    pub fn end(&mut self) -> Option<Vec<SelectedTile>> {
        let tiles = std::mem::take(&mut self.tiles);
        (tiles.len() >= MIN_WORD_LENGTH).then_some(tiles)
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.iter().any(|t| t.id == id)
    }

    pub fn tiles(&self) -> &[SelectedTile] {
        &self.tiles
    }

    pub fn positions(&self) -> Vec<Position> {
        self.tiles.iter().map(|t| t.position).collect()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
