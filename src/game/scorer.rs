use crate::{
    game::{grid::Grid, selection::SelectedTile},
    models::{GameParameters, Letter},
};

/// Words at least this long get the length multiplier
pub const LONG_WORD_LENGTH: usize = 6;

pub const CASCADE_BONUS_PER_CHAIN: u32 = 5;
pub const OVERLOAD_BONUS_PER_TILE: u32 = 2;
pub const MAX_CASCADE_BONUS: u32 = 25;

/// Result of scoring a word
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    /// Sum of letter points
    pub base: u32,
    /// Multiplier applied to the base
    pub multiplier: f64,
    /// Final, floored score
    pub score: u32,
}

pub struct Scorer;

impl Scorer {
    /// Score a selection against the tiles currently on the grid.
    ///
    /// Scoring rules:
    /// - Each letter contributes its point value
    /// - Words of 6 or more letters multiply the total by `word_length_factor`
    /// - The result is floored to an integer
    pub fn calculate_score_with_breakdown(
        grid: &Grid,
        selection: &[SelectedTile],
        params: &GameParameters,
    ) -> ScoreResult {
        let letters: Vec<Letter> = selection
            .iter()
            .filter_map(|sel| grid.get(sel.position).map(|tile| tile.letter))
            .collect();
        Self::score_letters(&letters, params)
    }

    pub fn calculate_score(
        grid: &Grid,
        selection: &[SelectedTile],
        params: &GameParameters,
    ) -> u32 {
        Self::calculate_score_with_breakdown(grid, selection, params).score
    }

    pub fn score_letters(letters: &[Letter], params: &GameParameters) -> ScoreResult {
        let base: u32 = letters.iter().map(|l| l.points).sum();
        let multiplier = Self::length_multiplier(letters.len(), params.word_length_factor);
        let score = (base as f64 * multiplier).floor() as u32;

        ScoreResult {
            base,
            multiplier,
            score,
        }
    }

    fn length_multiplier(length: usize, factor: f64) -> f64 {
        if length >= LONG_WORD_LENGTH {
            factor
        } else {
            1.0
        }
    }
}

/// Extra points for what a word set off, computed from a finished cascade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeBonus {
    /// Per chain explosion
    pub cascade: u32,
    /// Per tile destroyed beyond the word itself
    pub overload: u32,
    /// Flat award for hitting the cascade cap
    pub max_cascade: u32,
}

impl CascadeBonus {
    pub fn from_outcome(
        word_length: usize,
        tiles_exploded: usize,
        cascade_count: usize,
        max_cascades: usize,
    ) -> Self {
        let extra_tiles = tiles_exploded.saturating_sub(word_length) as u32;
        Self {
            cascade: cascade_count as u32 * CASCADE_BONUS_PER_CHAIN,
            overload: extra_tiles * OVERLOAD_BONUS_PER_TILE,
            max_cascade: if max_cascades > 0 && cascade_count >= max_cascades {
                MAX_CASCADE_BONUS
            } else {
                0
            },
        }
    }

    pub fn total(&self) -> u32 {
        self.cascade + self.overload + self.max_cascade
    }
}
