use std::collections::HashSet;

use crate::{
    dictionary::WordOracle,
    game::{
        grid::Grid,
        scorer::Scorer,
        selection::{SelectedTile, MIN_WORD_LENGTH},
    },
    models::{GameParameters, Letter},
};

/// Outcome of releasing a selection
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted { word: String, score: u32 },
    Rejected { word: String },
}

pub struct WordEvaluator<O: WordOracle> {
    oracle: O,
}

impl<O: WordOracle> WordEvaluator<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Check a word against the oracle. Short words and an oracle that has
    /// not finished loading both mean "not a word".
    pub fn is_valid_word(&self, word: &str) -> bool {
        if word.chars().count() < MIN_WORD_LENGTH {
            return false;
        }
        if !self.oracle.is_ready() {
            tracing::debug!("Dictionary not ready, rejecting '{}'", word);
            return false;
        }
        self.oracle.is_valid(word)
    }

    /// Validate and score a released selection
    pub fn evaluate(
        &self,
        grid: &Grid,
        selection: &[SelectedTile],
        params: &GameParameters,
    ) -> Verdict {
        let word = Self::extract_word(grid, selection);

        if !Self::is_valid_path(grid, selection) || !self.is_valid_word(&word) {
            return Verdict::Rejected { word };
        }

        let letters: Vec<Letter> = Self::letters(grid, selection);
        let score = Scorer::score_letters(&letters, params).score;
        Verdict::Accepted { word, score }
    }

    /// Validate that positions form a valid path on the grid
    pub fn is_valid_path(grid: &Grid, selection: &[SelectedTile]) -> bool {
        if selection.is_empty() {
            return false;
        }

        // Check that each tile is adjacent to the previous one
        for window in selection.windows(2) {
            if !window[0].position.is_adjacent(&window[1].position) {
                return false;
            }
        }

        // Check that no tile is used twice
        let unique_tiles: HashSet<_> = selection.iter().map(|t| t.id).collect();
        if unique_tiles.len() != selection.len() {
            return false;
        }

        // Check that every tile is still where the selection saw it
        selection
            .iter()
            .all(|sel| grid.get(sel.position).map(|t| t.id) == Some(sel.id))
    }

    /// Extract word from the selected tiles, in pick order
    pub fn extract_word(grid: &Grid, selection: &[SelectedTile]) -> String {
        Self::letters(grid, selection).iter().map(|l| l.ch).collect()
    }

    fn letters(grid: &Grid, selection: &[SelectedTile]) -> Vec<Letter> {
        selection
            .iter()
            .filter_map(|sel| {
                let pos = match grid.get(sel.position) {
                    Some(tile) if tile.id == sel.id => sel.position,
                    _ => grid.locate(sel.id)?,
                };
                grid.get(pos).map(|tile| tile.letter)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dictionary::{Dictionary, PendingDictionary},
        game::grid::GridGenerator,
        models::Position,
        utils::letters::SequenceLetterSource,
    };

    fn select(grid: &Grid, cells: &[(usize, usize)]) -> Vec<SelectedTile> {
        cells
            .iter()
            .map(|(r, c)| SelectedTile::from(grid.get(Position::new(*r, *c)).unwrap()))
            .collect()
    }

    fn cat_grid() -> Grid {
        // C A T
        // Z Z Z
        // Z Z Z
        let mut source = SequenceLetterSource::new("CATZZZZZZ");
        GridGenerator::generate(3, &mut source, 3).unwrap()
    }

    #[test]
    fn test_extract_word_in_selection_order() {
        let grid = cat_grid();
        let selection = select(&grid, &[(0, 2), (0, 1), (0, 0)]);
        assert_eq!(WordEvaluator::<Dictionary>::extract_word(&grid, &selection), "TAC");
    }

    #[test]
    fn test_accepts_dictionary_word() {
        let grid = cat_grid();
        let evaluator = WordEvaluator::new(Dictionary::from_words(["cat"]));
        let verdict = evaluator.evaluate(
            &grid,
            &select(&grid, &[(0, 0), (0, 1), (0, 2)]),
            &GameParameters::default(),
        );
        assert_eq!(
            verdict,
            Verdict::Accepted {
                word: "CAT".to_string(),
                score: 3
            }
        );
    }

    #[test]
    fn test_rejects_unknown_word() {
        let grid = cat_grid();
        let evaluator = WordEvaluator::new(Dictionary::from_words(["cat"]));
        let verdict = evaluator.evaluate(
            &grid,
            &select(&grid, &[(1, 0), (1, 1), (1, 2), (2, 2), (2, 1), (2, 0)]),
            &GameParameters::default(),
        );
        assert_eq!(
            verdict,
            Verdict::Rejected {
                word: "ZZZZZZ".to_string()
            }
        );
    }

    #[test]
    fn test_short_words_always_invalid() {
        let evaluator = WordEvaluator::new(Dictionary::from_words(["at"]));
        assert!(!evaluator.is_valid_word("AT"));
    }

    #[test]
    fn test_not_ready_oracle_rejects() {
        let evaluator = WordEvaluator::new(PendingDictionary::new());
        assert!(!evaluator.is_valid_word("CAT"));
        evaluator.oracle().fulfil(Dictionary::from_words(["cat"]));
        assert!(evaluator.is_valid_word("CAT"));
    }

    #[test]
    fn test_invalid_paths() {
        let grid = cat_grid();
        // Not adjacent
        assert!(!WordEvaluator::<Dictionary>::is_valid_path(
            &grid,
            &select(&grid, &[(0, 0), (0, 2), (1, 1)])
        ));
        // Repeated tile
        assert!(!WordEvaluator::<Dictionary>::is_valid_path(
            &grid,
            &select(&grid, &[(0, 0), (0, 1), (0, 0)])
        ));
        assert!(!WordEvaluator::<Dictionary>::is_valid_path(&grid, &[]));
        assert!(WordEvaluator::<Dictionary>::is_valid_path(
            &grid,
            &select(&grid, &[(0, 0), (1, 1), (0, 2)])
        ));
    }
}
