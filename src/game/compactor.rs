use crate::{
    game::grid::Grid,
    models::{GridEvent, Position},
    utils::letters::LetterSource,
};

/// Summary of one settle pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactionReport {
    pub moved: usize,
    pub added: usize,
    /// The pass left holes behind and the whole grid was regenerated
    pub reset: bool,
}

pub struct GridCompactor;

impl GridCompactor {
    /// Drop tiles down each column, refill the gaps at the top, then verify
    /// that no holes remain. Every mutation is reported through `events`.
    pub fn settle(
        grid: &mut Grid,
        letters: &mut dyn LetterSource,
        spore_threshold: u32,
        events: &mut Vec<GridEvent>,
    ) -> CompactionReport {
        let mut report = CompactionReport::default();

        for col in 0..grid.size() {
            report.moved += Self::compact_column(grid, col, events);
            report.added += Self::refill_column(grid, col, letters, spore_threshold, events);
        }

        if Self::verify_or_reset(grid, letters, spore_threshold, events) {
            report.reset = true;
        }

        report
    }

    /// Move a column's tiles to the bottom, keeping their order.
    /// Returns the number of tiles that moved.
    pub fn compact_column(grid: &mut Grid, col: usize, events: &mut Vec<GridEvent>) -> usize {
        let size = grid.size();
        let mut moved = 0;
        let mut write_row = size;

        for row in (0..size).rev() {
            let from = Position::new(row, col);
            let Some(tile) = grid.take(from) else {
                continue;
            };
            write_row -= 1;
            let to = Position::new(write_row, col);
            if to != from {
                moved += 1;
                events.push(GridEvent::TileMoved { from, to });
            }
            grid.place(to, tile);
        }

        moved
    }

    /// Fill the holes at the top of a column with new tiles
    pub fn refill_column(
        grid: &mut Grid,
        col: usize,
        letters: &mut dyn LetterSource,
        spore_threshold: u32,
        events: &mut Vec<GridEvent>,
    ) -> usize {
        let mut added = 0;
        for row in 0..grid.size() {
            let pos = Position::new(row, col);
            if grid.get(pos).is_some() {
                continue;
            }
            let letter = letters.next_letter();
            grid.spawn(pos, letter, spore_threshold);
            events.push(GridEvent::TileAdded {
                position: pos,
                letter: letter.ch,
            });
            added += 1;
        }
        added
    }

    /// Regenerate the whole grid if any hole survived. Returns true on reset.
    pub fn verify_or_reset(
        grid: &mut Grid,
        letters: &mut dyn LetterSource,
        spore_threshold: u32,
        events: &mut Vec<GridEvent>,
    ) -> bool {
        let holes = grid.holes();
        if holes.is_empty() {
            return false;
        }

        tracing::warn!(
            "Grid still has {} holes after settling, regenerating the board",
            holes.len()
        );
        grid.clear();
        events.push(GridEvent::GridReset);
        for pos in grid.positions().collect::<Vec<_>>() {
            let letter = letters.next_letter();
            grid.spawn(pos, letter, spore_threshold);
            events.push(GridEvent::TileAdded {
                position: pos,
                letter: letter.ch,
            });
        }
        true
    }
}
