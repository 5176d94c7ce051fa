use std::collections::BTreeSet;
use std::time::Duration;

use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    dictionary::WordOracle,
    game::{
        cascade::{CascadeEngine, CascadeOutcome, CascadePhase, CascadeState, StepOutcome},
        compactor::{CompactionReport, GridCompactor},
        grid::{Grid, GridError, GridGenerator},
        scheduler::Scheduler,
        scorer::CascadeBonus,
        selection::{ExtendOutcome, SelectedTile, SelectionPath},
        validator::{Verdict, WordEvaluator},
    },
    models::{GameParameters, GridEvent, ParameterError, Position},
    utils::letters::LetterSource,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("invalid game parameters: {0}")]
    Parameters(#[from] ParameterError),
}

/// Fixed settings for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub grid_size: usize,
    pub max_cascades: usize,
    /// Pause between explosion steps
    pub cascade_delay: Duration,
}

/// What releasing a selection did
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Input arrived while a cascade was running, or nothing was selected
    Ignored,
    TooShort,
    Rejected { word: String },
    Accepted { word: String, score: u32 },
}

/// Result of one `advance` call
#[derive(Debug, Clone)]
pub enum Progress {
    Idle,
    Exploded { position: Position, letter: char },
    Skipped,
    CascadeFinished(CascadeOutcome),
    Settled(TurnSummary),
}

/// Everything a finished word set off
#[derive(Debug, Clone)]
pub struct TurnSummary {
    pub word: String,
    pub score: u32,
    pub cascade: CascadeOutcome,
    pub bonus: CascadeBonus,
    pub compaction: CompactionReport,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub total_score: u64,
    pub words_played: usize,
    pub best_word: Option<(String, u32)>,
}

struct ActiveTurn {
    word: String,
    score: u32,
    word_length: usize,
    state: CascadeState,
    outcome: Option<CascadeOutcome>,
}

/// One player's board: selection input, word resolution and the cascade
/// that follows, ending with a refilled grid.
pub struct GameSession<O: WordOracle> {
    grid: Grid,
    params: GameParameters,
    selection: SelectionPath,
    evaluator: WordEvaluator<O>,
    engine: CascadeEngine,
    phase: CascadePhase,
    turn: Option<ActiveTurn>,
    letters: Box<dyn LetterSource + Send>,
    rng: StdRng,
    events: UnboundedSender<GridEvent>,
    cascade_delay: Duration,
    stats: SessionStats,
}

impl<O: WordOracle> GameSession<O> {
    /// Start a session on a freshly generated board
    pub fn new(
        config: &SessionConfig,
        params: GameParameters,
        oracle: O,
        mut letters: Box<dyn LetterSource + Send>,
        mut rng: StdRng,
        events: UnboundedSender<GridEvent>,
    ) -> Result<Self, SessionError> {
        params.validate()?;
        let grid = GridGenerator::generate_playable(
            config.grid_size,
            letters.as_mut(),
            &oracle,
            params.spore_threshold,
            &mut rng,
        )?;
        tracing::info!(
            "New {}x{} board, cascade cap {}",
            config.grid_size,
            config.grid_size,
            config.max_cascades
        );
        Self::from_grid(grid, config, params, oracle, letters, rng, events)
    }

    /// Start a session on an existing board
    pub fn from_grid(
        mut grid: Grid,
        config: &SessionConfig,
        params: GameParameters,
        oracle: O,
        letters: Box<dyn LetterSource + Send>,
        rng: StdRng,
        events: UnboundedSender<GridEvent>,
    ) -> Result<Self, SessionError> {
        params.validate()?;
        grid.sync_thresholds(params.spore_threshold);
        Ok(Self {
            grid,
            params,
            selection: SelectionPath::new(),
            evaluator: WordEvaluator::new(oracle),
            engine: CascadeEngine::new(config.max_cascades),
            phase: CascadePhase::Idle,
            turn: None,
            letters,
            rng,
            events,
            cascade_delay: config.cascade_delay,
            stats: SessionStats::default(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &GameParameters {
        &self.params
    }

    pub fn phase(&self) -> CascadePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != CascadePhase::Idle
    }

    pub fn selection(&self) -> &SelectionPath {
        &self.selection
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn oracle(&self) -> &O {
        self.evaluator.oracle()
    }

    pub fn cascade_delay(&self) -> Duration {
        self.cascade_delay
    }

    /// Replace the game parameters. Every live tile takes the new threshold.
    pub fn set_parameters(&mut self, params: GameParameters) -> Result<(), ParameterError> {
        params.validate()?;
        self.grid.sync_thresholds(params.spore_threshold);
        tracing::info!("Game parameters updated: {:?}", params);
        self.params = params;
        Ok(())
    }

    /// Press on a tile. Ignored while a cascade is in progress.
    pub fn begin_selection(&mut self, pos: Position) -> bool {
        if self.is_busy() {
            tracing::debug!("Ignoring selection start at {:?} during cascade", pos);
            return false;
        }
        let Some(tile) = self.grid.get(pos) else {
            return false;
        };
        self.selection.begin(SelectedTile::from(tile));
        true
    }

    /// Drag onto a tile
    pub fn extend_selection(&mut self, pos: Position) -> ExtendOutcome {
        if self.is_busy() {
            return ExtendOutcome::Ignored;
        }
        let Some(tile) = self.grid.get(pos) else {
            return ExtendOutcome::Ignored;
        };
        self.selection.extend(SelectedTile::from(tile))
    }

    /// Release the pointer. A valid word starts a cascade.
    pub fn end_selection(&mut self) -> SelectionOutcome {
        if self.is_busy() {
            return SelectionOutcome::Ignored;
        }
        if self.selection.is_empty() {
            return SelectionOutcome::Ignored;
        }
        let Some(tiles) = self.selection.end() else {
            return SelectionOutcome::TooShort;
        };

        match self.evaluator.evaluate(&self.grid, &tiles, &self.params) {
            Verdict::Rejected { word } => {
                tracing::info!("Rejected '{}'", word);
                self.emit(GridEvent::WordRejected { word: word.clone() });
                SelectionOutcome::Rejected { word }
            }
            Verdict::Accepted { word, score } => {
                tracing::info!("Accepted '{}' for {} points", word, score);
                self.emit(GridEvent::WordAccepted {
                    word: word.clone(),
                    score,
                });
                self.turn = Some(ActiveTurn {
                    word: word.clone(),
                    score,
                    word_length: tiles.len(),
                    state: self.engine.start(&tiles),
                    outcome: None,
                });
                self.phase = CascadePhase::Exploding;
                SelectionOutcome::Accepted { word, score }
            }
        }
    }

    /// Trace a whole path in one go: press, drag through, release
    pub fn submit_path(&mut self, path: &[Position]) -> SelectionOutcome {
        let Some((first, rest)) = path.split_first() else {
            return SelectionOutcome::Ignored;
        };
        if !self.begin_selection(*first) {
            return SelectionOutcome::Ignored;
        }
        for pos in rest {
            self.extend_selection(*pos);
        }
        self.end_selection()
    }

    /// Perform one unit of cascade work: a single explosion while exploding,
    /// or the whole compaction and refill while settling.
    pub fn advance(&mut self) -> Progress {
        match self.phase {
            CascadePhase::Idle => Progress::Idle,
            CascadePhase::Exploding => self.advance_explosion(),
            CascadePhase::Settling => self.settle(),
        }
    }

    /// Drive the current cascade to completion, pausing between explosions
    pub async fn run_cascade(&mut self, scheduler: &dyn Scheduler) -> Option<TurnSummary> {
        loop {
            match self.advance() {
                Progress::Idle => return None,
                Progress::Exploded { .. } => scheduler.after(self.cascade_delay).await,
                Progress::Skipped | Progress::CascadeFinished(_) => {}
                Progress::Settled(summary) => return Some(summary),
            }
        }
    }

    /// Distinct dictionary words of `length` letters on straight lines
    pub fn hints(&self, length: usize) -> BTreeSet<String> {
        GridGenerator::line_words(&self.grid, length, self.evaluator.oracle())
    }

    fn advance_explosion(&mut self) -> Progress {
        let Some(turn) = self.turn.as_mut() else {
            tracing::warn!("Exploding without an active word, settling the board");
            self.phase = CascadePhase::Settling;
            return Progress::Skipped;
        };

        match self
            .engine
            .step(&mut turn.state, &mut self.grid, &self.params, &mut self.rng)
        {
            StepOutcome::Exploded(explosion) => {
                let letter = explosion.tile.letter.ch;
                let _ = self.events.send(GridEvent::TileRemoved {
                    position: explosion.position,
                    letter,
                });
                for hit in &explosion.hits {
                    let _ = self.events.send(GridEvent::SporesLanded {
                        position: hit.position,
                        spore_count: hit.spore_count,
                    });
                }
                Progress::Exploded {
                    position: explosion.position,
                    letter,
                }
            }
            StepOutcome::Skipped(_) => Progress::Skipped,
            StepOutcome::Finished(outcome) => {
                turn.outcome = Some(outcome);
                self.phase = CascadePhase::Settling;
                tracing::info!(
                    "Cascade finished: {} tiles exploded, {} chained",
                    outcome.tiles_exploded,
                    outcome.cascade_count
                );
                self.emit(GridEvent::CascadeComplete {
                    tiles_exploded: outcome.tiles_exploded,
                    cascade_count: outcome.cascade_count,
                });
                Progress::CascadeFinished(outcome)
            }
        }
    }

    fn settle(&mut self) -> Progress {
        let mut events = Vec::new();
        let compaction = GridCompactor::settle(
            &mut self.grid,
            self.letters.as_mut(),
            self.params.spore_threshold,
            &mut events,
        );
        for event in events {
            self.emit(event);
        }
        self.phase = CascadePhase::Idle;

        let Some(turn) = self.turn.take() else {
            return Progress::Idle;
        };
        let cascade = turn.outcome.unwrap_or(CascadeOutcome {
            tiles_exploded: turn.state.tiles_exploded(),
            cascade_count: turn.state.cascade_count(),
            abandoned: 0,
        });
        let bonus = CascadeBonus::from_outcome(
            turn.word_length,
            cascade.tiles_exploded,
            cascade.cascade_count,
            self.engine.max_cascades(),
        );

        let points = turn.score + bonus.total();
        self.stats.total_score += points as u64;
        self.stats.words_played += 1;
        if self
            .stats
            .best_word
            .as_ref()
            .map_or(true, |(_, best)| points > *best)
        {
            self.stats.best_word = Some((turn.word.clone(), points));
        }

        tracing::debug!(
            "Board settled: {} moved, {} added, bonus {}",
            compaction.moved,
            compaction.added,
            bonus.total()
        );

        Progress::Settled(TurnSummary {
            word: turn.word,
            score: turn.score,
            cascade,
            bonus,
            compaction,
        })
    }

    fn emit(&self, event: GridEvent) {
        // A departed renderer must not stall the game
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dictionary::{Dictionary, PendingDictionary},
        game::{cascade::DEFAULT_MAX_CASCADES, scheduler::ImmediateScheduler},
        utils::letters::{SequenceLetterSource, WeightedLetterSource},
    };
    use rand::SeedableRng;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn config(size: usize) -> SessionConfig {
        SessionConfig {
            grid_size: size,
            max_cascades: DEFAULT_MAX_CASCADES,
            cascade_delay: Duration::from_millis(250),
        }
    }

    fn session_with<O: WordOracle>(
        rows: &str,
        size: usize,
        params: GameParameters,
        oracle: O,
        prime: u32,
    ) -> (GameSession<O>, UnboundedReceiver<GridEvent>) {
        let mut source = SequenceLetterSource::new(rows);
        let mut grid = GridGenerator::generate(size, &mut source, params.spore_threshold).unwrap();
        for tile in grid.tiles_mut() {
            tile.spore_count = prime;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let session = GameSession::from_grid(
            grid,
            &config(size),
            params,
            oracle,
            Box::new(WeightedLetterSource::new(StdRng::seed_from_u64(99))),
            StdRng::seed_from_u64(42),
            tx,
        )
        .unwrap();
        (session, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<GridEvent>) -> Vec<GridEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn letters(grid: &Grid) -> String {
        grid.tiles().map(|t| t.letter.ch).collect()
    }

    fn path(cells: &[(usize, usize)]) -> Vec<Position> {
        cells.iter().map(|(r, c)| Position::new(*r, *c)).collect()
    }

    #[tokio::test]
    async fn test_valid_word_cascades_and_refills() {
        let (mut session, mut rx) = session_with(
            "CATEEEEE",
            8,
            GameParameters::default(),
            Dictionary::from_words(["cat"]),
            0,
        );

        let outcome = session.submit_path(&path(&[(0, 0), (0, 1), (0, 2)]));
        assert_eq!(
            outcome,
            SelectionOutcome::Accepted {
                word: "CAT".to_string(),
                score: 3
            }
        );
        assert_eq!(session.phase(), CascadePhase::Exploding);

        let summary = session.run_cascade(&ImmediateScheduler).await.unwrap();

        assert_eq!(summary.word, "CAT");
        assert!(summary.cascade.tiles_exploded >= 3);
        assert!(session.grid().is_full());
        assert_eq!(session.phase(), CascadePhase::Idle);

        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            GridEvent::WordAccepted {
                word: "CAT".to_string(),
                score: 3
            }
        );
        let removed = events
            .iter()
            .filter(|e| matches!(e, GridEvent::TileRemoved { .. }))
            .count();
        let added = events
            .iter()
            .filter(|e| matches!(e, GridEvent::TileAdded { .. }))
            .count();
        assert_eq!(removed, summary.cascade.tiles_exploded);
        assert_eq!(added, summary.cascade.tiles_exploded);
        assert!(events.iter().any(|e| matches!(
            e,
            GridEvent::CascadeComplete { tiles_exploded, .. } if *tiles_exploded == summary.cascade.tiles_exploded
        )));
    }

    #[test]
    fn test_two_tiles_do_nothing() {
        let (mut session, mut rx) = session_with(
            "CATEEEEE",
            8,
            GameParameters::default(),
            Dictionary::from_words(["ca"]),
            0,
        );
        let before = letters(session.grid());

        let outcome = session.submit_path(&path(&[(0, 0), (0, 1)]));

        assert_eq!(outcome, SelectionOutcome::TooShort);
        assert!(session.selection().is_empty());
        assert_eq!(letters(session.grid()), before);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(session.phase(), CascadePhase::Idle);
    }

    #[test]
    fn test_unknown_word_is_rejected() {
        let (mut session, mut rx) = session_with(
            "ZZZZZZEE",
            8,
            GameParameters::default(),
            Dictionary::from_words(["cat"]),
            0,
        );
        let before = letters(session.grid());

        let outcome =
            session.submit_path(&path(&[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]));

        let word = "ZZZZZZ".to_string();
        assert_eq!(outcome, SelectionOutcome::Rejected { word: word.clone() });
        assert_eq!(drain(&mut rx), vec![GridEvent::WordRejected { word }]);
        assert_eq!(letters(session.grid()), before);
        assert!(session.selection().is_empty());
        assert!(matches!(session.advance(), Progress::Idle));
    }

    #[test]
    fn test_long_word_uses_length_factor() {
        let params = GameParameters {
            word_length_factor: 1.5,
            spore_threshold: 50,
            ..Default::default()
        };
        let (mut session, _rx) =
            session_with("BYWAYSEE", 8, params, Dictionary::from_words(["byways"]), 0);

        let outcome =
            session.submit_path(&path(&[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]));

        // B2 Y2 W2 A1 Y2 S1 = 10, 10 * 1.5 = 15
        assert_eq!(
            outcome,
            SelectionOutcome::Accepted {
                word: "BYWAYS".to_string(),
                score: 15
            }
        );
    }

    #[test]
    fn test_cascade_cap_still_refills() {
        let params = GameParameters {
            spore_count: 3,
            spore_threshold: 2,
            spore_distribution: 2.0,
            word_length_factor: 1.5,
        };
        let (mut session, mut rx) =
            session_with("STARE", 8, params, Dictionary::from_words(["star"]), 1);

        let outcome = session.submit_path(&path(&[(0, 0), (0, 1), (0, 2), (0, 3)]));
        assert!(matches!(outcome, SelectionOutcome::Accepted { .. }));

        let summary =
            tokio_test::block_on(session.run_cascade(&ImmediateScheduler)).unwrap();

        assert_eq!(summary.cascade.cascade_count, DEFAULT_MAX_CASCADES);
        assert!(summary.cascade.tiles_exploded <= 4 + DEFAULT_MAX_CASCADES);
        assert_eq!(summary.bonus.max_cascade, crate::game::scorer::MAX_CASCADE_BONUS);
        assert!(session.grid().is_full());
        assert!(drain(&mut rx).contains(&GridEvent::CascadeComplete {
            tiles_exploded: summary.cascade.tiles_exploded,
            cascade_count: DEFAULT_MAX_CASCADES,
        }));
    }

    #[test]
    fn test_input_ignored_while_cascading() {
        let (mut session, _rx) = session_with(
            "CATEEEEE",
            8,
            GameParameters::default(),
            Dictionary::from_words(["cat"]),
            0,
        );
        session.submit_path(&path(&[(0, 0), (0, 1), (0, 2)]));
        assert!(session.is_busy());

        assert!(!session.begin_selection(Position::new(5, 5)));
        assert_eq!(
            session.extend_selection(Position::new(5, 6)),
            ExtendOutcome::Ignored
        );
        assert_eq!(session.end_selection(), SelectionOutcome::Ignored);
        assert!(session.selection().is_empty());

        while session.is_busy() {
            session.advance();
        }
        assert!(session.grid().is_full());
        assert!(session.begin_selection(Position::new(5, 5)));
    }

    #[test]
    fn test_explosions_leave_holes_until_settled() {
        let params = GameParameters {
            spore_threshold: 50,
            ..Default::default()
        };
        let (mut session, _rx) =
            session_with("CATEEEEE", 8, params, Dictionary::from_words(["cat"]), 0);
        session.submit_path(&path(&[(0, 0), (0, 1), (0, 2)]));

        assert!(matches!(session.advance(), Progress::Exploded { letter: 'C', .. }));
        assert_eq!(session.grid().holes(), vec![Position::new(0, 0)]);
        session.advance();
        session.advance();
        assert!(matches!(session.advance(), Progress::CascadeFinished(_)));
        assert_eq!(session.phase(), CascadePhase::Settling);
        assert_eq!(session.grid().holes().len(), 3);

        let Progress::Settled(summary) = session.advance() else {
            panic!("expected the board to settle");
        };
        assert_eq!(summary.compaction.added, 3);
        assert!(session.grid().is_full());
        assert_eq!(session.stats().words_played, 1);
        assert_eq!(session.stats().total_score, 3);
    }

    #[test]
    fn test_set_parameters_updates_thresholds() {
        let (mut session, _rx) = session_with(
            "CATEEEEE",
            8,
            GameParameters::default(),
            Dictionary::empty(),
            0,
        );
        let params = GameParameters {
            spore_threshold: 7,
            ..Default::default()
        };
        session.set_parameters(params).unwrap();
        assert!(session.grid().tiles().all(|t| t.spore_threshold == 7));

        let bad = GameParameters {
            spore_distribution: -1.0,
            ..Default::default()
        };
        assert!(session.set_parameters(bad).is_err());
        assert_eq!(session.params().spore_threshold, 7);
    }

    #[test]
    fn test_words_rejected_until_dictionary_ready() {
        let pending = PendingDictionary::new();
        let (mut session, _rx) = session_with(
            "CATEEEEE",
            8,
            GameParameters::default(),
            pending.clone(),
            0,
        );
        let cat = path(&[(0, 0), (0, 1), (0, 2)]);

        assert!(matches!(
            session.submit_path(&cat),
            SelectionOutcome::Rejected { .. }
        ));

        pending.fulfil(Dictionary::from_words(["cat"]));
        assert!(matches!(
            session.submit_path(&cat),
            SelectionOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn test_new_session_generates_full_board() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = GameSession::new(
            &config(8),
            GameParameters::default(),
            Dictionary::from_words(["tree", "rate", "tear", "near"]),
            Box::new(WeightedLetterSource::new(StdRng::seed_from_u64(1))),
            StdRng::seed_from_u64(2),
            tx,
        )
        .unwrap();
        assert!(session.grid().is_full());
        assert_eq!(session.grid().size(), 8);
        assert_eq!(session.phase(), CascadePhase::Idle);
    }

    /// Plain `Z` boards that only change when the common-letter pass runs
    struct RareLetters;

    impl LetterSource for RareLetters {
        fn next_letter(&mut self) -> crate::models::Letter {
            crate::models::Letter::new('Z', 5)
        }

        fn common_letter(&mut self) -> crate::models::Letter {
            crate::models::Letter::new('E', 1)
        }
    }

    fn new_session_on(dictionary: PendingDictionary) -> GameSession<PendingDictionary> {
        let (tx, _rx) = mpsc::unbounded_channel();
        GameSession::new(
            &config(8),
            GameParameters::default(),
            dictionary,
            Box::new(RareLetters),
            StdRng::seed_from_u64(2),
            tx,
        )
        .unwrap()
    }

    #[test]
    fn test_board_built_after_dictionary_load_is_seeded() {
        let dictionary = PendingDictionary::new();
        dictionary.fulfil(Dictionary::from_words(["EEEE"]));
        let session = new_session_on(dictionary);
        assert!(session.grid().tiles().any(|t| t.letter.ch == 'E'));
        assert!(session.hints(4).contains("EEEE"));
    }

    #[test]
    fn test_board_built_before_dictionary_load_is_not_seeded() {
        let session = new_session_on(PendingDictionary::new());
        assert!(session.grid().tiles().all(|t| t.letter.ch == 'Z'));
    }

    #[test]
    fn test_new_session_rejects_bad_parameters() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = GameSession::new(
            &config(8),
            GameParameters {
                spore_threshold: 0,
                ..Default::default()
            },
            Dictionary::empty(),
            Box::new(SequenceLetterSource::new("E")),
            StdRng::seed_from_u64(2),
            tx,
        );
        assert!(matches!(result, Err(SessionError::Parameters(_))));
    }
}
