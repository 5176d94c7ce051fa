//! Explosion and spore-spreading chain reaction.
//!
//! A validated word's tiles are queued and exploded one at a time. Each
//! explosion removes its tile and scatters spores over nearby tiles, weighted
//! toward close tiles and tiles that are already close to bursting. A tile
//! reaching its threshold joins the back of the queue. The chain stops when
//! the queue drains or the cascade cap is hit; whatever is still queued then
//! is abandoned in place.

use std::collections::{HashSet, VecDeque};

use rand::Rng;

use crate::{
    game::{grid::Grid, selection::SelectedTile},
    models::{GameParameters, Position, Tile, TileId},
};

pub const DEFAULT_MAX_CASCADES: usize = 8;

/// Distance at which a candidate's spore weight falls to zero
pub const SPORE_FALLOFF: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadePhase {
    Idle,
    Exploding,
    Settling,
}

/// Bookkeeping for one chain reaction
#[derive(Debug, Clone)]
pub struct CascadeState {
    pending: VecDeque<SelectedTile>,
    queued: HashSet<TileId>,
    exploded: HashSet<TileId>,
    original: HashSet<TileId>,
    word_length: usize,
    cascade_count: usize,
}

impl CascadeState {
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_queued(&self, id: TileId) -> bool {
        self.queued.contains(&id)
    }

    pub fn has_exploded(&self, id: TileId) -> bool {
        self.exploded.contains(&id)
    }

    pub fn tiles_exploded(&self) -> usize {
        self.exploded.len()
    }

    pub fn cascade_count(&self) -> usize {
        self.cascade_count
    }

    pub fn word_length(&self) -> usize {
        self.word_length
    }

    fn enqueue(&mut self, tile: SelectedTile) -> bool {
        if self.queued.contains(&tile.id) || self.exploded.contains(&tile.id) {
            return false;
        }
        self.queued.insert(tile.id);
        self.pending.push_back(tile);
        true
    }
}

/// One spore landing on a tile
#[derive(Debug, Clone, PartialEq)]
pub struct SporeHit {
    pub position: Position,
    /// Spore count after this hit
    pub spore_count: u32,
    /// Whether this hit queued the tile for explosion
    pub triggered: bool,
}

/// One processed explosion
#[derive(Debug, Clone)]
pub struct Explosion {
    pub tile: Tile,
    pub position: Position,
    pub hits: Vec<SporeHit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub tiles_exploded: usize,
    pub cascade_count: usize,
    /// Queued tiles left unexploded because the cap was reached
    pub abandoned: usize,
}

#[derive(Debug, Clone)]
pub enum StepOutcome {
    Exploded(Explosion),
    /// A queue entry that was already handled or no longer on the grid
    Skipped(TileId),
    Finished(CascadeOutcome),
}

pub struct CascadeEngine {
    max_cascades: usize,
}

impl Default for CascadeEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CASCADES)
    }
}

impl CascadeEngine {
    pub fn new(max_cascades: usize) -> Self {
        Self { max_cascades }
    }

    pub fn max_cascades(&self) -> usize {
        self.max_cascades
    }

    /// Queue a word's tiles for explosion, in selection order
    pub fn start(&self, tiles: &[SelectedTile]) -> CascadeState {
        let mut state = CascadeState {
            pending: VecDeque::with_capacity(tiles.len()),
            queued: HashSet::new(),
            exploded: HashSet::new(),
            original: tiles.iter().map(|t| t.id).collect(),
            word_length: tiles.len(),
            cascade_count: 0,
        };
        for tile in tiles {
            // Duplicates stay in the queue; the exploded-set check skips them
            state.queued.insert(tile.id);
            state.pending.push_back(*tile);
        }
        state
    }

    pub fn is_finished(&self, state: &CascadeState) -> bool {
        state.pending.is_empty() || state.cascade_count >= self.max_cascades
    }

    /// Process the next queued tile, or report the chain as finished
    pub fn step<R: Rng>(
        &self,
        state: &mut CascadeState,
        grid: &mut Grid,
        params: &GameParameters,
        rng: &mut R,
    ) -> StepOutcome {
        if self.is_finished(state) {
            return StepOutcome::Finished(self.finish(state));
        }

        let Some(next) = state.pending.pop_front() else {
            return StepOutcome::Finished(self.finish(state));
        };
        if !state.pending.iter().any(|t| t.id == next.id) {
            state.queued.remove(&next.id);
        }

        if state.exploded.contains(&next.id) {
            tracing::debug!("Tile {:?} already exploded, skipping", next.id);
            return StepOutcome::Skipped(next.id);
        }

        let Some(position) = grid.resolve(next.id, next.position) else {
            tracing::warn!("Queued tile {:?} is no longer on the grid", next.id);
            return StepOutcome::Skipped(next.id);
        };
        let Some(tile) = grid.take(position) else {
            return StepOutcome::Skipped(next.id);
        };
        state.exploded.insert(tile.id);

        let emission = params.spore_emission(state.word_length);
        let hits = self.distribute_spores(state, grid, position, emission, params, rng);

        tracing::debug!(
            "Exploded '{}' at {:?}: {} spores, {} queued, cascade {}",
            tile.letter.ch,
            position,
            hits.len(),
            state.pending.len(),
            state.cascade_count
        );

        StepOutcome::Exploded(Explosion {
            tile,
            position,
            hits,
        })
    }

    /// Run a whole chain without pacing
    pub fn run<R: Rng>(
        &self,
        tiles: &[SelectedTile],
        grid: &mut Grid,
        params: &GameParameters,
        rng: &mut R,
    ) -> (CascadeOutcome, Vec<Explosion>) {
        let mut state = self.start(tiles);
        let mut explosions = Vec::new();
        loop {
            match self.step(&mut state, grid, params, rng) {
                StepOutcome::Exploded(explosion) => explosions.push(explosion),
                StepOutcome::Skipped(_) => {}
                StepOutcome::Finished(outcome) => return (outcome, explosions),
            }
        }
    }

    fn finish(&self, state: &mut CascadeState) -> CascadeOutcome {
        let abandoned: HashSet<TileId> = state
            .pending
            .iter()
            .map(|t| t.id)
            .filter(|id| !state.exploded.contains(id))
            .collect();
        if !abandoned.is_empty() {
            tracing::info!(
                "Cascade cap of {} reached, abandoning {} queued tiles",
                self.max_cascades,
                abandoned.len()
            );
        }
        state.pending.clear();
        state.queued.clear();

        CascadeOutcome {
            tiles_exploded: state.exploded.len(),
            cascade_count: state.cascade_count,
            abandoned: abandoned.len(),
        }
    }

    fn distribute_spores<R: Rng>(
        &self,
        state: &mut CascadeState,
        grid: &mut Grid,
        center: Position,
        emission: u32,
        params: &GameParameters,
        rng: &mut R,
    ) -> Vec<SporeHit> {
        let candidates = spore_candidates(grid, center, params, state);
        if candidates.is_empty() || emission == 0 {
            return Vec::new();
        }

        let weights: Vec<f64> = candidates.iter().map(|(_, w)| *w).collect();
        let mut hits = Vec::with_capacity(emission as usize);

        for _ in 0..emission {
            let position = candidates[weighted_pick(&weights, rng)].0;
            let Some(tile) = grid.get_mut(position) else {
                continue;
            };
            tile.spore_count += 1;
            let charged = tile.is_charged();
            let selected = SelectedTile::from(&*tile);
            let spore_count = tile.spore_count;

            let mut triggered = false;
            if charged && state.cascade_count < self.max_cascades && state.enqueue(selected) {
                triggered = true;
                if !state.original.contains(&selected.id) {
                    state.cascade_count += 1;
                }
            }

            hits.push(SporeHit {
                position,
                spore_count,
                triggered,
            });
        }

        hits
    }
}

/// Tiles around `center` that may receive spores, with their draw weights.
/// Queued and exploded tiles are excluded, as are tiles too far away to
/// carry a positive weight.
pub fn spore_candidates(
    grid: &Grid,
    center: Position,
    params: &GameParameters,
    state: &CascadeState,
) -> Vec<(Position, f64)> {
    let radius = params.search_radius();
    let row_range = center.row.saturating_sub(radius)..=center.row + radius;
    let col_range = center.col.saturating_sub(radius)..=center.col + radius;

    let mut candidates = Vec::new();
    for row in row_range {
        for col in col_range.clone() {
            let pos = Position::new(row, col);
            if pos == center {
                continue;
            }
            let Some(tile) = grid.get(pos) else {
                continue;
            };
            if state.is_queued(tile.id) || state.has_exploded(tile.id) {
                continue;
            }

            let distance = center.euclidean(&pos);
            let mut weight = (SPORE_FALLOFF - distance) / params.spore_distribution;
            if weight <= 0.0 {
                continue;
            }
            if tile.spore_count > 0 {
                weight *= 1.0 + 2.0 * tile.charge_ratio();
            }
            candidates.push((pos, weight));
        }
    }
    candidates
}

/// Cumulative-weight sampling. `weights` must be non-empty.
pub fn weighted_pick<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    let random_value = rng.random::<f64>() * total;

    let mut cumulative = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if random_value < cumulative {
            return i;
        }
    }

    weights.len().saturating_sub(1)
}
