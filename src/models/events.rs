use serde::{Deserialize, Serialize};

use crate::models::Position;

/// Grid mutation events emitted for rendering and scoring collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridEvent {
    WordAccepted {
        word: String,
        score: u32,
    },
    WordRejected {
        word: String,
    },
    TileRemoved {
        position: Position,
        letter: char,
    },
    SporesLanded {
        position: Position,
        spore_count: u32,
    },
    TileMoved {
        from: Position,
        to: Position,
    },
    TileAdded {
        position: Position,
        letter: char,
    },
    GridReset,
    CascadeComplete {
        tiles_exploded: usize,
        cascade_count: usize,
    },
}
