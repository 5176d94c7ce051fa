pub mod events;
pub mod game;
pub mod params;

pub use events::GridEvent;
pub use game::{Letter, Position, Tile, TileId};
pub use params::{GameParameters, ParameterError};
