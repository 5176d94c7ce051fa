//! Grid state machine for a spore-cascade word game.
//!
//! Players trace adjacent tiles to spell words. Accepted words explode their
//! tiles, scattering spores that can set off further explosions, after which
//! the board compacts and refills.

pub mod command;
pub mod config;
pub mod dictionary;
pub mod game;
pub mod models;
pub mod store;
pub mod utils;
