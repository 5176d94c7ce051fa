use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::{
    game::{cascade::DEFAULT_MAX_CASCADES, session::SessionConfig},
    models::GameParameters,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub game: GameConfig,
    pub params: GameParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub dictionary_path: String,
    pub state_path: String,
    pub grid_size: usize,
    pub max_cascades: usize,
    pub cascade_delay_ms: u64,
    pub rng_seed: Option<u64>,
}

impl GameConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_cascades == 0 {
            bail!("MAX_CASCADES must be at least 1");
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let game = GameConfig {
            dictionary_path: env::var("DICTIONARY_PATH")
                .unwrap_or_else(|_| "./dictionary.txt".to_string()),
            state_path: env::var("STATE_PATH")
                .unwrap_or_else(|_| "./spore-words-state.json".to_string()),
            grid_size: env::var("GRID_SIZE")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .context("GRID_SIZE must be a number")?,
            max_cascades: env::var("MAX_CASCADES")
                .unwrap_or_else(|_| DEFAULT_MAX_CASCADES.to_string())
                .parse()
                .context("MAX_CASCADES must be a number")?,
            cascade_delay_ms: env::var("CASCADE_DELAY_MS")
                .unwrap_or_else(|_| "250".to_string())
                .parse()
                .context("CASCADE_DELAY_MS must be a number of milliseconds")?,
            rng_seed: match env::var("RNG_SEED") {
                Ok(seed) => Some(seed.parse().context("RNG_SEED must be a u64")?),
                Err(_) => None,
            },
        };

        let defaults = GameParameters::default();
        let params = GameParameters {
            spore_count: env::var("SPORE_COUNT")
                .map(|v| v.parse())
                .unwrap_or(Ok(defaults.spore_count))
                .context("SPORE_COUNT must be a number")?,
            spore_threshold: env::var("SPORE_THRESHOLD")
                .map(|v| v.parse())
                .unwrap_or(Ok(defaults.spore_threshold))
                .context("SPORE_THRESHOLD must be a number")?,
            spore_distribution: env::var("SPORE_DISTRIBUTION")
                .map(|v| v.parse())
                .unwrap_or(Ok(defaults.spore_distribution))
                .context("SPORE_DISTRIBUTION must be a number")?,
            word_length_factor: env::var("WORD_LENGTH_FACTOR")
                .map(|v| v.parse())
                .unwrap_or(Ok(defaults.word_length_factor))
                .context("WORD_LENGTH_FACTOR must be a number")?,
        };
        game.validate()?;
        params.validate().context("Invalid game parameters")?;

        Ok(Config { game, params })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            grid_size: self.game.grid_size,
            max_cascades: self.game.max_cascades,
            cascade_delay: Duration::from_millis(self.game.cascade_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_config(max_cascades: usize) -> GameConfig {
        GameConfig {
            dictionary_path: "./words.txt".to_string(),
            state_path: "./state.json".to_string(),
            grid_size: 10,
            max_cascades,
            cascade_delay_ms: 100,
            rng_seed: Some(1),
        }
    }

    #[test]
    fn test_session_config_conversion() {
        let config = Config {
            game: game_config(4),
            params: GameParameters::default(),
        };
        let session = config.session_config();
        assert_eq!(session.grid_size, 10);
        assert_eq!(session.max_cascades, 4);
        assert_eq!(session.cascade_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_zero_cascade_cap_is_rejected() {
        let err = game_config(0).validate().unwrap_err();
        assert!(err.to_string().contains("MAX_CASCADES"));
        assert!(game_config(1).validate().is_ok());
    }
}
