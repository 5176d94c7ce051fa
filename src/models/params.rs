use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParameterError {
    #[error("spore threshold must be at least 1")]
    ZeroThreshold,
    #[error("spore distribution must be a positive number, got {0}")]
    InvalidDistribution(f64),
    #[error("word length factor must be a positive number, got {0}")]
    InvalidLengthFactor(f64),
}

/// Tunable rules of the spore cascade, adjustable while a game is running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameParameters {
    /// Spores emitted per explosion (upper bound)
    pub spore_count: u32,
    /// Spores a tile needs before it explodes
    pub spore_threshold: u32,
    /// Spread of spores around an explosion; larger means wider and flatter
    pub spore_distribution: f64,
    /// Score multiplier for words of six letters or more
    pub word_length_factor: f64,
}

impl Default for GameParameters {
    fn default() -> Self {
        Self {
            spore_count: 3,
            spore_threshold: 3,
            spore_distribution: 2.0,
            word_length_factor: 1.5,
        }
    }
}

impl GameParameters {
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.spore_threshold == 0 {
            return Err(ParameterError::ZeroThreshold);
        }
        if !(self.spore_distribution.is_finite() && self.spore_distribution > 0.0) {
            return Err(ParameterError::InvalidDistribution(self.spore_distribution));
        }
        if !(self.word_length_factor.is_finite() && self.word_length_factor > 0.0) {
            return Err(ParameterError::InvalidLengthFactor(self.word_length_factor));
        }
        Ok(())
    }

    /// Square neighbourhood radius searched for spore targets, between 1 and 5
    pub fn search_radius(&self) -> usize {
        (self.spore_distribution * 1.5).round().clamp(1.0, 5.0) as usize
    }

    /// Spores released by one explosion. Scales with the length of the word
    /// that started the chain, capped by `spore_count`.
    pub fn spore_emission(&self, word_length: usize) -> u32 {
        let by_length = (word_length as f64 / 1.5).ceil() as u32;
        self.spore_count.min(by_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        assert!(GameParameters::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let params = GameParameters {
            spore_threshold: 0,
            ..Default::default()
        };
        assert_eq!(params.validate(), Err(ParameterError::ZeroThreshold));

        let params = GameParameters {
            spore_distribution: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::InvalidDistribution(_))
        ));

        let params = GameParameters {
            word_length_factor: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::InvalidLengthFactor(_))
        ));
    }

    #[test]
    fn test_search_radius_is_clamped() {
        let mut params = GameParameters::default();
        params.spore_distribution = 0.1;
        assert_eq!(params.search_radius(), 1);
        params.spore_distribution = 2.0;
        assert_eq!(params.search_radius(), 3);
        params.spore_distribution = 10.0;
        assert_eq!(params.search_radius(), 5);
    }

    #[test]
    fn test_spore_emission_scales_with_word_length() {
        let params = GameParameters {
            spore_count: 3,
            ..Default::default()
        };
        // ceil(3 / 1.5) = 2
        assert_eq!(params.spore_emission(3), 2);
        // ceil(4 / 1.5) = 3
        assert_eq!(params.spore_emission(4), 3);
        // capped at spore_count
        assert_eq!(params.spore_emission(9), 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: GameParameters = serde_json::from_str(r#"{"spore_count": 5}"#).unwrap();
        assert_eq!(params.spore_count, 5);
        assert_eq!(params.spore_threshold, 3);
    }
}
