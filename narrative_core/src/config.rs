//! Prompt assembly configuration.

use serde::{Deserialize, Serialize};
use world_model::ConfigError;

/// Limits and thresholds for context assembly.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// max_tokens_per_turn = 120000
/// hard_limit = 112000
/// language = "English"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Provider context ceiling for one turn.
    pub max_tokens_per_turn: usize,

    /// Headroom kept free below `max_tokens_per_turn`.
    pub safety_buffer: usize,

    /// Above this the prompt is emergency-truncated.
    pub hard_limit: usize,

    /// Entities scoring below this are dropped (party members exempt).
    pub min_relevance_score: u32,

    /// Fixed score given to every party member.
    pub party_score: u32,

    /// History entries scanned for recent mentions.
    pub history_window: usize,

    /// Entities at or above this score get full detail in the critical tier.
    pub critical_score: u32,

    /// Entities at or above this score (and below `critical_score`) get a
    /// brief entry in the important tier.
    pub important_score: u32,

    /// Character cap for entity descriptions in the critical tier.
    pub description_cap: usize,

    pub memoir_excerpt: usize,
    pub chapter_excerpt: usize,

    /// Number of choices the model is asked to offer.
    pub choice_count: usize,

    /// Language the narrative must be written in.
    pub language: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_turn: 90_000,
            safety_buffer: 10_000,
            hard_limit: 85_000,
            min_relevance_score: 10,
            party_score: 100,
            history_window: 3,
            critical_score: 60,
            important_score: 30,
            description_cap: 300,
            memoir_excerpt: 2,
            chapter_excerpt: 1,
            choice_count: 4,
            language: "Vietnamese".to_string(),
        }
    }
}

impl PromptConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Token budget available to the four context tiers; also the soft limit.
    pub fn base_limit(&self) -> usize {
        self.max_tokens_per_turn.saturating_sub(self.safety_buffer)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.safety_buffer >= self.max_tokens_per_turn {
            return Err(ConfigError::Invalid(format!(
                "safety_buffer ({}) must be smaller than max_tokens_per_turn ({})",
                self.safety_buffer, self.max_tokens_per_turn
            )));
        }
        if self.hard_limit < self.base_limit() {
            return Err(ConfigError::Invalid(format!(
                "hard_limit ({}) must not be below the soft limit ({})",
                self.hard_limit,
                self.base_limit()
            )));
        }
        if self.important_score > self.critical_score {
            return Err(ConfigError::Invalid(format!(
                "important_score ({}) must not exceed critical_score ({})",
                self.important_score, self.critical_score
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = PromptConfig::default();
        assert_eq!(config.base_limit(), 80_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_overrides() {
        let config = PromptConfig::from_toml_str(
            "max_tokens_per_turn = 20000\nsafety_buffer = 2000\nhard_limit = 19000\nlanguage = \"English\"",
        )
        .unwrap();
        assert_eq!(config.base_limit(), 18_000);
        assert_eq!(config.language, "English");
        assert_eq!(config.min_relevance_score, 10);
    }

    #[test]
    fn test_rejects_hard_limit_below_soft_limit() {
        let err = PromptConfig::from_toml_str("hard_limit = 1000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_oversized_buffer() {
        let config = PromptConfig {
            safety_buffer: 90_000,
            ..PromptConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
