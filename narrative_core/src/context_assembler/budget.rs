//! Token budget allocation across the four context tiers.

use serde::Serialize;
use tracing::debug;

use world_model::GameState;

use super::EntityRelevance;
use crate::config::PromptConfig;

/// Scores above this count as "high" when judging scene complexity.
const HIGH_SCORE: u32 = 70;
/// More high-scoring entities than this is a crowded scene.
const CROWDED_SCENE: usize = 5;
/// Points moved from important to critical in a crowded scene.
const CROWDED_SHIFT: u32 = 10;
/// Points moved from important to critical when no quest is active.
const IDLE_SHIFT: u32 = 5;

/// Token budget per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TokenBudget {
    pub critical: usize,
    pub important: usize,
    pub contextual: usize,
    pub supplemental: usize,
}

impl TokenBudget {
    pub fn total(&self) -> usize {
        self.critical + self.important + self.contextual + self.supplemental
    }
}

/// Integer percentages of the base budget given to each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierWeights {
    pub critical: u32,
    pub important: u32,
    pub contextual: u32,
    pub supplemental: u32,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self {
            critical: 50,
            important: 25,
            contextual: 15,
            supplemental: 10,
        }
    }
}

impl TierWeights {
    /// Move up to `points` from the important tier to the critical tier.
    pub fn shift_to_critical(&mut self, points: u32) {
        let moved = points.min(self.important);
        self.important -= moved;
        self.critical += moved;
    }

    pub fn sum(&self) -> u32 {
        self.critical + self.important + self.contextual + self.supplemental
    }
}

/// What the allocator looks at to decide how to weight the tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ComplexitySignals {
    pub active_quests: usize,
    pub history_depth: usize,
    pub high_score_entities: usize,
}

impl ComplexitySignals {
    pub fn measure(relevance: &[EntityRelevance<'_>], state: &GameState) -> Self {
        Self {
            active_quests: state.active_quests().count(),
            history_depth: state.history.len(),
            high_score_entities: relevance.iter().filter(|r| r.score > HIGH_SCORE).count(),
        }
    }
}

/// Splits the available token budget between tiers.
#[derive(Debug, Clone)]
pub struct BudgetAllocator {
    base_limit: usize,
}

impl BudgetAllocator {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            base_limit: config.base_limit(),
        }
    }

    /// Tier weights adjusted for the scene.
    pub fn weights(&self, signals: &ComplexitySignals) -> TierWeights {
        let mut weights = TierWeights::default();
        if signals.high_score_entities > CROWDED_SCENE {
            weights.shift_to_critical(CROWDED_SHIFT);
        }
        if signals.active_quests == 0 {
            weights.shift_to_critical(IDLE_SHIFT);
        }
        weights
    }

    /// Allocate the budget left after the supplementary block.
    ///
    /// Each tier gets `floor(base * weight / 100)`, so the total never exceeds
    /// the base. A supplementary block larger than the base leaves every tier
    /// at zero.
    pub fn allocate(&self, signals: &ComplexitySignals, supplementary_tokens: usize) -> TokenBudget {
        let base = self.base_limit.saturating_sub(supplementary_tokens);
        let weights = self.weights(signals);
        let share = |weight: u32| base * weight as usize / 100;

        let budget = TokenBudget {
            critical: share(weights.critical),
            important: share(weights.important),
            contextual: share(weights.contextual),
            supplemental: share(weights.supplemental),
        };

        debug!(
            base,
            critical = budget.critical,
            important = budget.important,
            contextual = budget.contextual,
            supplemental = budget.supplemental,
            "allocated token budget"
        );
        budget
    }
}
