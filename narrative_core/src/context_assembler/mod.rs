//! Context Assembler - Builds the per-turn world context for the LLM prompt.
//!
//! Assembly works as follows:
//! 1. **Classify**: Derive the action intent from the raw player text
//! 2. **Graph**: Rebuild the entity graph from the entity store
//! 3. **Score**: Rate every entity's relevance to the action
//! 4. **Allocate**: Split the token budget between the four tiers
//! 5. **Render**: Fill each tier, most relevant first, within its budget

mod budget;
mod relevance;
mod tiers;

pub use budget::*;
pub use relevance::*;
pub use tiers::*;

use serde::Serialize;
use tracing::debug;
use world_model::GameState;

use crate::config::PromptConfig;
use crate::entity_graph::EntityGraph;
use crate::intent::{classify, ActionIntent};
use crate::token::estimate_tokens;

/// The four rendered tiers, in prompt order. Empty tiers are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextSections {
    pub critical: String,
    pub important: String,
    pub contextual: String,
    pub supplemental: String,
}

impl ContextSections {
    /// Non-empty sections in prompt order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [
            self.critical.as_str(),
            self.important.as_str(),
            self.contextual.as_str(),
            self.supplemental.as_str(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
    }

    pub fn total_tokens(&self) -> usize {
        self.iter().map(estimate_tokens).sum()
    }
}

/// The assembled context ready for prompt generation.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledContext<'a> {
    pub intent: ActionIntent,
    pub relevance: Vec<EntityRelevance<'a>>,
    pub signals: ComplexitySignals,
    pub budget: TokenBudget,
    pub sections: ContextSections,
}

/// The context assembler builds the tiered world context for one turn.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    config: PromptConfig,
}

impl ContextAssembler {
    /// Create a new context assembler with the given configuration.
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// Create a context assembler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PromptConfig::default())
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    /// Assemble the context for `action`.
    ///
    /// `supplementary_tokens` is the size of any externally supplied context
    /// block; it is taken off the top before the tiers are budgeted.
    pub fn assemble<'a>(&self, action: &str, state: &'a GameState, supplementary_tokens: usize) -> AssembledContext<'a> {
        let intent = classify(action);
        let graph = EntityGraph::build(&state.entities);
        let relevance = RelevanceScorer::new(&self.config).score(action, &intent, state, &graph);

        let signals = ComplexitySignals::measure(&relevance, state);
        let budget = BudgetAllocator::new(&self.config).allocate(&signals, supplementary_tokens);

        let input = TierInput {
            state,
            relevance: &relevance,
            config: &self.config,
        };
        let sections = ContextSections {
            critical: critical_tier(&input, budget.critical),
            important: important_tier(&input, budget.important),
            contextual: contextual_tier(&input, budget.contextual),
            supplemental: supplemental_tier(&input, budget.supplemental),
        };

        debug!(
            intent = intent.kind.label(),
            entities = relevance.len(),
            graph_edges = graph.edge_count(),
            tokens = sections.total_tokens(),
            "assembled context"
        );

        AssembledContext {
            intent,
            relevance,
            signals,
            budget,
            sections,
        }
    }
}
