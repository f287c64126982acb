//! # Narrative Core (The Cortex)
//!
//! The "brain" of the emergent narrative system. This crate reads the
//! `world_model` game state, decides which parts of it matter for the current
//! player action, and assembles a token-budgeted prompt for the LLM
//! storyteller.
//!
//! ## Core Components
//!
//! - **intent**: Classifies the raw player action
//! - **entity_graph**: Relationships between entities, rebuilt each turn
//! - **context_assembler**: Relevance scoring, budget allocation and tier rendering
//! - **prompt**: Final prompt layout, limit enforcement and the fallback prompt
//! - **token**: Token estimation and truncation
//!
//! ## Design Philosophy
//!
//! - **Read-Only**: Assembly never mutates the game state it is given
//! - **Bounded**: Every tier has a budget; the whole prompt has a hard limit
//! - **Degrading**: Bad input yields a smaller prompt, never an error

pub mod config;
pub mod context_assembler;
pub mod entity_graph;
pub mod intent;
pub mod prompt;
pub mod token;

pub use config::*;
pub use context_assembler::*;
pub use entity_graph::*;
pub use intent::*;
pub use prompt::*;
pub use token::*;
