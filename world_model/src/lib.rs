//! # World Model
//!
//! The "World Bible" crate - the single source of truth for a play session.
//! It holds the named-entity store and the game state aggregate, and owns the
//! only write path into the store: the entity merge/dedup engine. It contains
//! no prompt or model logic.

pub mod config;
pub mod entities;
pub mod error;
pub mod exchange;
pub mod world_state;

pub use config::*;
pub use entities::*;
pub use error::*;
pub use exchange::*;
pub use world_state::*;
