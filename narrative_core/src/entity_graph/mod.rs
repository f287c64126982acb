//! Entity Graph - relationships between the named entities of the world.
//!
//! The graph is rebuilt from the entity store each turn:
//! - **Ownership**: an item, skill or status and the entity that holds it
//! - **Co-location**: entities at the same place, and each with that place
//! - **Skill**: a character and the skill entities in its skill list
//! - **Mention**: an entity whose description names another entity

mod graph;

pub use graph::*;
