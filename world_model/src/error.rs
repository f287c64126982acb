//! Error types for the world model.
//!
//! Merges never fail; these cover the explicit identity operations, payload
//! parsing, the exchange service and configuration loading.

use thiserror::Error;

/// Errors from explicit store operations (rename, retype).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("entity already exists: {0}")]
    AlreadyExists(String),

    #[error("entity name must not be empty")]
    EmptyName,
}

/// Errors from a single payload parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("input is empty")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("no fenced code block found")]
    NoFencedBlock,

    #[error("no JSON object found")]
    NoObject,

    #[error("no parser accepted the input after {attempts} attempts (last: {last})")]
    Exhausted { attempts: usize, last: Box<ParseError> },
}

/// Errors from turning a JSON snapshot into a game state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("game state root must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors from the entity exchange service.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("another export/import is in progress (held for {held_for_ms} ms)")]
    Busy { held_for_ms: u128 },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("payload does not contain an entity list")]
    MissingEntities,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
