//! Tolerant construction of a [`GameState`] from a JSON snapshot.
//!
//! Every collection entry is decoded on its own. A malformed entry is logged
//! and skipped; only a root that is not an object is an error.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use super::{Chronicle, ChronicleStats, GameState};
use crate::entities::{Entity, EntityStore};
use crate::error::StateError;
use crate::exchange::parse_payload;

impl GameState {
    /// Parse a snapshot from text, trying every payload parser in order.
    pub fn from_json_str_lenient(input: &str) -> Result<Self, StateError> {
        let value = parse_payload(input)?;
        Self::from_json_lenient(&value)
    }

    /// Build a state from a JSON value, skipping entries that do not decode.
    pub fn from_json_lenient(value: &Value) -> Result<Self, StateError> {
        let root = value
            .as_object()
            .ok_or_else(|| StateError::NotAnObject(json_kind(value)))?;

        Ok(GameState {
            world: field(root, "world"),
            time: field(root, "time"),
            turn: field(root, "turn"),
            entities: entities(root.get("entities")),
            party: party(root.get("party")),
            quests: list(root, "quests"),
            statuses: list(root, "statuses"),
            history: list(root, "history"),
            chronicle: chronicle(root.get("chronicle")),
            custom_rules: list(root, "customRules"),
            memories: list(root, "memories"),
            recent_choices: list(root, "recentChoices"),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn decode<T: DeserializeOwned>(value: &Value, field: &str, index: usize) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(field, index, error = %e, "skipping malformed entry");
            None
        }
    }
}

fn field<T: DeserializeOwned + Default>(root: &Map<String, Value>, key: &str) -> T {
    match root.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => decode(value, key, 0).unwrap_or_default(),
    }
}

fn entries<'a>(value: Option<&'a Value>, key: &str) -> &'a [Value] {
    match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(field = key, found = json_kind(other), "expected a list, ignoring field");
            &[]
        }
    }
}

fn list<T: DeserializeOwned>(root: &Map<String, Value>, key: &str) -> Vec<T> {
    entries(root.get(key), key)
        .iter()
        .enumerate()
        .filter_map(|(i, item)| decode(item, key, i))
        .collect()
}

/// Entities may arrive as a name-keyed object or as a list.
fn entities(value: Option<&Value>) -> EntityStore {
    let mut store = EntityStore::new();
    match value {
        Some(Value::Object(map)) => {
            for (i, (name, item)) in map.iter().enumerate() {
                let mut item = item.clone();
                if let Value::Object(fields) = &mut item {
                    fields
                        .entry("name")
                        .or_insert_with(|| Value::String(name.clone()));
                }
                if let Some(entity) = decode::<Entity>(&item, "entities", i) {
                    insert_named(&mut store, entity, i);
                }
            }
        }
        other => {
            for (i, item) in entries(other, "entities").iter().enumerate() {
                if let Some(entity) = decode::<Entity>(item, "entities", i) {
                    insert_named(&mut store, entity, i);
                }
            }
        }
    }
    store
}

fn insert_named(store: &mut EntityStore, mut entity: Entity, index: usize) {
    let name = entity.name.trim().to_string();
    if name.is_empty() {
        warn!(field = "entities", index, "skipping entity without a name");
        return;
    }
    entity.name = name;
    store.insert(entity);
}

/// Party entries may be plain names or objects with a `name`.
fn party(value: Option<&Value>) -> Vec<String> {
    entries(value, "party")
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            Value::String(name) => Some(name.clone()),
            Value::Object(fields) => fields
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => {
                warn!(field = "party", index = i, "skipping malformed entry");
                None
            }
        })
        .collect()
}

fn chronicle(value: Option<&Value>) -> Chronicle {
    let Some(Value::Object(root)) = value else {
        return Chronicle::default();
    };
    Chronicle {
        memoir: list(root, "memoir"),
        chapter: list(root, "chapter"),
        turn: list(root, "turn"),
        stats: field::<ChronicleStats>(root, "stats"),
    }
}
