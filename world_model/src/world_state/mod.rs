//! World state management - the aggregate root holding everything a turn reads.

mod lenient;
mod records;

pub use records::*;

use serde::{Deserialize, Serialize};

use crate::entities::{Entity, EntityKind, EntityStore};

/// World time tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorldTime {
    pub day: u32,
    pub hour: u8,
    pub minute: u8,
    pub season: Season,
}

impl WorldTime {
    /// Create a new world time.
    pub fn new(day: u32, hour: u8, minute: u8, season: Season) -> Self {
        Self {
            day,
            hour,
            minute,
            season,
        }
    }

    /// Check if it's currently night.
    pub fn is_night(&self) -> bool {
        self.hour < 6 || self.hour >= 20
    }
}

impl std::fmt::Display for WorldTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Day {}, {:02}:{:02} ({:?}, {})",
            self.day,
            self.hour,
            self.minute,
            self.season,
            if self.is_night() { "night" } else { "day" }
        )
    }
}

/// Seasons of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Autumn,
    Winter,
}

/// Name and premise of the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldInfo {
    pub name: String,
    pub description: String,
}

/// The complete state of a play session at one point in time.
///
/// Context assembly only reads this. The entity store is written exclusively
/// through [`EntityStore::upsert`] and the explicit rename/retype operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    pub world: WorldInfo,
    pub time: WorldTime,
    pub turn: u32,

    /// All named entities (including the player character).
    pub entities: EntityStore,

    /// Names of party members, usually led by the player character.
    pub party: Vec<String>,

    pub quests: Vec<Quest>,
    pub statuses: Vec<ActiveStatus>,
    pub history: Vec<HistoryEntry>,
    pub chronicle: Chronicle,
    pub custom_rules: Vec<CustomRule>,
    pub memories: Vec<Memory>,

    /// Choices offered in recent turns, oldest first.
    pub recent_choices: Vec<String>,
}

impl GameState {
    /// Create a new empty game state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The player character: the first party member that is one, otherwise
    /// the first one in the store.
    pub fn player_character(&self) -> Option<&Entity> {
        self.party_members()
            .find(|e| e.kind() == EntityKind::PlayerCharacter)
            .or_else(|| self.entities.of_kind(EntityKind::PlayerCharacter).next())
    }

    /// Party members that resolve to an entity, in party order.
    pub fn party_members(&self) -> impl Iterator<Item = &Entity> {
        self.party
            .iter()
            .filter_map(|name| self.entities.resolve_name(name))
    }

    /// Check if a name belongs to the party (case-insensitive).
    pub fn is_party_member(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.party.iter().any(|p| p.trim().to_lowercase() == name)
    }

    pub fn active_quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.iter().filter(|q| q.is_active())
    }

    /// Active statuses on the named entity.
    pub fn statuses_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a ActiveStatus> + 'a {
        let owner = owner.trim().to_lowercase();
        self.statuses
            .iter()
            .filter(move |s| s.is_active() && s.owner.trim().to_lowercase() == owner)
    }

    /// The last `count` history entries, oldest first.
    pub fn recent_history(&self, count: usize) -> &[HistoryEntry] {
        &self.history[self.history.len().saturating_sub(count)..]
    }

    /// The most recent history entry with the given role.
    pub fn last_entry(&self, role: Role) -> Option<&HistoryEntry> {
        self.history.iter().rev().find(|e| e.role == role)
    }

    /// The first pinned memory, if any.
    pub fn pinned_memory(&self) -> Option<&Memory> {
        self.memories.iter().find(|m| m.pinned)
    }

    pub fn active_rules(&self) -> impl Iterator<Item = &CustomRule> {
        self.custom_rules.iter().filter(|r| r.active)
    }
}
