//! Entity definitions for the game world.
//!
//! Every entity is keyed by its display name in the [`EntityStore`]. The shared
//! base (name, description, reference id) lives on [`Entity`]; everything that
//! only makes sense for some kinds of entity lives in [`EntityDetails`].

mod character;
mod details;
mod fields;
mod merge;
mod store;

pub use character::*;
pub use details::*;
pub use fields::*;
pub use merge::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier assigned to an entity exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(pub Uuid);

impl ReferenceId {
    /// Create a new random reference ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

}

impl Default for ReferenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[serde(rename = "pc", alias = "player_character")]
    PlayerCharacter,
    #[serde(alias = "non_player_character")]
    Npc,
    Companion,
    Location,
    Faction,
    Item,
    Skill,
    StatusEffect,
    Concept,
}

impl EntityKind {
    /// Short label used when rendering entities into prompt text.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::PlayerCharacter => "PC",
            EntityKind::Npc => "NPC",
            EntityKind::Companion => "Companion",
            EntityKind::Location => "Location",
            EntityKind::Faction => "Faction",
            EntityKind::Item => "Item",
            EntityKind::Skill => "Skill",
            EntityKind::StatusEffect => "Status",
            EntityKind::Concept => "Concept",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A named entity in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Assigned once by the store, never by a merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<ReferenceId>,

    /// Created without a `type`: the details are a placeholder concept and
    /// the first proposal that names a kind sets it.
    #[serde(rename = "typePending", default, skip_serializing_if = "std::ops::Not::not")]
    pub kind_pending: bool,

    #[serde(flatten)]
    pub details: EntityDetails,
}

impl Entity {
    /// Create an entity of the given kind with no details filled in.
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            reference_id: None,
            kind_pending: false,
            details: EntityDetails::empty(kind),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.details.kind()
    }

    /// Whether the kind is still waiting for a typed proposal.
    pub fn is_kind_pending(&self) -> bool {
        self.kind_pending
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the location, if this kind of entity has one.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        if let Some(slot) = self.details.location_slot() {
            *slot = Some(location.into());
        }
        self
    }

    /// Set the owner, if this kind of entity has one.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        if let Some(slot) = self.details.owner_slot() {
            *slot = Some(owner.into());
        }
        self
    }

    /// Set the realm / power tier, if this kind of entity has one.
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        if let Some(slot) = self.details.realm_slot() {
            *slot = Some(realm.into());
        }
        self
    }

    /// Set the relationship to the player, for characters.
    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        if let Some(slot) = self.details.relationship_slot() {
            *slot = Some(relationship.into());
        }
        self
    }

    /// Set the motivation, for characters.
    pub fn with_motivation(mut self, motivation: impl Into<String>) -> Self {
        if let Some(slot) = self.details.motivation_slot() {
            *slot = Some(motivation.into());
        }
        self
    }

    /// Set the personality, for characters.
    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        if let Some(slot) = self.details.personality_slot() {
            *slot = Some(personality.into());
        }
        self
    }

    /// Set the skill list, for characters.
    pub fn with_skills<S: Into<String>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        if let Some(slot) = self.details.skills_slot() {
            *slot = skills.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn with_reference_id(mut self, id: ReferenceId) -> Self {
        self.reference_id = Some(id);
        self
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}
