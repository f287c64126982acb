//! Kind-specific detail groups for entities.

use serde::{Deserialize, Serialize};

use super::{CharacterDetails, EntityKind};

/// Details of a location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationDetails {
    /// Enclosing region, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Details of a faction or organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FactionDetails {
    /// Seat of the faction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
}

/// Details of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Details of a learnable skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
}

/// Details of a status effect entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusEffectDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Abstract concepts carry nothing beyond the shared base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptDetails {}

/// Kind-specific data, tagged by `type` in the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityDetails {
    #[serde(rename = "pc", alias = "player_character")]
    PlayerCharacter(CharacterDetails),
    #[serde(alias = "non_player_character")]
    Npc(CharacterDetails),
    Companion(CharacterDetails),
    Location(LocationDetails),
    Faction(FactionDetails),
    Item(ItemDetails),
    Skill(SkillDetails),
    StatusEffect(StatusEffectDetails),
    Concept(ConceptDetails),
}

impl EntityDetails {
    /// Empty details for the given kind.
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::PlayerCharacter => Self::PlayerCharacter(CharacterDetails::default()),
            EntityKind::Npc => Self::Npc(CharacterDetails::default()),
            EntityKind::Companion => Self::Companion(CharacterDetails::default()),
            EntityKind::Location => Self::Location(LocationDetails::default()),
            EntityKind::Faction => Self::Faction(FactionDetails::default()),
            EntityKind::Item => Self::Item(ItemDetails::default()),
            EntityKind::Skill => Self::Skill(SkillDetails::default()),
            EntityKind::StatusEffect => Self::StatusEffect(StatusEffectDetails::default()),
            EntityKind::Concept => Self::Concept(ConceptDetails::default()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::PlayerCharacter(_) => EntityKind::PlayerCharacter,
            Self::Npc(_) => EntityKind::Npc,
            Self::Companion(_) => EntityKind::Companion,
            Self::Location(_) => EntityKind::Location,
            Self::Faction(_) => EntityKind::Faction,
            Self::Item(_) => EntityKind::Item,
            Self::Skill(_) => EntityKind::Skill,
            Self::StatusEffect(_) => EntityKind::StatusEffect,
            Self::Concept(_) => EntityKind::Concept,
        }
    }

    /// Character details, for player characters, NPCs and companions.
    pub fn character(&self) -> Option<&CharacterDetails> {
        match self {
            Self::PlayerCharacter(c) | Self::Npc(c) | Self::Companion(c) => Some(c),
            _ => None,
        }
    }

    fn character_mut(&mut self) -> Option<&mut CharacterDetails> {
        match self {
            Self::PlayerCharacter(c) | Self::Npc(c) | Self::Companion(c) => Some(c),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::PlayerCharacter(c) | Self::Npc(c) | Self::Companion(c) => c.location.as_deref(),
            Self::Location(d) => d.location.as_deref(),
            Self::Faction(d) => d.location.as_deref(),
            Self::Item(d) => d.location.as_deref(),
            _ => None,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Item(d) => d.owner.as_deref(),
            Self::Skill(d) => d.owner.as_deref(),
            Self::StatusEffect(d) => d.owner.as_deref(),
            _ => None,
        }
    }

    pub fn realm(&self) -> Option<&str> {
        match self {
            Self::PlayerCharacter(c) | Self::Npc(c) | Self::Companion(c) => c.realm.as_deref(),
            Self::Faction(d) => d.realm.as_deref(),
            Self::Skill(d) => d.realm.as_deref(),
            _ => None,
        }
    }

    pub fn skills(&self) -> &[String] {
        self.character().map(|c| c.skills.as_slice()).unwrap_or(&[])
    }

    pub fn relationship(&self) -> Option<&str> {
        self.character().and_then(|c| c.relationship.as_deref())
    }

    pub fn motivation(&self) -> Option<&str> {
        self.character().and_then(|c| c.motivation.as_deref())
    }

    pub fn personality(&self) -> Option<&str> {
        self.character().and_then(|c| c.personality.as_deref())
    }

    /// Writable `location` field, if this kind has one.
    pub fn location_slot(&mut self) -> Option<&mut Option<String>> {
        match self {
            Self::PlayerCharacter(c) | Self::Npc(c) | Self::Companion(c) => Some(&mut c.location),
            Self::Location(d) => Some(&mut d.location),
            Self::Faction(d) => Some(&mut d.location),
            Self::Item(d) => Some(&mut d.location),
            _ => None,
        }
    }

    /// Writable `owner` field, if this kind has one.
    pub fn owner_slot(&mut self) -> Option<&mut Option<String>> {
        match self {
            Self::Item(d) => Some(&mut d.owner),
            Self::Skill(d) => Some(&mut d.owner),
            Self::StatusEffect(d) => Some(&mut d.owner),
            _ => None,
        }
    }

    /// Writable `realm` field, if this kind has one.
    pub fn realm_slot(&mut self) -> Option<&mut Option<String>> {
        match self {
            Self::PlayerCharacter(c) | Self::Npc(c) | Self::Companion(c) => Some(&mut c.realm),
            Self::Faction(d) => Some(&mut d.realm),
            Self::Skill(d) => Some(&mut d.realm),
            _ => None,
        }
    }

    pub fn skills_slot(&mut self) -> Option<&mut Vec<String>> {
        self.character_mut().map(|c| &mut c.skills)
    }

    pub fn relationship_slot(&mut self) -> Option<&mut Option<String>> {
        self.character_mut().map(|c| &mut c.relationship)
    }

    pub fn motivation_slot(&mut self) -> Option<&mut Option<String>> {
        self.character_mut().map(|c| &mut c.motivation)
    }

    pub fn personality_slot(&mut self) -> Option<&mut Option<String>> {
        self.character_mut().map(|c| &mut c.personality)
    }

    /// Rebuild these details as another kind, carrying over every field both
    /// kinds share.
    pub fn converted(mut self, kind: EntityKind) -> Self {
        let mut target = Self::empty(kind);
        if let (Some(to), Some(from)) = (target.character_mut(), self.character_mut()) {
            *to = std::mem::take(from);
            return target;
        }
        if let (Some(to), Some(from)) = (target.location_slot(), self.location_slot()) {
            *to = from.take();
        }
        if let (Some(to), Some(from)) = (target.owner_slot(), self.owner_slot()) {
            *to = from.take();
        }
        if let (Some(to), Some(from)) = (target.realm_slot(), self.realm_slot()) {
            *to = from.take();
        }
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_details_match_kind() {
        for kind in [
            EntityKind::PlayerCharacter,
            EntityKind::Npc,
            EntityKind::Companion,
            EntityKind::Location,
            EntityKind::Faction,
            EntityKind::Item,
            EntityKind::Skill,
            EntityKind::StatusEffect,
            EntityKind::Concept,
        ] {
            assert_eq!(EntityDetails::empty(kind).kind(), kind);
        }
    }

    #[test]
    fn test_slots_follow_kind() {
        let mut item = EntityDetails::empty(EntityKind::Item);
        assert!(item.owner_slot().is_some());
        assert!(item.skills_slot().is_none());

        let mut concept = EntityDetails::empty(EntityKind::Concept);
        assert!(concept.location_slot().is_none());
        assert!(concept.realm_slot().is_none());
    }

    #[test]
    fn test_converted_keeps_shared_fields() {
        let npc = EntityDetails::Npc(CharacterDetails {
            location: Some("Hắc Phong Sơn".into()),
            skills: vec!["Độc Chưởng".into()],
            relationship: Some("Thù địch".into()),
            ..Default::default()
        });

        let companion = npc.clone().converted(EntityKind::Companion);
        assert_eq!(companion.kind(), EntityKind::Companion);
        assert_eq!(companion.location(), Some("Hắc Phong Sơn"));
        assert_eq!(companion.skills(), ["Độc Chưởng"]);

        let item = npc.converted(EntityKind::Item);
        assert_eq!(item.location(), Some("Hắc Phong Sơn"));
        assert!(item.skills().is_empty());
    }

    #[test]
    fn test_concept_roundtrip() {
        let details = EntityDetails::empty(EntityKind::Concept);
        let json = serde_json::to_string(&details).unwrap();
        assert_eq!(json, r#"{"type":"concept"}"#);
    }
}
