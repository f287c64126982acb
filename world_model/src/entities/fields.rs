//! Proposed entity data, as it arrives from model directives or an import.

use serde::{Deserialize, Serialize};

use super::{Entity, EntityKind};

/// A skill list that may arrive either as a list or as a comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillList {
    List(Vec<String>),
    Text(String),
}

impl SkillList {
    /// Flatten into trimmed, non-empty skill names, splitting on commas.
    pub fn into_vec(self) -> Vec<String> {
        let raw = match self {
            SkillList::List(items) => items,
            SkillList::Text(text) => vec![text],
        };
        raw.iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl From<Vec<String>> for SkillList {
    fn from(skills: Vec<String>) -> Self {
        SkillList::List(skills)
    }
}

/// A proposed set of entity fields. Every field is optional.
///
/// The last four fields are export/import bookkeeping and never reach the
/// live store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityFields {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Generated alternate-language name.
    #[serde(
        alias = "englishName",
        alias = "translatedName",
        skip_serializing_if = "Option::is_none"
    )]
    pub alt_name: Option<String>,
}

impl EntityFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_skills<S: Into<String>>(mut self, skills: impl IntoIterator<Item = S>) -> Self {
        self.skills = Some(SkillList::List(skills.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn with_motivation(mut self, motivation: impl Into<String>) -> Self {
        self.motivation = Some(motivation.into());
        self
    }

    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.personality = Some(personality.into());
        self
    }

    pub fn with_reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Whether any export/import bookkeeping field is present.
    pub fn has_transient(&self) -> bool {
        self.reference_id.is_some()
            || self.exported_at.is_some()
            || self.display_name.is_some()
            || self.alt_name.is_some()
    }

    /// Drop export/import bookkeeping fields.
    pub fn strip_transient(&mut self) {
        self.reference_id = None;
        self.exported_at = None;
        self.display_name = None;
        self.alt_name = None;
    }

    /// Build a fresh entity from these fields. Transient fields are ignored.
    ///
    /// Without a kind the entity starts as a [`EntityKind::Concept`] marked
    /// pending, so a later typed proposal can still set it.
    pub fn into_entity(self, name: impl Into<String>) -> Entity {
        let mut entity = Entity::new(name, self.kind.unwrap_or(EntityKind::Concept));
        entity.kind_pending = self.kind.is_none();
        entity.description = non_empty(self.description).unwrap_or_default();

        let details = &mut entity.details;
        fill(details.owner_slot(), self.owner);
        fill(details.location_slot(), self.location);
        fill(details.relationship_slot(), self.relationship);
        fill(details.realm_slot(), self.realm);
        fill(details.motivation_slot(), self.motivation);
        fill(details.personality_slot(), self.personality);
        if let (Some(slot), Some(skills)) = (details.skills_slot(), self.skills) {
            *slot = dedup(skills.into_vec());
        }
        entity
    }
}

/// Treat blank strings as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn fill(slot: Option<&mut Option<String>>, value: Option<String>) {
    if let (Some(slot), Some(value)) = (slot, non_empty(value)) {
        *slot = Some(value);
    }
}

/// Drop blank and repeated skills (case-insensitive), keeping the first spelling.
pub(crate) fn dedup(skills: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(skills.len());
    let mut out: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let key = skill.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(skill.trim().to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_list_from_text() {
        let skills = SkillList::Text("Kiếm Pháp, Khinh Công ,,Độn Thổ".into());
        assert_eq!(skills.into_vec(), ["Kiếm Pháp", "Khinh Công", "Độn Thổ"]);
    }

    #[test]
    fn test_skill_list_deserializes_both_shapes() {
        let fields: EntityFields = serde_json::from_str(r#"{"skills": "A, B"}"#).unwrap();
        assert_eq!(fields.skills.unwrap().into_vec(), ["A", "B"]);

        let fields: EntityFields = serde_json::from_str(r#"{"skills": ["A", "B, C"]}"#).unwrap();
        assert_eq!(fields.skills.unwrap().into_vec(), ["A", "B", "C"]);
    }

    #[test]
    fn test_strip_transient() {
        let mut fields: EntityFields = serde_json::from_str(
            r#"{"type": "npc", "referenceId": "abc", "exportedAt": "2024-01-01", "displayName": "Hồ Ly", "englishName": "Fox Spirit"}"#,
        )
        .unwrap();
        assert!(fields.has_transient());

        fields.strip_transient();
        assert!(!fields.has_transient());
        assert_eq!(fields.kind, Some(EntityKind::Npc));
    }

    #[test]
    fn test_into_entity_ignores_unsupported_fields() {
        let entity = EntityFields::new()
            .with_kind(EntityKind::Location)
            .with_description("  Một thung lũng  ")
            .with_skills(["Không có"])
            .with_location("Bắc Cương")
            .into_entity("Vạn Hoa Cốc");

        assert_eq!(entity.kind(), EntityKind::Location);
        assert_eq!(entity.description, "Một thung lũng");
        assert_eq!(entity.details.location(), Some("Bắc Cương"));
        assert!(entity.details.skills().is_empty());
    }

    #[test]
    fn test_into_entity_defaults_to_concept() {
        let entity = EntityFields::new().into_entity("Thiên Đạo");
        assert_eq!(entity.kind(), EntityKind::Concept);
        assert!(entity.is_kind_pending());
        assert!(entity.reference_id.is_none());

        let typed = EntityFields::new().with_kind(EntityKind::Concept).into_entity("Thiên Đạo");
        assert!(!typed.is_kind_pending());
    }

    #[test]
    fn test_dedup_ignores_case_and_blanks() {
        let skills = vec!["Mị Thuật".to_string(), " ".to_string(), "mị thuật".to_string(), "Hồ Hỏa ".to_string()];
        assert_eq!(dedup(skills), ["Mị Thuật", "Hồ Hỏa"]);
    }
}
