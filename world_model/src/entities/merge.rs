//! Entity merge/dedup engine.
//!
//! Reconciles a proposed set of fields against whatever the store already
//! knows under the same name. Field policy:
//!
//! | Field | Rule |
//! |-------|------|
//! | `name`, `referenceId` | never overwritten |
//! | `type` | set once, by the first proposal that names it |
//! | `skills` | set union, de-duplicated |
//! | `description` | strictly longer side wins |
//! | `relationship`, `location` | incoming overwrites |
//! | everything else | filled only when empty |
//!
//! A merge never fails. Conflicts are reported through [`MergeReport`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fields::{dedup, non_empty};
use super::{Entity, EntityDetails, EntityFields, EntityStore};
use crate::config::MergeConfig;

/// What happened to a proposed upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// No prior entity; the proposal became a new entity.
    Created,
    /// A prior entity existed and the merge policy was applied.
    Merged,
    /// A prior entity existed and merging is disabled.
    Skipped,
}

/// Where an upsert came from. Imports are governed by their own switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpsertOrigin {
    #[default]
    Model,
    Import,
}

/// Result of resolving one upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    /// The entity to write back (or the untouched prior entity when skipped).
    pub entity: Entity,
    pub outcome: MergeOutcome,
    pub conflict_reason: Option<String>,
}

/// Resolve a model-originated upsert against the store.
pub fn merge_entity(
    name: &str,
    proposed: EntityFields,
    store: &EntityStore,
    config: &MergeConfig,
) -> MergeReport {
    merge_entity_from(UpsertOrigin::Model, name, proposed, store, config)
}

/// Resolve an upsert of the given origin against the store.
///
/// The existing entity is looked up by exact name first, then
/// case-insensitively, so "rồng lửa" merges into "Rồng Lửa".
pub fn merge_entity_from(
    origin: UpsertOrigin,
    name: &str,
    mut proposed: EntityFields,
    store: &EntityStore,
    config: &MergeConfig,
) -> MergeReport {
    proposed.strip_transient();

    let Some(existing) = store.resolve_name(name) else {
        return MergeReport {
            entity: proposed.into_entity(name.trim()),
            outcome: MergeOutcome::Created,
            conflict_reason: None,
        };
    };

    if !config.allows_merge(origin) {
        debug!(entity = %existing.name, ?origin, "merge disabled, keeping existing entity");
        return MergeReport {
            entity: existing.clone(),
            outcome: MergeOutcome::Skipped,
            conflict_reason: Some(format!(
                "'{}' already exists and merging is disabled",
                existing.name
            )),
        };
    }

    let (entity, conflict_reason) = merge_fields(existing, proposed);
    MergeReport {
        entity,
        outcome: MergeOutcome::Merged,
        conflict_reason,
    }
}

/// Apply the field policy to a copy of `existing`.
///
/// Returns the merged entity and, when the proposal tried to change an
/// already set kind, a reason describing the ignored change.
pub fn merge_fields(existing: &Entity, proposed: EntityFields) -> (Entity, Option<String>) {
    let mut merged = existing.clone();
    let mut conflict = None;

    match proposed.kind {
        Some(kind) if existing.is_kind_pending() => {
            debug!(entity = %existing.name, %kind, "pending type set");
            let details = std::mem::replace(&mut merged.details, EntityDetails::empty(kind));
            merged.details = details.converted(kind);
            merged.kind_pending = false;
        }
        Some(kind) if kind != existing.kind() => {
            conflict = Some(format!(
                "type change {} -> {} ignored; use an explicit retype",
                existing.kind(),
                kind
            ));
        }
        _ => {}
    }

    if let Some(description) = non_empty(proposed.description) {
        if description.chars().count() > merged.description.chars().count() {
            merged.description = description;
        }
    }

    let details = &mut merged.details;

    if let Some(skills) = proposed.skills {
        match details.skills_slot() {
            Some(slot) => {
                let mut union = std::mem::take(slot);
                union.extend(skills.into_vec());
                *slot = dedup(union);
            }
            None => debug!(entity = %existing.name, "proposed skills ignored for this kind"),
        }
    }

    overwrite(details.location_slot(), proposed.location);
    overwrite(details.relationship_slot(), proposed.relationship);

    fill_if_empty(details.owner_slot(), proposed.owner);
    fill_if_empty(details.realm_slot(), proposed.realm);
    fill_if_empty(details.motivation_slot(), proposed.motivation);
    fill_if_empty(details.personality_slot(), proposed.personality);

    (merged, conflict)
}

fn overwrite(slot: Option<&mut Option<String>>, value: Option<String>) {
    if let (Some(slot), Some(value)) = (slot, non_empty(value)) {
        *slot = Some(value);
    }
}

fn fill_if_empty(slot: Option<&mut Option<String>>, value: Option<String>) {
    if let (Some(slot), Some(value)) = (slot, non_empty(value)) {
        let empty = slot.as_deref().map_or(true, |s| s.trim().is_empty());
        if empty {
            *slot = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityKind, ReferenceId};
    use std::collections::HashSet;

    fn store_with(entity: Entity) -> EntityStore {
        let mut store = EntityStore::new();
        store.insert(entity);
        store
    }

    #[test]
    fn test_identity_fields_survive_merge() {
        let id = ReferenceId::new();
        let existing = Entity::new("Tiểu Bạch", EntityKind::Companion).with_reference_id(id);
        let store = store_with(existing);

        let proposed = EntityFields::new()
            .with_kind(EntityKind::Item)
            .with_reference_id("00000000-0000-0000-0000-000000000000");

        let report = merge_entity("Tiểu Bạch", proposed, &store, &MergeConfig::default());

        assert_eq!(report.outcome, MergeOutcome::Merged);
        assert_eq!(report.entity.reference_id, Some(id));
        assert_eq!(report.entity.kind(), EntityKind::Companion);
        assert!(report.conflict_reason.is_some());
    }

    #[test]
    fn test_skill_union() {
        let store = store_with(Entity::new("A", EntityKind::Npc).with_skills(["X", "Y"]));
        let proposed = EntityFields::new().with_skills(["Y", "Z"]);

        let report = merge_entity("A", proposed, &store, &MergeConfig::default());
        let skills = report.entity.details.skills();

        let set: HashSet<&str> = skills.iter().map(String::as_str).collect();
        assert_eq!(set, HashSet::from(["X", "Y", "Z"]));
        assert_eq!(skills.len(), 3);
    }

    #[test]
    fn test_longer_description_wins() {
        let store = store_with(Entity::new("A", EntityKind::Npc).with_description("short"));

        let report = merge_entity(
            "A",
            EntityFields::new().with_description("a longer one"),
            &store,
            &MergeConfig::default(),
        );
        assert_eq!(report.entity.description, "a longer one");

        let store = store_with(report.entity);
        let report = merge_entity(
            "A",
            EntityFields::new().with_description("tiny"),
            &store,
            &MergeConfig::default(),
        );
        assert_eq!(report.entity.description, "a longer one");
    }

    #[test]
    fn test_current_state_fields_overwrite() {
        let store = store_with(
            Entity::new("Mộc Lan", EntityKind::Companion)
                .with_location("Kinh Thành")
                .with_relationship("Bạn đồng hành")
                .with_realm("Trúc Cơ"),
        );

        let proposed = EntityFields::new()
            .with_location("Vạn Kiếm Tông")
            .with_relationship("Người yêu")
            .with_realm("Kim Đan");

        let report = merge_entity("Mộc Lan", proposed, &store, &MergeConfig::default());
        let details = &report.entity.details;

        assert_eq!(details.location(), Some("Vạn Kiếm Tông"));
        assert_eq!(details.relationship(), Some("Người yêu"));
        // realm is fill-if-empty
        assert_eq!(details.realm(), Some("Trúc Cơ"));
    }

    #[test]
    fn test_empty_fields_are_filled() {
        let store = store_with(Entity::new("Lão Quỷ", EntityKind::Npc));
        let proposed = EntityFields::new()
            .with_realm("Nguyên Anh")
            .with_personality("Gian xảo")
            .with_motivation("   ");

        let report = merge_entity("Lão Quỷ", proposed, &store, &MergeConfig::default());
        let details = &report.entity.details;

        assert_eq!(details.realm(), Some("Nguyên Anh"));
        assert_eq!(details.personality(), Some("Gian xảo"));
        assert_eq!(details.motivation(), None);
    }

    #[test]
    fn test_created_strips_transient_fields() {
        let proposed = EntityFields::new()
            .with_kind(EntityKind::Npc)
            .with_description("Hồ ly chín đuôi")
            .with_reference_id("3f1c8f0e-0000-4000-8000-000000000000");

        let report = merge_entity("Hồ Ly", proposed, &EntityStore::new(), &MergeConfig::default());

        assert_eq!(report.outcome, MergeOutcome::Created);
        assert!(report.entity.reference_id.is_none());
        assert_eq!(report.entity.name, "Hồ Ly");
        assert_eq!(report.entity.description, "Hồ ly chín đuôi");
    }

    #[test]
    fn test_skipped_when_disabled() {
        let store = store_with(Entity::new("A", EntityKind::Npc).with_description("old"));
        let config = MergeConfig {
            enabled: false,
            ..MergeConfig::default()
        };

        let report = merge_entity(
            "A",
            EntityFields::new().with_description("much newer text"),
            &store,
            &config,
        );

        assert_eq!(report.outcome, MergeOutcome::Skipped);
        assert_eq!(report.entity.description, "old");
        assert!(report.conflict_reason.is_some());
    }

    #[test]
    fn test_import_respects_auto_merge_switch() {
        let store = store_with(Entity::new("A", EntityKind::Npc));
        let config = MergeConfig {
            auto_merge_on_import: false,
            ..MergeConfig::default()
        };

        let import = merge_entity_from(UpsertOrigin::Import, "A", EntityFields::new(), &store, &config);
        assert_eq!(import.outcome, MergeOutcome::Skipped);

        let model = merge_entity_from(UpsertOrigin::Model, "A", EntityFields::new(), &store, &config);
        assert_eq!(model.outcome, MergeOutcome::Merged);
    }

    #[test]
    fn test_untyped_entity_takes_first_proposed_type() {
        let config = MergeConfig::default();
        let mut store = EntityStore::new();
        store.upsert("Hồ Ly", EntityFields::new().with_description("Cáo"), &config);

        let report = merge_entity(
            "Hồ Ly",
            EntityFields::new()
                .with_kind(EntityKind::Npc)
                .with_location("Thanh Khâu")
                .with_skills(["Mị Thuật"])
                .with_relationship("Nghi ngờ")
                .with_realm("Kim Đan"),
            &store,
            &config,
        );
        let fox = &report.entity;

        assert!(report.conflict_reason.is_none());
        assert_eq!(fox.kind(), EntityKind::Npc);
        assert!(!fox.is_kind_pending());
        assert_eq!(fox.description, "Cáo");
        assert_eq!(fox.details.location(), Some("Thanh Khâu"));
        assert_eq!(fox.details.skills(), ["Mị Thuật"]);
        assert_eq!(fox.details.relationship(), Some("Nghi ngờ"));
        assert_eq!(fox.details.realm(), Some("Kim Đan"));

        store.insert(report.entity);
        let report = merge_entity(
            "Hồ Ly",
            EntityFields::new().with_kind(EntityKind::Item),
            &store,
            &config,
        );
        assert_eq!(report.entity.kind(), EntityKind::Npc);
        assert!(report.conflict_reason.is_some());
    }

    #[test]
    fn test_untyped_proposal_keeps_entity_pending() {
        let mut store = EntityStore::new();
        store.upsert("Thiên Đạo", EntityFields::new(), &MergeConfig::default());

        let report = merge_entity(
            "Thiên Đạo",
            EntityFields::new().with_description("Quy luật của trời đất"),
            &store,
            &MergeConfig::default(),
        );
        assert!(report.entity.is_kind_pending());
        assert!(report.conflict_reason.is_none());
    }

    #[test]
    fn test_case_insensitive_match_keeps_existing_name() {
        let store = store_with(Entity::new("Rồng Lửa", EntityKind::Npc));
        let report = merge_entity(
            "rồng lửa",
            EntityFields::new().with_description("Con rồng phun lửa"),
            &store,
            &MergeConfig::default(),
        );

        assert_eq!(report.outcome, MergeOutcome::Merged);
        assert_eq!(report.entity.name, "Rồng Lửa");
    }
}
