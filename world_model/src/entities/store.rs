//! The name-keyed entity store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::{merge_entity_from, Entity, EntityFields, EntityKind, MergeOutcome, MergeReport, ReferenceId, UpsertOrigin};
use crate::config::MergeConfig;
use crate::error::StoreError;

/// One proposed create-or-update, as produced by the directive parser.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertRequest {
    pub name: String,
    pub fields: EntityFields,
}

impl UpsertRequest {
    pub fn new(name: impl Into<String>, fields: EntityFields) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// All known entities, keyed by display name.
///
/// Iteration order is name order, so everything derived from the store is
/// deterministic for a given content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityStore {
    entities: BTreeMap<String, Entity>,
}

impl EntityStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get an entity by its exact name.
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve_name(name).is_some()
    }

    /// Look up a name exactly, then case-insensitively.
    pub fn resolve_name(&self, name: &str) -> Option<&Entity> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.entities
            .get(name)
            .or_else(|| self.entities.values().find(|e| e.is_named(name)))
    }

    /// Resolve a soft reference. Dangling or absent references yield `None`.
    pub fn resolve(&self, reference: Option<&str>) -> Option<&Entity> {
        reference.and_then(|name| self.resolve_name(name))
    }

    /// Iterate over all entities in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterate over all entities of one kind.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(move |e| e.kind() == kind)
    }

    /// Insert an entity as-is, replacing any entity with the same name.
    ///
    /// Meant for seeding a world; model-driven updates go through
    /// [`EntityStore::upsert`].
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.name.clone(), entity)
    }

    /// Merge a model-originated proposal into the store.
    pub fn upsert(&mut self, name: &str, proposed: EntityFields, config: &MergeConfig) -> MergeReport {
        self.upsert_from(UpsertOrigin::Model, name, proposed, config)
    }

    /// Merge a proposal into the store.
    ///
    /// The merged entity is computed off-store and written in a single insert,
    /// so readers never observe a half-merged entity.
    pub fn upsert_from(
        &mut self,
        origin: UpsertOrigin,
        name: &str,
        proposed: EntityFields,
        config: &MergeConfig,
    ) -> MergeReport {
        let report = merge_entity_from(origin, name, proposed, self, config);
        if report.entity.name.is_empty() {
            debug!("ignoring upsert with an empty entity name");
            return report;
        }
        if report.outcome != MergeOutcome::Skipped {
            self.entities
                .insert(report.entity.name.clone(), report.entity.clone());
        }
        debug!(entity = %report.entity.name, outcome = ?report.outcome, "entity upserted");
        report
    }

    /// Apply several upserts one after another, in the order given.
    pub fn apply_upserts(
        &mut self,
        requests: impl IntoIterator<Item = UpsertRequest>,
        config: &MergeConfig,
    ) -> Vec<MergeReport> {
        requests
            .into_iter()
            .map(|request| self.upsert(&request.name, request.fields, config))
            .collect()
    }

    /// Rename an entity. Identity (reference id and kind) is preserved.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        let new = new.trim();
        if new.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let key = self.key_of(old)?;
        if key != new && self.entities.contains_key(new) {
            return Err(StoreError::AlreadyExists(new.to_string()));
        }
        let mut entity = self
            .entities
            .remove(&key)
            .ok_or_else(|| StoreError::NotFound(old.to_string()))?;
        entity.name = new.to_string();
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Change an entity's kind, carrying over every field both kinds share.
    pub fn retype(&mut self, name: &str, kind: EntityKind) -> Result<(), StoreError> {
        let key = self.key_of(name)?;
        let entity = self
            .entities
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let details = std::mem::replace(&mut entity.details, super::EntityDetails::empty(kind));
        entity.details = details.converted(kind);
        entity.kind_pending = false;
        Ok(())
    }

    /// Give every entity without a reference id a fresh one.
    ///
    /// Returns how many ids were assigned. Existing ids are never touched.
    pub fn assign_reference_ids(&mut self) -> usize {
        let mut assigned = 0;
        for entity in self.entities.values_mut() {
            if entity.reference_id.is_none() {
                entity.reference_id = Some(ReferenceId::new());
                assigned += 1;
            }
        }
        assigned
    }

    fn key_of(&self, name: &str) -> Result<String, StoreError> {
        self.resolve_name(name)
            .map(|e| e.name.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

impl FromIterator<Entity> for EntityStore {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        let mut store = EntityStore::new();
        for entity in iter {
            store.insert(entity);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> EntityStore {
        [
            Entity::new("Lâm Phong", EntityKind::PlayerCharacter).with_location("Thanh Vân Trấn"),
            Entity::new("Thanh Vân Trấn", EntityKind::Location),
            Entity::new("Tiểu Bạch", EntityKind::Companion),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_resolve_dangling_reference() {
        let store = sample_store();
        assert!(store.resolve(Some("Thanh Vân Trấn")).is_some());
        assert!(store.resolve(Some("thanh vân trấn")).is_some());
        assert!(store.resolve(Some("Nơi Không Tồn Tại")).is_none());
        assert!(store.resolve(None).is_none());
        assert!(store.resolve(Some("  ")).is_none());
    }

    #[test]
    fn test_upsert_creates_then_merges() {
        let mut store = EntityStore::new();
        let config = MergeConfig::default();

        let first = store.upsert(
            "Hắc Long",
            EntityFields::new().with_kind(EntityKind::Npc).with_skills(["Long Tức"]),
            &config,
        );
        assert_eq!(first.outcome, MergeOutcome::Created);

        let second = store.upsert("Hắc Long", EntityFields::new().with_skills(["Long Trảo"]), &config);
        assert_eq!(second.outcome, MergeOutcome::Merged);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("Hắc Long").unwrap().details.skills().len(), 2);
    }

    #[test]
    fn test_skipped_upsert_leaves_store_untouched() {
        let mut store = sample_store();
        let before = store.clone();
        let config = MergeConfig {
            enabled: false,
            ..MergeConfig::default()
        };

        let report = store.upsert(
            "Tiểu Bạch",
            EntityFields::new().with_description("Một con cáo trắng rất dài dòng"),
            &config,
        );
        assert_eq!(report.outcome, MergeOutcome::Skipped);
        assert_eq!(store, before);
    }

    #[test]
    fn test_apply_upserts_in_order() {
        let mut store = EntityStore::new();
        let reports = store.apply_upserts(
            vec![
                UpsertRequest::new("A", EntityFields::new().with_kind(EntityKind::Npc).with_description("one")),
                UpsertRequest::new("A", EntityFields::new().with_description("one two")),
                UpsertRequest::new("B", EntityFields::new().with_kind(EntityKind::Item)),
            ],
            &MergeConfig::default(),
        );

        let outcomes: Vec<_> = reports.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            [MergeOutcome::Created, MergeOutcome::Merged, MergeOutcome::Created]
        );
        assert_eq!(store.get("A").unwrap().description, "one two");
    }

    #[test]
    fn test_rename_preserves_identity() {
        let mut store = sample_store();
        store.assign_reference_ids();
        let id = store.get("Tiểu Bạch").unwrap().reference_id;

        store.rename("tiểu bạch", "Bạch Hồ").unwrap();

        assert!(store.get("Tiểu Bạch").is_none());
        let renamed = store.get("Bạch Hồ").unwrap();
        assert_eq!(renamed.reference_id, id);
        assert_eq!(renamed.kind(), EntityKind::Companion);
    }

    #[test]
    fn test_rename_errors() {
        let mut store = sample_store();
        assert!(matches!(
            store.rename("Không Ai", "X"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.rename("Tiểu Bạch", "Lâm Phong"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(store.rename("Tiểu Bạch", " "), Err(StoreError::EmptyName)));
    }

    #[test]
    fn test_retype() {
        let mut store = sample_store();
        store.retype("Lâm Phong", EntityKind::Npc).unwrap();
        let entity = store.get("Lâm Phong").unwrap();
        assert_eq!(entity.kind(), EntityKind::Npc);
        assert_eq!(entity.details.location(), Some("Thanh Vân Trấn"));
    }

    #[test]
    fn test_assign_reference_ids_once() {
        let mut store = sample_store();
        assert_eq!(store.assign_reference_ids(), 3);
        let ids: Vec<_> = store.iter().map(|e| e.reference_id).collect();

        assert_eq!(store.assign_reference_ids(), 0);
        let again: Vec<_> = store.iter().map(|e| e.reference_id).collect();
        assert_eq!(ids, again);
    }
}
