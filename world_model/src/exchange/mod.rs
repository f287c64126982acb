//! Entity export/import.
//!
//! [`EntityExchange`] is constructed once by the application and passed to
//! whoever needs to export or import. It owns the merge configuration and an
//! [`ExchangeLock`] so two runs never interleave over the same store.
//!
//! File handling is the caller's business; this module deals in strings.

mod lock;
mod parse;

pub use lock::*;
pub use parse::*;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MergeConfig;
use crate::entities::{Entity, EntityFields, EntityStore, MergeOutcome, MergeReport, UpsertOrigin};
use crate::error::ExchangeError;

/// Version stamped on every export document.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// One exported entity: the persisted fields plus export bookkeeping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedEntity {
    #[serde(flatten)]
    pub entity: Entity,
    pub exported_at: DateTime<Utc>,
    pub display_name: String,
}

/// The export document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub entities: Vec<ExportedEntity>,
}

/// What an import did.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// One report per decoded entry, in payload order.
    pub merges: Vec<MergeReport>,
    /// Entries that could not be decoded.
    pub rejected: usize,
    /// Store contents before the import, when backups are enabled.
    pub backup: Option<EntityStore>,
}

impl ImportReport {
    pub fn count(&self, outcome: MergeOutcome) -> usize {
        self.merges.iter().filter(|m| m.outcome == outcome).count()
    }
}

/// Export/import service.
#[derive(Debug)]
pub struct EntityExchange {
    config: MergeConfig,
    lock: ExchangeLock,
}

impl EntityExchange {
    pub fn new(config: MergeConfig) -> Self {
        let lock = ExchangeLock::new(Duration::from_secs(config.lock_timeout_secs));
        Self { config, lock }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn lock(&self) -> &ExchangeLock {
        &self.lock
    }

    /// Build an export document. Entities without a reference id get one
    /// first, so every exported entity carries a stable identity.
    pub fn export_document(&self, store: &mut EntityStore) -> Result<ExportDocument, ExchangeError> {
        let _guard = self.lock.try_acquire()?;

        let assigned = store.assign_reference_ids();
        if assigned > 0 {
            debug!(assigned, "assigned reference ids before export");
        }

        let now = Utc::now();
        let entities = store
            .iter()
            .map(|entity| ExportedEntity {
                display_name: entity.name.clone(),
                entity: entity.clone(),
                exported_at: now,
            })
            .collect();

        Ok(ExportDocument {
            version: EXPORT_FORMAT_VERSION,
            exported_at: now,
            entities,
        })
    }

    /// Export the store as pretty-printed JSON.
    pub fn export(&self, store: &mut EntityStore) -> Result<String, ExchangeError> {
        let document = self.export_document(store)?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Import entities from a payload.
    ///
    /// The payload may be an export document, a bare list of entities, or a
    /// name-keyed object of entities. Each entry goes through the merge engine
    /// as an import-originated upsert; entries that do not decode are counted
    /// and skipped.
    pub fn import(&self, store: &mut EntityStore, payload: &str) -> Result<ImportReport, ExchangeError> {
        let _guard = self.lock.try_acquire()?;

        let value = parse_payload(payload)?;
        let entries = import_entries(&value)?;

        let mut report = ImportReport {
            backup: self.config.backup_before_import.then(|| store.clone()),
            ..ImportReport::default()
        };

        for (index, (name, item)) in entries.into_iter().enumerate() {
            let pending = item.get("typePending").and_then(Value::as_bool).unwrap_or(false);
            let mut fields = match serde_json::from_value::<EntityFields>(item) {
                Ok(fields) => fields,
                Err(e) => {
                    warn!(index, error = %e, "skipping undecodable import entry");
                    report.rejected += 1;
                    continue;
                }
            };
            if pending {
                // The exported `type` is only a placeholder.
                fields.kind = None;
            }
            let Some(name) = name else {
                warn!(index, "skipping import entry without a name");
                report.rejected += 1;
                continue;
            };
            let merge = store.upsert_from(UpsertOrigin::Import, &name, fields, &self.config);
            report.merges.push(merge);
        }

        debug!(
            created = report.count(MergeOutcome::Created),
            merged = report.count(MergeOutcome::Merged),
            skipped = report.count(MergeOutcome::Skipped),
            rejected = report.rejected,
            "import finished"
        );
        Ok(report)
    }
}

/// Pull `(name, entry)` pairs out of any accepted payload shape.
fn import_entries(value: &Value) -> Result<Vec<(Option<String>, Value)>, ExchangeError> {
    let list = match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => match map.get("entities") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(named)) => return Ok(named_entries(named)),
            Some(_) => return Err(ExchangeError::MissingEntities),
            None if map.contains_key("name") => vec![value.clone()],
            None => return Ok(named_entries(map)),
        },
        _ => return Err(ExchangeError::MissingEntities),
    };

    Ok(list
        .into_iter()
        .map(|item| (entry_name(&item), item))
        .collect())
}

fn named_entries(map: &serde_json::Map<String, Value>) -> Vec<(Option<String>, Value)> {
    map.iter()
        .map(|(key, item)| (entry_name(item).or_else(|| Some(key.clone())), item.clone()))
        .collect()
}

fn entry_name(item: &Value) -> Option<String> {
    ["name", "displayName"]
        .iter()
        .find_map(|key| item.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
