//! Writing submitted relation rows back to storage.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime};
use formation::{FormationConfig, ValueTree, FORMATTED_SUFFIX};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::FormModel;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes related records and join-table rows.
pub trait RelationStore {
    /// Saves `data` over the related record `id`.
    fn update_item(&mut self, relation: &str, id: i64, data: &BTreeMap<String, ValueTree>)
        -> Result<()>;

    /// Creates a related record and returns its id.
    fn create_item(&mut self, relation: &str, data: &BTreeMap<String, ValueTree>) -> Result<i64>;

    /// Deletes the related record `id`.
    fn delete_item(&mut self, relation: &str, id: i64) -> Result<()>;

    /// Updates the join-table rows matching every `filter` column and returns
    /// how many rows changed.
    fn update_pivot(
        &mut self,
        relation: &str,
        filter: &BTreeMap<String, ValueTree>,
        data: &BTreeMap<String, ValueTree>,
    ) -> Result<u64>;

    /// Inserts a join-table row.
    fn insert_pivot(&mut self, relation: &str, data: &BTreeMap<String, ValueTree>) -> Result<()>;
}

/// What [`sync_relation`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Ids of records updated in place.
    pub updated: Vec<i64>,
    /// Ids of records created.
    pub created: Vec<i64>,
    /// Ids of records deleted because they were missing from the input.
    pub deleted: Vec<i64>,
    /// Join-table rows updated.
    pub pivots_updated: u64,
    /// Join-table rows inserted.
    pub pivots_inserted: u64,
}

impl SyncReport {
    /// Returns whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty()
            && self.created.is_empty()
            && self.deleted.is_empty()
            && self.pivots_updated == 0
            && self.pivots_inserted == 0
    }
}

fn positive_id(fields: &BTreeMap<String, ValueTree>) -> Option<i64> {
    fields
        .get("id")
        .and_then(|id| id.as_text().trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

/// Record columns of a submitted row: everything but its id and pivot.
fn row_fields(fields: &BTreeMap<String, ValueTree>) -> BTreeMap<String, ValueTree> {
    fields
        .iter()
        .filter(|(field, _)| !matches!(field.as_str(), "id" | "pivot"))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

/// Synchronises a relation of `owner` with submitted rows, stamping pivot
/// rows with the current local time when configured.
///
/// See [`sync_relation_at`].
pub fn sync_relation(
    owner: &dyn FormModel,
    relation: &str,
    input: &ValueTree,
    store: &mut dyn RelationStore,
    config: &FormationConfig,
) -> Result<SyncReport> {
    let now = config.pivot_timestamps.then(|| Local::now().naive_local());
    sync_relation_at(owner, relation, input, store, now)
}

/// Synchronises a relation of `owner` with submitted rows.
///
/// - A row whose positive `id` matches a loaded item updates that item. The
///   stored attributes, minus display-only `_formatted` copies, are
///   overlaid with the submitted fields. A `pivot` mapping in the row
///   updates the join-table row keyed by both foreign keys (and its own
///   `id` when submitted), or inserts one when no row matched.
/// - Any other row creates a record.
/// - Loaded items missing from the rows are deleted.
///
/// `timestamp` sets `updated_at` on pivot writes and `created_at` on pivot
/// inserts.
pub fn sync_relation_at(
    owner: &dyn FormModel,
    relation: &str,
    input: &ValueTree,
    store: &mut dyn RelationStore,
    timestamp: Option<NaiveDateTime>,
) -> Result<SyncReport> {
    let items = owner.related(relation);
    let mut report = SyncReport::default();
    let mut saved: Vec<i64> = Vec::new();

    for (_, row) in input.children() {
        let ValueTree::Map(fields) = row else {
            debug!(relation, "skipping relation row that is not a mapping");
            continue;
        };

        let mut found = false;
        if let Some(id) = positive_id(fields) {
            for item in items.iter().filter(|item| item.id() == Some(id)) {
                found = true;

                let mut data: BTreeMap<String, ValueTree> = item
                    .attributes()
                    .into_iter()
                    .filter(|(field, _)| !field.ends_with(FORMATTED_SUFFIX))
                    .collect();
                data.extend(row_fields(fields));
                store.update_item(relation, id, &data)?;
                report.updated.push(id);

                if let Some(ValueTree::Map(pivot)) = fields.get("pivot") {
                    save_pivot(owner, *item, relation, pivot, store, timestamp, &mut report)?;
                }

                if !saved.contains(&id) {
                    saved.push(id);
                }
            }
        }

        if !found {
            let id = store.create_item(relation, &row_fields(fields))?;
            report.created.push(id);
            if !saved.contains(&id) {
                saved.push(id);
            }
        }
    }

    for item in &items {
        match item.id() {
            Some(id) if !saved.contains(&id) => {
                store.delete_item(relation, id)?;
                report.deleted.push(id);
            }
            Some(_) => {}
            None => debug!(relation, "loaded item without id cannot be removed"),
        }
    }

    info!(
        relation,
        updated = report.updated.len(),
        created = report.created.len(),
        deleted = report.deleted.len(),
        "synchronised relation"
    );
    Ok(report)
}

fn save_pivot(
    owner: &dyn FormModel,
    item: &dyn FormModel,
    relation: &str,
    pivot: &BTreeMap<String, ValueTree>,
    store: &mut dyn RelationStore,
    timestamp: Option<NaiveDateTime>,
    report: &mut SyncReport,
) -> Result<()> {
    let (Some(owner_id), Some(item_id)) = (owner.id(), item.id()) else {
        debug!(relation, "pivot row needs both record ids, skipping");
        return Ok(());
    };

    let mut filter = BTreeMap::from([
        (owner.foreign_key(), ValueTree::from(owner_id)),
        (item.foreign_key(), ValueTree::from(item_id)),
    ]);
    let mut data = pivot.clone();
    data.extend(filter.clone());
    if let Some(id) = data.remove("id") {
        filter.insert("id".to_string(), id);
    }

    let stamp = timestamp.map(|t| ValueTree::from(t.format(TIMESTAMP_FORMAT).to_string()));
    if let Some(stamp) = &stamp {
        data.insert("updated_at".to_string(), stamp.clone());
    }

    let changed = store.update_pivot(relation, &filter, &data)?;
    if changed > 0 {
        report.pivots_updated += changed;
        return Ok(());
    }

    if let Some(stamp) = stamp {
        data.insert("created_at".to_string(), stamp);
    }
    store.insert_pivot(relation, &data)?;
    report.pivots_inserted += 1;
    Ok(())
}
