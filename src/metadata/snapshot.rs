use super::table::TableRecord;
use super::versioned::{Deletable, Join};
use crate::core::{DatabaseId, NameString, ServerId, TableId};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Copy-on-write view of every table record in the cluster, tombstones included.
///
/// Cloning is cheap; modifications only touch the local copy until the
/// snapshot is joined back into a [`super::MetadataStore`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TablesSnapshot {
    tables: OrdMap<TableId, Deletable<TableRecord>>,
}

impl TablesSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live record for `table_id`, if any.
    pub fn live(&self, table_id: &TableId) -> Option<&TableRecord> {
        self.tables.get(table_id).and_then(Deletable::get_ref)
    }

    /// Whether any record, live or tombstoned, occupies `table_id`.
    pub fn contains(&self, table_id: &TableId) -> bool {
        self.tables.contains_key(table_id)
    }

    pub fn is_tombstoned(&self, table_id: &TableId) -> bool {
        self.tables
            .get(table_id)
            .is_some_and(Deletable::is_deleted)
    }

    pub fn get_mut(&mut self, table_id: &TableId) -> Option<&mut Deletable<TableRecord>> {
        self.tables.get_mut(table_id)
    }

    pub fn insert(&mut self, table_id: TableId, record: Deletable<TableRecord>) {
        self.tables.insert(table_id, record);
    }

    /// Live records in id order.
    pub fn iter_live(&self) -> impl Iterator<Item = (&TableId, &TableRecord)> {
        self.tables
            .iter()
            .filter_map(|(id, record)| record.get_ref().map(|record| (id, record)))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Live tables in `database` called `name`.
    pub fn find_live_by_name(&self, database: &DatabaseId, name: &NameString) -> Vec<TableId> {
        self.iter_live()
            .filter(|(_, record)| {
                record.database.get_ref() == database && record.name.get_ref() == name
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of replica assignments per server across live tables, skipping `exclude`.
    pub fn server_usage(&self, exclude: Option<&TableId>) -> BTreeMap<ServerId, usize> {
        let mut usage = BTreeMap::new();
        for (id, record) in self.iter_live() {
            if Some(id) == exclude {
                continue;
            }
            record
                .replication_info
                .get_ref()
                .config
                .tally_server_usage(&mut usage);
        }
        usage
    }
}

impl Join for TablesSnapshot {
    fn join(&mut self, other: &Self) {
        for (table_id, theirs) in other.tables.iter() {
            match self.tables.get_mut(table_id) {
                Some(ours) => ours.join(theirs),
                None => {
                    self.tables.insert(*table_id, theirs.clone());
                }
            }
        }
    }
}
