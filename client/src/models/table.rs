//! Identity-keyed collection of rows.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::wire;

use super::indexer::{Indexer, MenuScoped};
use super::record::{Record, RecordKind};
use super::row::Row;

/// Rows of one menu keyed by identity, in insertion order.
///
/// Rows without identity are keyed by a random surrogate that never
/// reaches the wire.
#[derive(Debug, Clone)]
pub struct Table {
    indexer: Arc<Indexer>,
    rows: IndexMap<String, Row>,
}

impl Table {
    pub fn new(indexer: Arc<Indexer>) -> Self {
        Self {
            indexer,
            rows: IndexMap::new(),
        }
    }

    /// Build from a FILTER response.
    ///
    /// `BODY[0]` is the column header and is skipped. Upload files are
    /// looked up under the same body index.
    pub fn from_wire(indexer: Arc<Indexer>, response: &Value) -> ModelResult<Self> {
        Self::from_body(indexer, response, 1)
    }

    /// Build from a FILTER_DATAONLY response, whose `BODY` has no header.
    pub fn from_data_only(indexer: Arc<Indexer>, response: &Value) -> ModelResult<Self> {
        Self::from_body(indexer, response, 0)
    }

    fn from_body(indexer: Arc<Indexer>, response: &Value, first_row: usize) -> ModelResult<Self> {
        let contents = wire::contents(response)?;
        let body = contents
            .get(wire::BODY)
            .and_then(Value::as_array)
            .ok_or_else(|| ModelError::MalformedWireShape(format!("{} is not an array", wire::BODY)))?;
        let upload_files = contents.get(wire::UPLOAD_FILE);

        let mut table = Self::new(indexer);
        for (index, entry) in body.iter().enumerate().skip(first_row) {
            let files = match upload_files {
                Some(Value::Object(files)) => files.get(&index.to_string()),
                Some(Value::Array(files)) => files.get(index),
                _ => None,
            };

            let body = Record::from_wire(table.indexer.clone(), RecordKind::Body, entry)?;
            let file = match files {
                Some(files) => Record::from_wire(table.indexer.clone(), RecordKind::File, files)?,
                None => Record::new(table.indexer.clone(), RecordKind::File),
            };
            table.add_row(Row::from_records(body, file)?)?;
        }

        log::debug!(
            "Loaded {} rows of the menu \"{}\"",
            table.len(),
            table.indexer.menu_id()
        );
        Ok(table)
    }

    pub fn shared_indexer(&self) -> &Arc<Indexer> {
        &self.indexer
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.values()
    }

    /// Row by identity.
    pub fn get(&self, id: &str) -> Option<&Row> {
        self.rows.get(id)
    }

    /// Add a row and return its table key.
    ///
    /// Fails if a row with the same identity is present.
    pub fn add_row(&mut self, row: Row) -> ModelResult<String> {
        self.check_acceptable(&row)?;

        let key = match row.identity() {
            Some(id) if self.rows.contains_key(id) => {
                return Err(ModelError::DuplicateIdentity {
                    menu_id: self.indexer.menu_id().to_string(),
                    id: id.to_string(),
                });
            }
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        self.rows.insert(key.clone(), row);
        Ok(key)
    }

    /// Merge into the row with the same identity, or add when there is none.
    pub fn merge_row(&mut self, row: Row) -> ModelResult<()> {
        self.check_acceptable(&row)?;

        if let Some(base) = row.identity().and_then(|id| self.rows.get_mut(id)) {
            return base.merge(&row);
        }
        self.add_row(row).map(|_| ())
    }

    /// Serialize to an EDIT payload.
    ///
    /// Rows are keyed by their position in this table. `UPLOAD_FILE` is
    /// present only when some row carries file data.
    pub fn to_wire(&self) -> ModelResult<Value> {
        let mut payload = Map::new();
        let mut upload_files = Map::new();

        for (index, row) in self.rows.values().enumerate() {
            payload.insert(index.to_string(), Value::Object(row.body().to_wire()?));

            let files = row.file().to_wire()?;
            if !files.is_empty() {
                upload_files.insert(index.to_string(), Value::Object(files));
            }
        }

        if !upload_files.is_empty() {
            payload.insert(wire::UPLOAD_FILE.to_string(), Value::Object(upload_files));
        }

        Ok(Value::Object(payload))
    }
}

impl MenuScoped for Table {
    fn indexer(&self) -> &Indexer {
        &self.indexer
    }
}
