//! Positional value store addressed by column name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::wire;

use super::indexer::{Indexer, MenuScoped};
use super::IDENTITY_POSITION;

/// Which half of a row a record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// General columns, including the reserved ones.
    Body,
    /// Upload columns whose values are local file paths.
    File,
}

/// Column values of one row half, stored by position.
///
/// Every stored position is valid for the record's [`Indexer`].
#[derive(Debug, Clone)]
pub struct Record {
    indexer: Arc<Indexer>,
    kind: RecordKind,
    values: BTreeMap<usize, String>,
}

impl Record {
    pub fn new(indexer: Arc<Indexer>, kind: RecordKind) -> Self {
        Self {
            indexer,
            kind,
            values: BTreeMap::new(),
        }
    }

    /// Build from name-keyed values.
    ///
    /// The identity column may be given here; it can not be changed later.
    pub fn from_named<I, K, V>(indexer: Arc<Indexer>, kind: RecordKind, values: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new(indexer, kind);
        for (name, value) in values {
            let position = record.indexer.name_to_position(name.as_ref())?;
            record.values.insert(position, value.into());
        }
        Ok(record)
    }

    /// Build from position-keyed values.
    pub fn from_positions<I>(indexer: Arc<Indexer>, kind: RecordKind, values: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = (usize, String)>,
    {
        let mut record = Self::new(indexer, kind);
        for (position, value) in values {
            let position = record.indexer.check_position(position as i64)?;
            record.values.insert(position, value);
        }
        Ok(record)
    }

    /// Build from a wire value: a positional array, an object keyed by
    /// string-encoded positions, or `null` for an empty record.
    ///
    /// `null` cells are treated as absent.
    pub fn from_wire(indexer: Arc<Indexer>, kind: RecordKind, value: &Value) -> ModelResult<Self> {
        let mut record = Self::new(indexer, kind);

        match value {
            Value::Null => {}
            Value::Array(cells) => {
                for (position, cell) in cells.iter().enumerate() {
                    let position = record.indexer.check_position(position as i64)?;
                    if let Some(text) = wire::scalar_text(cell)? {
                        record.values.insert(position, text);
                    }
                }
            }
            Value::Object(cells) => {
                for (key, cell) in cells {
                    let position = record.indexer.sanitize(key, false)?;
                    if let Some(text) = wire::scalar_text(cell)? {
                        record.values.insert(position, text);
                    }
                }
            }
            other => {
                return Err(ModelError::MalformedWireShape(format!(
                    "expected a row array or object, found {}",
                    other
                )));
            }
        }

        Ok(record)
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Stored values keyed by position, in ascending order.
    pub fn values(&self) -> &BTreeMap<usize, String> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a column; `Ok(None)` when the column exists but holds nothing.
    pub fn get(&self, name: &str) -> ModelResult<Option<&str>> {
        let position = self.indexer.name_to_position(name)?;
        Ok(self.at(position))
    }

    pub fn at(&self, position: usize) -> Option<&str> {
        self.values.get(&position).map(String::as_str)
    }

    /// Set a column value and return the previous one.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> ModelResult<Option<String>> {
        let position = self.writable_position(name)?;
        Ok(self.values.insert(position, value.into()))
    }

    /// Remove a column value and return it.
    pub fn delete(&mut self, name: &str) -> ModelResult<Option<String>> {
        let position = self.writable_position(name)?;
        Ok(self.values.remove(&position))
    }

    pub fn identity(&self) -> Option<&str> {
        self.at(IDENTITY_POSITION)
    }

    /// `(column name, value)` pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.values.iter().filter_map(|(position, value)| {
            self.indexer
                .names()
                .get(*position)
                .map(|name| (name.as_str(), value.as_str()))
        })
    }

    /// Union with `other`; values of `other` win on shared columns.
    pub fn merge(&mut self, other: &Record) -> ModelResult<()> {
        self.check_acceptable(other)?;
        self.values
            .extend(other.values.iter().map(|(position, value)| (*position, value.clone())));
        Ok(())
    }

    /// Serialize to the position-keyed object of an EDIT payload.
    ///
    /// File records replace each non-empty path with the base64 encoding
    /// of the file's content.
    pub fn to_wire(&self) -> ModelResult<Map<String, Value>> {
        let mut object = Map::new();
        for (position, value) in &self.values {
            let value = match self.kind {
                RecordKind::File if !value.is_empty() => encode_file(Path::new(value))?,
                _ => value.clone(),
            };
            object.insert(position.to_string(), Value::String(value));
        }
        Ok(object)
    }

    /// Name-keyed view for display.
    pub fn to_named_json(&self) -> Map<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect()
    }

    pub(crate) fn shared_indexer(&self) -> &Arc<Indexer> {
        &self.indexer
    }

    /// Insert without the identity guard. Used while building edit rows.
    pub(crate) fn insert_position(&mut self, position: usize, value: String) {
        self.values.insert(position, value);
    }

    fn writable_position(&self, name: &str) -> ModelResult<usize> {
        let position = self.indexer.name_to_position(name)?;
        if position == IDENTITY_POSITION {
            return Err(ModelError::Immutable {
                menu_id: self.indexer.menu_id().to_string(),
                column: name.to_string(),
            });
        }
        Ok(position)
    }
}

impl MenuScoped for Record {
    fn indexer(&self) -> &Indexer {
        &self.indexer
    }
}

fn encode_file(path: &Path) -> ModelResult<String> {
    let content = fs::read(path).map_err(|source| ModelError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(STANDARD.encode(content))
}
