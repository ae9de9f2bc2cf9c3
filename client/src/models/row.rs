//! A menu row: body record plus upload-file record.

use std::sync::Arc;

use crate::error::{ModelError, ModelResult};

use super::indexer::{Indexer, MenuScoped};
use super::record::{Record, RecordKind};
use super::{OperationKind, IDENTITY_POSITION};

/// Body and upload-file records of one row, sharing one indexer.
///
/// The identity is the body's identity column; rows that were never
/// submitted have none.
#[derive(Debug, Clone)]
pub struct Row {
    indexer: Arc<Indexer>,
    body: Record,
    file: Record,
}

impl Row {
    /// Empty row.
    pub fn new(indexer: Arc<Indexer>) -> Self {
        Self {
            body: Record::new(indexer.clone(), RecordKind::Body),
            file: Record::new(indexer.clone(), RecordKind::File),
            indexer,
        }
    }

    /// Row from name-keyed body and file values, optionally tagged with an operation.
    pub fn from_named<B, F, K, V>(
        indexer: Arc<Indexer>,
        body: B,
        file: F,
        operation: Option<OperationKind>,
    ) -> ModelResult<Self>
    where
        B: IntoIterator<Item = (K, V)>,
        F: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut row = Self {
            body: Record::from_named(indexer.clone(), RecordKind::Body, body)?,
            file: Record::from_named(indexer.clone(), RecordKind::File, file)?,
            indexer,
        };
        if let Some(operation) = operation {
            row.set_operation(operation)?;
        }
        Ok(row)
    }

    /// Row from two records of the same menu.
    pub fn from_records(body: Record, file: Record) -> ModelResult<Self> {
        body.check_acceptable(&file)?;
        let indexer = body.shared_indexer().clone();
        Ok(Self { indexer, body, file })
    }

    pub fn body(&self) -> &Record {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Record {
        &mut self.body
    }

    pub fn file(&self) -> &Record {
        &self.file
    }

    pub fn file_mut(&mut self) -> &mut Record {
        &mut self.file
    }

    pub fn identity(&self) -> Option<&str> {
        self.body.identity()
    }

    /// Operation kind stored in the body, if any.
    pub fn operation(&self) -> ModelResult<Option<OperationKind>> {
        let position = self.indexer.operation_position()?;
        Ok(self.body.at(position).and_then(OperationKind::from_label))
    }

    pub fn set_operation(&mut self, operation: OperationKind) -> ModelResult<()> {
        let position = self.indexer.operation_position()?;
        self.body.insert_position(position, operation.label().to_string());
        Ok(())
    }

    /// Start an edit of this row.
    ///
    /// The new body keeps only the identity and the last-modified token of
    /// this row and carries `operation`; the file record starts empty. The
    /// server compares the token to reject stale edits, so a row without
    /// one is malformed.
    pub fn clone_for_edit(&self, operation: OperationKind) -> ModelResult<Row> {
        let last_updated = self.indexer.last_updated_position()?;
        let token = self.body.at(last_updated).ok_or_else(|| {
            ModelError::MalformedWireShape(format!(
                "row {} of the menu \"{}\" has no \"{}\" value",
                self.identity().unwrap_or("without identity"),
                self.indexer.menu_id(),
                self.indexer.reserved().last_updated
            ))
        })?;

        let mut edited = Row::new(self.indexer.clone());
        if let Some(id) = self.body.at(IDENTITY_POSITION) {
            edited.body.insert_position(IDENTITY_POSITION, id.to_string());
        }
        edited.body.insert_position(last_updated, token.to_string());
        edited.set_operation(operation)?;
        Ok(edited)
    }

    /// Merge body and file records independently; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Row) -> ModelResult<()> {
        self.check_acceptable(other)?;
        self.body.merge(&other.body)?;
        self.file.merge(&other.file)?;
        Ok(())
    }
}

impl MenuScoped for Row {
    fn indexer(&self) -> &Indexer {
        &self.indexer
    }
}
