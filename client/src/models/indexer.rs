//! Column indexer: bidirectional name/position mapping for one menu.

use std::collections::HashMap;

use crate::error::{ModelError, ModelResult};

use super::{ReservedColumns, IDENTITY_POSITION};

/// Name/position bijection of one menu's columns.
///
/// Built once per menu from the INFO column list and never mutated.
/// Two indexers are considered compatible when their menu ids are equal.
#[derive(Debug, Clone)]
pub struct Indexer {
    menu_id: String,
    positions: HashMap<String, usize>,
    names: Vec<String>,
    reserved: ReservedColumns,
}

impl Indexer {
    /// Build an indexer with the default reserved column names.
    pub fn new<I, S>(menu_id: impl Into<String>, column_names: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_reserved(menu_id, column_names, ReservedColumns::default())
    }

    /// Build an indexer whose reserved columns use locale-specific names.
    pub fn with_reserved<I, S>(
        menu_id: impl Into<String>,
        column_names: I,
        reserved: ReservedColumns,
    ) -> ModelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let menu_id = menu_id.into();
        let names: Vec<String> = column_names.into_iter().map(Into::into).collect();

        let mut positions = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), position).is_some() {
                return Err(ModelError::MalformedWireShape(format!(
                    "duplicate column name \"{}\" in the menu \"{}\"",
                    name, menu_id
                )));
            }
        }

        Ok(Self {
            menu_id,
            positions,
            names,
            reserved,
        })
    }

    pub fn menu_id(&self) -> &str {
        &self.menu_id
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column names in position order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn reserved(&self) -> &ReservedColumns {
        &self.reserved
    }

    /// Resolve a column name to its position.
    pub fn name_to_position(&self, name: &str) -> ModelResult<usize> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::InvalidColumn {
                menu_id: self.menu_id.clone(),
                key: format!("\"{}\"", name),
                valid: format!("{:?}", self.names),
            })
    }

    /// Resolve a position to its column name.
    pub fn position_to_name(&self, position: usize) -> ModelResult<&str> {
        self.names
            .get(position)
            .map(String::as_str)
            .ok_or_else(|| ModelError::InvalidColumn {
                menu_id: self.menu_id.clone(),
                key: format!("#{}", position),
                valid: self.position_range(),
            })
    }

    /// Turn a column key into a checked position.
    ///
    /// With `named` the key is a column name; otherwise it is a
    /// string-encoded position as found in wire objects.
    pub fn sanitize(&self, key: &str, named: bool) -> ModelResult<usize> {
        if named {
            return self.name_to_position(key);
        }

        let position: i64 = key.trim().parse().map_err(|_| ModelError::InvalidColumn {
            menu_id: self.menu_id.clone(),
            key: format!("\"{}\"", key),
            valid: self.position_range(),
        })?;
        self.check_position(position)
    }

    /// Check `0 <= position < len()`.
    pub fn check_position(&self, position: i64) -> ModelResult<usize> {
        if position < 0 || position as usize >= self.names.len() {
            return Err(ModelError::OutOfRange {
                menu_id: self.menu_id.clone(),
                position,
                count: self.names.len(),
            });
        }
        Ok(position as usize)
    }

    pub fn identity_position(&self) -> usize {
        IDENTITY_POSITION
    }

    /// Position of the operation-kind column.
    pub fn operation_position(&self) -> ModelResult<usize> {
        self.name_to_position(&self.reserved.operation)
    }

    /// Position of the last-modified concurrency token column.
    pub fn last_updated_position(&self) -> ModelResult<usize> {
        self.name_to_position(&self.reserved.last_updated)
    }

    fn position_range(&self) -> String {
        format!("0 to {}", self.names.len().saturating_sub(1))
    }
}

/// Anything bound to one menu through an [`Indexer`].
pub trait MenuScoped {
    fn indexer(&self) -> &Indexer;

    fn menu_id(&self) -> &str {
        self.indexer().menu_id()
    }

    /// Fails with [`ModelError::MenuMismatch`] unless `other` belongs to the same menu.
    fn check_acceptable<O: MenuScoped + ?Sized>(&self, other: &O) -> ModelResult<()> {
        if self.menu_id() != other.menu_id() {
            return Err(ModelError::MenuMismatch {
                expected: self.menu_id().to_string(),
                actual: other.menu_id().to_string(),
            });
        }
        Ok(())
    }
}

impl MenuScoped for Indexer {
    fn indexer(&self) -> &Indexer {
        self
    }
}
