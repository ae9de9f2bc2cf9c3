//! Data model for ITA menus.
//!
//! - [`Indexer`] - name/position bijection of one menu's columns
//! - [`Record`] - positional value store for one half of a row
//! - [`Row`] - body and upload-file records sharing one identity
//! - [`Table`] - identity-keyed collection of rows
//! - [`OperationKind`] - create / update / retire / reinstate intent
//! - [`ReservedColumns`] - names of the platform's well-known columns

pub mod indexer;
pub mod record;
pub mod row;
pub mod table;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use indexer::{Indexer, MenuScoped};
pub use record::{Record, RecordKind};
pub use row::Row;
pub use table::Table;

/// Position of the row identity column. Identical in every menu.
pub const IDENTITY_POSITION: usize = 0;

// =============================================================================
// Operation Kind
// =============================================================================

/// Intent of a row in an edit submission, carried in the operation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// New row (登録).
    #[serde(rename = "create", alias = "登録")]
    Create,
    /// Change an existing row (更新).
    #[serde(rename = "update", alias = "更新")]
    Update,
    /// Retire an existing row (廃止).
    #[serde(rename = "retire", alias = "廃止")]
    Retire,
    /// Bring a retired row back (復活).
    #[serde(rename = "reinstate", alias = "復活")]
    Reinstate,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Create,
        OperationKind::Update,
        OperationKind::Retire,
        OperationKind::Reinstate,
    ];

    /// Value sent in the operation column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "登録",
            Self::Update => "更新",
            Self::Retire => "廃止",
            Self::Reinstate => "復活",
        }
    }

    /// Parse a wire label or an English name.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "登録" | "create" => Some(Self::Create),
            "更新" | "update" => Some(Self::Update),
            "廃止" | "retire" => Some(Self::Retire),
            "復活" | "reinstate" => Some(Self::Reinstate),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Reserved Columns
// =============================================================================

/// Names of the reserved columns resolved through an [`Indexer`].
///
/// The names depend on the platform locale. Row identity is not listed
/// because it is addressed by [`IDENTITY_POSITION`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedColumns {
    /// Column holding the [`OperationKind`] label.
    pub operation: String,
    /// Concurrency token echoed back on update, retire and reinstate.
    pub last_updated: String,
}

impl Default for ReservedColumns {
    fn default() -> Self {
        Self {
            operation: "実行処理種別".to_string(),
            last_updated: "更新用の最終更新日時".to_string(),
        }
    }
}
