//! Error types for the ITA client.
//!
//! Each layer owns one error enum:
//!
//! - [`ModelError`] - column lookup, merge and wire-shape errors of the data model
//! - [`TemplateError`] - template parsing and substitution errors
//! - [`StrategyError`] - row selection and edited-row construction errors
//! - [`TransportError`] - configuration and HTTP round-trip errors
//! - [`CatalogError`] - menu catalog errors
//! - [`EditError`] - top-level errors of an edit cycle
//!
//! Lower layers convert into higher ones through `From`, so `?` works
//! across layer boundaries.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::OperationKind;

// =============================================================================
// Data Model Errors
// =============================================================================

/// Errors raised by [`crate::models`].
#[derive(Debug, Error)]
pub enum ModelError {
    /// Unknown column name, or reverse lookup of a position with no column.
    #[error("Invalid column {key} for the menu \"{menu_id}\". Valid columns are {valid}")]
    InvalidColumn {
        menu_id: String,
        key: String,
        valid: String,
    },

    /// Position outside `0..count`.
    #[error("Invalid position {position} for the menu \"{menu_id}\". Valid range is 0 <= position < {count}")]
    OutOfRange {
        menu_id: String,
        position: i64,
        count: usize,
    },

    /// Two entities belonging to different menus were combined.
    #[error("Menu id \"{actual}\" does not match the expected menu id \"{expected}\"")]
    MenuMismatch { expected: String, actual: String },

    /// Attempt to edit the row identity column.
    #[error("Column \"{column}\" of the menu \"{menu_id}\" holds the row identity and can not be modified")]
    Immutable { menu_id: String, column: String },

    /// A row with this identity is already in the table.
    #[error("Row id \"{id}\" already exists in the table of the menu \"{menu_id}\"")]
    DuplicateIdentity { menu_id: String, id: String },

    /// A remote response lacks an expected structural element.
    #[error("Malformed response: {0}")]
    MalformedWireShape(String),

    /// A file referenced by an upload column could not be read.
    #[error("Failed to read upload file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Template Errors
// =============================================================================

/// Errors raised by [`crate::edit::template`].
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template text itself is malformed.
    #[error("Invalid template \"{template}\": {message}")]
    Syntax { template: String, message: String },

    /// The placeholder names a variable absent from the context.
    #[error("Undefined template variable \"{0}\"")]
    UndefinedVariable(String),

    /// A key or index of the placeholder path does not exist.
    #[error("Undefined key or index in \"{expression}\"")]
    UndefinedIndex { expression: String },

    /// The placeholder resolves to a list or map.
    #[error("\"{expression}\" does not resolve to a scalar value")]
    NotScalar { expression: String },

    /// The format directive can not be applied to the value.
    #[error("Invalid format \"{spec}\": {message}")]
    BadFormat { spec: String, message: String },
}

// =============================================================================
// Strategy Errors
// =============================================================================

/// Errors raised by [`crate::edit::strategy`].
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The operation kind is not in the strategy's allowed set.
    #[error("Operation \"{operation}\" is not allowed for the {strategy} strategy")]
    IllegalOperation {
        strategy: &'static str,
        operation: OperationKind,
    },

    /// More than one row matched a selector that requires exactly one.
    #[error("{count} rows of the menu \"{menu_id}\" matched a unique selector")]
    AmbiguousSelection { menu_id: String, count: usize },

    /// A selector without criteria or patterns.
    #[error("The {strategy} selector needs at least one column to match")]
    EmptySelector { strategy: &'static str },

    /// A regexp selector pattern does not compile.
    #[error("Invalid pattern for column \"{column}\": {source}")]
    InvalidPattern {
        column: String,
        #[source]
        source: regex::Error,
    },

    /// Data model error while building an edited row.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Template error while building an edited row.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors raised by [`crate::api`] collaborators.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A required configuration key is not set.
    #[error("Missing configuration value {0}")]
    MissingConfig(String),

    /// The request could not be sent or its body not read.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not JSON.
    #[error("Invalid JSON response: {0}")]
    InvalidJson(String),
}

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors raised by [`crate::catalog`].
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Name is neither in the catalog nor a literal menu id.
    #[error("Menu not found in catalog: {0}")]
    NotFound(String),

    /// Entry value is not a string or nested object.
    #[error("Invalid catalog entry at \"{0}\"")]
    InvalidEntry(String),

    #[error("Catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Edit Errors (top-level)
// =============================================================================

/// Top-level error of a fetch or edit cycle.
///
/// Any variant aborts the current request; nothing is retried locally.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for data model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Result type for strategy operations.
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for edit cycles.
pub type EditResult<T> = Result<T, EditError>;
