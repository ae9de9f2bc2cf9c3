//! # ITA client - name-addressed rows and declarative edits for Exastro ITA menus
//!
//! Exastro IT Automation menus are tables whose columns are positional on
//! the wire. This crate maps them to column names, merges partial rows,
//! and turns declarative edit entries into one EDIT submission.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Edit entries│────▶│  Strategy   │────▶│ Edit Table  │────▶│  EDIT call  │
//! │   (JSON)    │     │ (+template) │     │  (merged)   │     │ (positional)│
//! └─────────────┘     └──────▲──────┘     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     │ FILTER rows │
//!                     │  (Indexer)  │
//!                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ita_client::{EditEntry, HttpTransport, MenuClient, OperationKind, Strategy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = HttpTransport::from_env().unwrap();
//!     let client = MenuClient::new(&transport, "2100000303");
//!     let entries = vec![EditEntry::new(OperationKind::Create)
//!         .with_strategy(Strategy::sequence_range(1..4))
//!         .with_body("ホスト名", "web-{sequence:0>2d}")];
//!     let response = client.edit(&entries, None).await.unwrap();
//!     println!("{}", response);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Indexer, Record, Row and Table
//! - [`wire`] - Response envelope and INFO / LIST_OPTIONS decoding
//! - [`edit`] - Templates, strategies, entries and the edit orchestrator
//! - [`api`] - Configuration, transport and per-menu context
//! - [`catalog`] - Menu names to menu ids

// Core modules
pub mod error;
pub mod models;
pub mod wire;

// Editing
pub mod edit;

// Remote access
pub mod api;

// Configuration
pub mod catalog;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CatalogError,
    EditError,
    EditResult,
    ModelError,
    StrategyError,
    TemplateError,
    TransportError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Indexer,
    MenuScoped,
    OperationKind,
    Record,
    RecordKind,
    ReservedColumns,
    Row,
    Table,
};

// =============================================================================
// Re-exports - Edit
// =============================================================================

pub use edit::{
    build_edit_table,
    parse_entries,
    Criteria,
    EditEntry,
    FieldValues,
    Strategy,
    Template,
    TemplateContext,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::{ApiConfig, HttpTransport, MenuClient, Transport, XCommand};
pub use catalog::MenuCatalog;
pub use wire::OptionsTable;
