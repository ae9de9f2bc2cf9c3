//! Declarative edits.
//!
//! - [`template`] - placeholder substitution for field values
//! - [`strategy`] - row selection and edited-row construction
//! - [`entry`] - edit entries as read from JSON
//! - [`editor`] - entries to one edit table

pub mod editor;
pub mod entry;
pub mod strategy;
pub mod template;

pub use editor::build_edit_table;
pub use entry::{parse_entries, Criteria, EditEntry, FieldValues};
pub use strategy::{Candidate, Strategy};
pub use template::{CaptureGroups, Template, TemplateContext};
