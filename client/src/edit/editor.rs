//! Edit orchestration: entries to one edit table.

use std::sync::Arc;

use crate::error::EditResult;
use crate::models::{Indexer, MenuScoped, Table};

use super::entry::EditEntry;

/// Run every entry against `original` and collect the edited rows.
///
/// Edited rows with the same identity are merged; later entries win on
/// shared columns. An error aborts the whole batch before anything is
/// submitted.
pub fn build_edit_table(indexer: &Arc<Indexer>, original: &Table, entries: &[EditEntry]) -> EditResult<Table> {
    indexer.check_acceptable(original)?;

    let mut edited = Table::new(indexer.clone());
    for (index, entry) in entries.iter().enumerate() {
        let strategy = entry.resolve_strategy()?;

        let mut produced = 0;
        for candidate in strategy.select_rows(original)? {
            let row = strategy.create_edited_row(&candidate, indexer, entry.operation, &entry.values)?;
            edited.merge_row(row)?;
            produced += 1;
        }

        log::info!(
            "Entry {}: {} produced {} {} rows",
            index,
            strategy.name(),
            produced,
            entry.operation
        );
    }

    Ok(edited)
}
