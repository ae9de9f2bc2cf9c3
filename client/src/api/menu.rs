//! Per-menu request context.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::edit::{self, EditEntry};
use crate::error::{EditError, EditResult};
use crate::models::{Indexer, ReservedColumns, Table};
use crate::wire::{self, OptionsTable};

use super::transport::{Transport, XCommand};

/// One menu reached through a [`Transport`].
///
/// The column indexer and the options table are fetched on first use and
/// kept for the lifetime of the context.
pub struct MenuClient<'t, T> {
    transport: &'t T,
    menu_id: String,
    reserved: ReservedColumns,
    indexer: OnceCell<Arc<Indexer>>,
    options: OnceCell<OptionsTable>,
}

impl<'t, T: Transport> MenuClient<'t, T> {
    pub fn new(transport: &'t T, menu_id: impl Into<String>) -> Self {
        Self {
            transport,
            menu_id: menu_id.into(),
            reserved: ReservedColumns::default(),
            indexer: OnceCell::new(),
            options: OnceCell::new(),
        }
    }

    /// Use locale-specific reserved column names.
    pub fn with_reserved(mut self, reserved: ReservedColumns) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn menu_id(&self) -> &str {
        &self.menu_id
    }

    /// Column indexer, from an INFO call on first use.
    pub async fn indexer(&self) -> EditResult<Arc<Indexer>> {
        let indexer = self
            .indexer
            .get_or_try_init(|| async {
                let response = self.transport.fetch(&self.menu_id, XCommand::Info, None).await?;
                let names = wire::column_names(&response)?;
                log::debug!("Menu \"{}\" has {} columns", self.menu_id, names.len());
                let indexer = Indexer::with_reserved(self.menu_id.clone(), names, self.reserved.clone())?;
                Ok::<_, EditError>(Arc::new(indexer))
            })
            .await?;
        Ok(indexer.clone())
    }

    /// Options table, from a LIST_OPTIONS call on first use.
    pub async fn options(&self) -> EditResult<&OptionsTable> {
        self.options
            .get_or_try_init(|| async {
                let response = self
                    .transport
                    .fetch(&self.menu_id, XCommand::ListOptions, None)
                    .await?;
                Ok::<_, EditError>(wire::options_table(&response)?)
            })
            .await
    }

    /// Rows selected by `filter`; `None` fetches every row.
    pub async fn fetch_table(&self, filter: Option<&Value>) -> EditResult<Table> {
        let indexer = self.indexer().await?;
        let response = self.transport.fetch(&self.menu_id, XCommand::Filter, filter).await?;
        Ok(Table::from_wire(indexer, &response)?)
    }

    /// Rows selected by `filter`, through FILTER_DATAONLY.
    pub async fn fetch_data_only(&self, filter: Option<&Value>) -> EditResult<Table> {
        let indexer = self.indexer().await?;
        let response = self
            .transport
            .fetch(&self.menu_id, XCommand::FilterDataOnly, filter)
            .await?;
        Ok(Table::from_data_only(indexer, &response)?)
    }

    /// Send a payload and return the response as received.
    pub async fn submit(&self, command: XCommand, payload: &Value) -> EditResult<Value> {
        Ok(self.transport.submit(&self.menu_id, command, payload).await?)
    }

    /// Build the edit table for `entries` without submitting it.
    ///
    /// With a `filter`, selectors run against the rows it fetches;
    /// without one they see an empty table.
    pub async fn prepare_edit(&self, entries: &[EditEntry], filter: Option<&Value>) -> EditResult<Table> {
        let indexer = self.indexer().await?;
        let original = match filter {
            Some(filter) => self.fetch_table(Some(filter)).await?,
            None => Table::new(indexer.clone()),
        };
        edit::build_edit_table(&indexer, &original, entries)
    }

    /// Run `entries` and submit the result in one EDIT call.
    pub async fn edit(&self, entries: &[EditEntry], filter: Option<&Value>) -> EditResult<Value> {
        let table = self.prepare_edit(entries, filter).await?;
        let payload = table.to_wire()?;
        log::info!(
            "Submitting {} rows to the menu \"{}\"",
            table.len(),
            self.menu_id
        );
        self.submit(XCommand::Edit, &payload).await
    }
}
