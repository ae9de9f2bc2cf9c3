//! Transport seam between the client and the remote menu endpoint.

use std::fmt;

use serde_json::Value;

use crate::error::TransportResult;

/// Value of the `X-Command` request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XCommand {
    /// Column names of a menu.
    Info,
    /// Rows with a header row.
    Filter,
    /// Rows without a header row.
    FilterDataOnly,
    /// Selectable values per column.
    ListOptions,
    /// Create, update, retire or reinstate rows.
    Edit,
}

impl XCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            XCommand::Info => "INFO",
            XCommand::Filter => "FILTER",
            XCommand::FilterDataOnly => "FILTER_DATAONLY",
            XCommand::ListOptions => "LIST_OPTIONS",
            XCommand::Edit => "EDIT",
        }
    }
}

impl fmt::Display for XCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One round trip per call; failures are [`crate::error::TransportError`].
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Read-only call, with an optional JSON body.
    async fn fetch(&self, menu_id: &str, command: XCommand, params: Option<&Value>) -> TransportResult<Value>;

    /// Mutating call with a JSON payload.
    async fn submit(&self, menu_id: &str, command: XCommand, payload: &Value) -> TransportResult<Value>;
}
