//! In-memory transport for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{TransportError, TransportResult};

use super::transport::{Transport, XCommand};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub menu_id: String,
    pub command: XCommand,
    pub body: Option<Value>,
}

/// Answers each command with a canned response and records every call.
///
/// Commands without a response fail with HTTP 404.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    responses: HashMap<XCommand, Value>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: XCommand, response: Value) -> Self {
        self.responses.insert(command, response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn commands(&self) -> Vec<XCommand> {
        self.calls().into_iter().map(|call| call.command).collect()
    }

    fn answer(&self, menu_id: &str, command: XCommand, body: Option<&Value>) -> TransportResult<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                menu_id: menu_id.to_string(),
                command,
                body: body.cloned(),
            });
        }
        self.responses.get(&command).cloned().ok_or(TransportError::Status {
            status: 404,
            body: format!("no response for {}", command),
        })
    }
}

impl Transport for RecordingTransport {
    async fn fetch(&self, menu_id: &str, command: XCommand, params: Option<&Value>) -> TransportResult<Value> {
        self.answer(menu_id, command, params)
    }

    async fn submit(&self, menu_id: &str, command: XCommand, payload: &Value) -> TransportResult<Value> {
        self.answer(menu_id, command, Some(payload))
    }
}
