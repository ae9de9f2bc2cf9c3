//! Remote response envelope.
//!
//! Every response nests its payload under `resultdata.CONTENTS`:
//!
//! ```text
//! FILTER        {"resultdata": {"CONTENTS": {"BODY": [header, row1, ...], "UPLOAD_FILE": {...}}}}
//! INFO          {"resultdata": {"CONTENTS": {"INFO": [columnName, ...]}}}
//! LIST_OPTIONS  {"resultdata": {"CONTENTS": {"BODY": [columnNames, perColumnOptions]}}}
//! ```

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::{ModelError, ModelResult};

pub const RESULT_DATA: &str = "resultdata";
pub const CONTENTS: &str = "CONTENTS";
pub const BODY: &str = "BODY";
pub const UPLOAD_FILE: &str = "UPLOAD_FILE";
pub const INFO: &str = "INFO";

/// Selectable values per column: column name -> (option key -> label).
pub type OptionsTable = IndexMap<String, IndexMap<String, String>>;

/// The `resultdata.CONTENTS` object of a response.
pub fn contents(response: &Value) -> ModelResult<&Map<String, Value>> {
    response
        .get(RESULT_DATA)
        .and_then(|data| data.get(CONTENTS))
        .and_then(Value::as_object)
        .ok_or_else(|| ModelError::MalformedWireShape(format!("missing {}.{}", RESULT_DATA, CONTENTS)))
}

/// A required array member of `CONTENTS`.
pub fn contents_array<'a>(response: &'a Value, key: &str) -> ModelResult<&'a Vec<Value>> {
    contents(response)?
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ModelError::MalformedWireShape(format!("{}.{}.{} is not an array", RESULT_DATA, CONTENTS, key)))
}

/// Column names of an INFO response, in position order.
pub fn column_names(response: &Value) -> ModelResult<Vec<String>> {
    contents_array(response, INFO)?
        .iter()
        .map(|name| {
            name.as_str()
                .map(str::to_string)
                .ok_or_else(|| ModelError::MalformedWireShape(format!("column name {} is not a string", name)))
        })
        .collect()
}

/// Options table of a LIST_OPTIONS response.
///
/// Sequences are keyed by their index, mappings are kept as they are, and
/// columns without options are left out.
pub fn options_table(response: &Value) -> ModelResult<OptionsTable> {
    let body = contents_array(response, BODY)?;
    let (names, options) = match body.as_slice() {
        [names, options, ..] => (names, options),
        _ => {
            return Err(ModelError::MalformedWireShape(
                "LIST_OPTIONS body needs column names and options".to_string(),
            ))
        }
    };
    let names = names
        .as_array()
        .ok_or_else(|| ModelError::MalformedWireShape("LIST_OPTIONS column names is not an array".to_string()))?;
    let options = options
        .as_array()
        .ok_or_else(|| ModelError::MalformedWireShape("LIST_OPTIONS options is not an array".to_string()))?;

    let mut table = OptionsTable::new();
    for (name, entry) in names.iter().zip(options) {
        let name = name
            .as_str()
            .ok_or_else(|| ModelError::MalformedWireShape(format!("column name {} is not a string", name)))?;

        let mut converted = IndexMap::new();
        match entry {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if let Some(text) = scalar_text(item)? {
                        converted.insert(index.to_string(), text);
                    }
                }
            }
            Value::Object(items) => {
                for (key, item) in items {
                    if let Some(text) = scalar_text(item)? {
                        converted.insert(key.clone(), text);
                    }
                }
            }
            other => {
                return Err(ModelError::MalformedWireShape(format!(
                    "options of column \"{}\" must be a list or object, found {}",
                    name, other
                )));
            }
        }

        if !converted.is_empty() {
            table.insert(name.to_string(), converted);
        }
    }

    Ok(table)
}

/// Text of a scalar cell. `null` is absent; lists and objects are malformed.
pub fn scalar_text(value: &Value) -> ModelResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        other => Err(ModelError::MalformedWireShape(format!("expected a scalar cell, found {}", other))),
    }
}

/// Filter selecting rows that are not retired.
pub fn default_filter() -> Value {
    json!({"1": {"NORMAL": "0"}})
}
