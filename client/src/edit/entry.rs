//! Declarative edit entries.
//!
//! An entry names an operation, how rows are chosen, and the values to
//! write:
//!
//! ```json
//! {
//!   "operation": "update",
//!   "strategy": {"type": "regexp", "patterns": {"host": "srv-(\\d+)"}},
//!   "body": {"host": "srv-new-{groups[\"host\"][1]}"},
//!   "upload_file": {"key": "keys/{groups[\"host\"][1]}.pem"}
//! }
//! ```
//!
//! `strategy` may also be a plain `{"column": "value"}` map, which is an
//! exact match, or be left out for a single constant register.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StrategyResult;
use crate::models::OperationKind;

use super::strategy::Strategy;

/// Name-keyed values written into edited rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValues {
    #[serde(default)]
    pub body: BTreeMap<String, String>,

    /// Local file paths for upload columns.
    #[serde(default, alias = "file")]
    pub upload_file: BTreeMap<String, String>,
}

/// Row selection given by an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Criteria {
    Strategy(Strategy),
    /// Column values to match exactly.
    Literal(BTreeMap<String, String>),
}

impl From<Strategy> for Criteria {
    fn from(strategy: Strategy) -> Self {
        Criteria::Strategy(strategy)
    }
}

impl From<BTreeMap<String, String>> for Criteria {
    fn from(criteria: BTreeMap<String, String>) -> Self {
        Criteria::Literal(criteria)
    }
}

/// One declarative edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditEntry {
    pub operation: OperationKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Criteria>,

    #[serde(flatten)]
    pub values: FieldValues,
}

impl EditEntry {
    pub fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            strategy: None,
            values: FieldValues::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: impl Into<Criteria>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn with_body(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.body.insert(name.into(), value.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.values.upload_file.insert(name.into(), path.into());
        self
    }

    /// The strategy this entry runs with, checked against its operation.
    pub fn resolve_strategy(&self) -> StrategyResult<Strategy> {
        let strategy = match &self.strategy {
            None => Strategy::SingleConstant,
            Some(Criteria::Strategy(strategy)) => strategy.clone(),
            Some(Criteria::Literal(criteria)) => Strategy::ExactMatch {
                criteria: criteria.clone(),
                unique: false,
            },
        };
        strategy.check_operation_acceptable(self.operation)?;
        Ok(strategy)
    }
}

/// Parse an entries document: an array of entries or a single entry.
pub fn parse_entries(text: &str) -> serde_json::Result<Vec<EditEntry>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Document {
        Many(Vec<EditEntry>),
        One(Box<EditEntry>),
    }

    Ok(match serde_json::from_str(text)? {
        Document::Many(entries) => entries,
        Document::One(entry) => vec![*entry],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrategyError;

    #[test]
    fn test_missing_strategy_is_single_constant() {
        let entry = EditEntry::new(OperationKind::Create).with_body("host", "web");
        assert_eq!(entry.resolve_strategy().unwrap(), Strategy::SingleConstant);

        let entry = EditEntry::new(OperationKind::Update);
        assert!(matches!(
            entry.resolve_strategy(),
            Err(StrategyError::IllegalOperation { strategy: "single_constant", .. })
        ));
    }

    #[test]
    fn test_literal_criteria_is_exact_match() {
        let entries = parse_entries(
            r#"{"operation": "廃止", "strategy": {"host": "srv-01", "ip": "10.0.0.1"}}"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 1);
        let strategy = entries[0].resolve_strategy().unwrap();
        match strategy {
            Strategy::ExactMatch { criteria, unique } => {
                assert_eq!(criteria.len(), 2);
                assert_eq!(criteria["host"], "srv-01");
                assert!(!unique);
            }
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_tagged_strategies() {
        let entries = parse_entries(
            r#"[
                {"operation": "create", "strategy": {"type": "sequence", "values": [1, 2]},
                 "body": {"host": "host-{sequence:0>2d}"}, "file": {"key": "k{sequence}.pem"}},
                {"operation": "reinstate", "strategy": {"type": "exact_match", "criteria": {"host": "a"}, "unique": true}}
            ]"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].values.upload_file["key"], "k{sequence}.pem");
        assert_eq!(entries[0].resolve_strategy().unwrap().name(), "sequence");
        assert_eq!(
            entries[1].resolve_strategy().unwrap(),
            Strategy::ExactMatch {
                criteria: BTreeMap::from([("host".to_string(), "a".to_string())]),
                unique: true,
            }
        );
    }

    #[test]
    fn test_strategy_operation_mismatch() {
        let entry = EditEntry::new(OperationKind::Create).with_strategy(BTreeMap::from([(
            "host".to_string(),
            "a".to_string(),
        )]));
        assert!(matches!(
            entry.resolve_strategy(),
            Err(StrategyError::IllegalOperation { strategy: "exact_match", .. })
        ));
    }

    #[test]
    fn test_unknown_operation_rejected() {
        assert!(parse_entries(r#"{"operation": "delete"}"#).is_err());
    }
}
