//! Row selection strategies.
//!
//! A strategy decides which candidates an edit entry applies to and how
//! the edited row is built for each one:
//!
//! | Strategy | Operations | Candidates | Field values |
//! |----------|------------|------------|--------------|
//! | `single_constant` | create | one synthetic candidate | literal |
//! | `sequence` | create | one per sequence element | templates with `sequence` |
//! | `exact_match` | update, retire, reinstate | rows equal to the criteria | literal |
//! | `regexp` | update, retire, reinstate | rows matching every pattern | templates with `groups` |

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StrategyError, StrategyResult};
use crate::models::{Indexer, MenuScoped, OperationKind, Row, Table};

use super::entry::FieldValues;
use super::template::{CaptureGroups, Template, TemplateContext};

const REGISTER_OPERATIONS: &[OperationKind] = &[OperationKind::Create];

const SELECTOR_OPERATIONS: &[OperationKind] = &[
    OperationKind::Update,
    OperationKind::Retire,
    OperationKind::Reinstate,
];

/// Selection policy of an edit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    /// Create exactly one row from literal values.
    SingleConstant,

    /// Create one row per element, rendering templates with `sequence`.
    Sequence { values: Vec<Value> },

    /// Select rows whose columns equal every criterion.
    ExactMatch {
        criteria: BTreeMap<String, String>,
        #[serde(default)]
        unique: bool,
    },

    /// Select rows whose columns match every pattern, rendering templates
    /// with the capture groups as `groups`.
    Regexp {
        patterns: BTreeMap<String, String>,
        #[serde(default)]
        unique: bool,
    },
}

/// One unit of work produced by [`Strategy::select_rows`].
#[derive(Debug, Clone)]
pub enum Candidate<'a> {
    /// The single candidate of a constant register.
    Synthetic,
    /// One element of a sequence register.
    Element(&'a Value),
    /// An existing row, with the capture groups of a regexp match.
    Selected {
        row: &'a Row,
        groups: Option<CaptureGroups>,
    },
}

impl Strategy {
    /// Sequence register over an integer range.
    pub fn sequence_range(range: std::ops::Range<i64>) -> Self {
        Strategy::Sequence {
            values: range.map(Value::from).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SingleConstant => "single_constant",
            Strategy::Sequence { .. } => "sequence",
            Strategy::ExactMatch { .. } => "exact_match",
            Strategy::Regexp { .. } => "regexp",
        }
    }

    pub fn allowed_operations(&self) -> &'static [OperationKind] {
        match self {
            Strategy::SingleConstant | Strategy::Sequence { .. } => REGISTER_OPERATIONS,
            Strategy::ExactMatch { .. } | Strategy::Regexp { .. } => SELECTOR_OPERATIONS,
        }
    }

    /// Fails with [`StrategyError::IllegalOperation`] unless `operation` is allowed.
    pub fn check_operation_acceptable(&self, operation: OperationKind) -> StrategyResult<()> {
        if self.allowed_operations().contains(&operation) {
            Ok(())
        } else {
            Err(StrategyError::IllegalOperation {
                strategy: self.name(),
                operation,
            })
        }
    }

    /// Candidates of this strategy, lazily for non-unique selectors.
    ///
    /// Criteria columns and patterns are resolved before iteration starts.
    /// Patterns must match the whole cell value. Selectors without any
    /// column to match are rejected.
    pub fn select_rows<'a>(
        &'a self,
        table: &'a Table,
    ) -> StrategyResult<Box<dyn Iterator<Item = Candidate<'a>> + 'a>> {
        if self.is_empty_selector() {
            return Err(StrategyError::EmptySelector { strategy: self.name() });
        }

        let candidates: Box<dyn Iterator<Item = Candidate<'a>> + 'a> = match self {
            Strategy::SingleConstant => Box::new(std::iter::once(Candidate::Synthetic)),

            Strategy::Sequence { values } => Box::new(values.iter().map(Candidate::Element)),

            Strategy::ExactMatch { criteria, .. } => {
                let criteria = criteria
                    .iter()
                    .map(|(name, expected)| Ok((table.indexer().name_to_position(name)?, expected.as_str())))
                    .collect::<StrategyResult<Vec<_>>>()?;

                Box::new(
                    table
                        .rows()
                        .filter(move |row| {
                            criteria
                                .iter()
                                .all(|(position, expected)| row.body().at(*position) == Some(*expected))
                        })
                        .map(|row| Candidate::Selected { row, groups: None }),
                )
            }

            Strategy::Regexp { patterns, .. } => {
                let patterns = patterns
                    .iter()
                    .map(|(name, pattern)| {
                        let position = table.indexer().name_to_position(name)?;
                        let anchored = format!("^(?:{})$", pattern);
                        let regex = Regex::new(&anchored).map_err(|source| StrategyError::InvalidPattern {
                            column: name.clone(),
                            source,
                        })?;
                        Ok((name.as_str(), position, regex))
                    })
                    .collect::<StrategyResult<Vec<_>>>()?;

                Box::new(table.rows().filter_map(move |row| {
                    let mut groups = CaptureGroups::new();
                    for (name, position, regex) in &patterns {
                        let captures = regex.captures(row.body().at(*position)?)?;
                        let captured = captures
                            .iter()
                            .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                            .collect();
                        groups.insert(name.to_string(), captured);
                    }
                    Some(Candidate::Selected {
                        row,
                        groups: Some(groups),
                    })
                }))
            }
        };

        if !self.requires_unique() {
            return Ok(candidates);
        }

        let selected: Vec<Candidate<'a>> = candidates.collect();
        if selected.is_empty() {
            log::warn!(
                "The {} selector matched no rows of the menu \"{}\"",
                self.name(),
                table.menu_id()
            );
        }
        if selected.len() > 1 {
            return Err(StrategyError::AmbiguousSelection {
                menu_id: table.menu_id().to_string(),
                count: selected.len(),
            });
        }
        Ok(Box::new(selected.into_iter()))
    }

    /// Build the edited row for one candidate.
    ///
    /// Selected rows start from [`Row::clone_for_edit`]; other candidates
    /// start empty. Sequence and regexp strategies render `values` as
    /// templates, the others use them literally.
    pub fn create_edited_row(
        &self,
        candidate: &Candidate<'_>,
        indexer: &Arc<Indexer>,
        operation: OperationKind,
        values: &FieldValues,
    ) -> StrategyResult<Row> {
        let context = match candidate {
            Candidate::Element(value) => Some(TemplateContext::with_sequence((*value).clone())),
            Candidate::Selected {
                groups: Some(groups),
                ..
            } if self.renders_templates() => Some(TemplateContext::with_groups(groups)),
            _ => None,
        };

        let mut row = match candidate {
            Candidate::Selected { row, .. } => row.clone_for_edit(operation)?,
            _ => {
                let mut row = Row::new(indexer.clone());
                row.set_operation(operation)?;
                row
            }
        };

        for (name, value) in &values.body {
            row.body_mut().set(name, resolve(value, context.as_ref())?)?;
        }
        for (name, value) in &values.upload_file {
            row.file_mut().set(name, resolve(value, context.as_ref())?)?;
        }

        Ok(row)
    }

    fn is_empty_selector(&self) -> bool {
        match self {
            Strategy::ExactMatch { criteria, .. } => criteria.is_empty(),
            Strategy::Regexp { patterns, .. } => patterns.is_empty(),
            _ => false,
        }
    }

    fn requires_unique(&self) -> bool {
        matches!(
            self,
            Strategy::ExactMatch { unique: true, .. } | Strategy::Regexp { unique: true, .. }
        )
    }

    fn renders_templates(&self) -> bool {
        matches!(self, Strategy::Sequence { .. } | Strategy::Regexp { .. })
    }
}

fn resolve(value: &str, context: Option<&TemplateContext>) -> StrategyResult<String> {
    match context {
        Some(context) => Ok(Template::parse(value)?.render(context)?),
        None => Ok(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, TemplateError};
    use serde_json::json;

    fn indexer() -> Arc<Indexer> {
        Arc::new(
            Indexer::new(
                "2100000303",
                ["No", "実行処理種別", "host", "ip", "key", "更新用の最終更新日時"],
            )
            .unwrap(),
        )
    }

    fn table() -> Table {
        let response = json!({"resultdata": {"CONTENTS": {"BODY": [
            ["header"],
            ["1", null, "srv-07", "10.0.0.7", null, "T1"],
            ["2", null, "srv-08", "10.0.0.8", null, "T2"],
            ["3", null, "db-01", "10.0.1.1", null, "T3"]
        ]}}});
        Table::from_wire(indexer(), &response).unwrap()
    }

    fn values(body: &[(&str, &str)], files: &[(&str, &str)]) -> FieldValues {
        FieldValues {
            body: body.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            upload_file: files.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    fn build_all(strategy: &Strategy, table: &Table, operation: OperationKind, values: &FieldValues) -> Vec<Row> {
        strategy
            .select_rows(table)
            .unwrap()
            .map(|candidate| {
                strategy
                    .create_edited_row(&candidate, table.shared_indexer(), operation, values)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_operation_acceptance() {
        let register = [Strategy::SingleConstant, Strategy::sequence_range(0..2)];
        let selectors = [
            Strategy::ExactMatch {
                criteria: BTreeMap::new(),
                unique: false,
            },
            Strategy::Regexp {
                patterns: BTreeMap::new(),
                unique: false,
            },
        ];

        for strategy in &register {
            assert!(strategy.check_operation_acceptable(OperationKind::Create).is_ok());
            for op in [OperationKind::Update, OperationKind::Retire, OperationKind::Reinstate] {
                assert!(matches!(
                    strategy.check_operation_acceptable(op),
                    Err(StrategyError::IllegalOperation { .. })
                ));
            }
        }
        for strategy in &selectors {
            assert!(matches!(
                strategy.check_operation_acceptable(OperationKind::Create),
                Err(StrategyError::IllegalOperation { .. })
            ));
            for op in [OperationKind::Update, OperationKind::Retire, OperationKind::Reinstate] {
                assert!(strategy.check_operation_acceptable(op).is_ok());
            }
        }
    }

    #[test]
    fn test_single_constant_yields_one_literal_row() {
        let table = Table::new(indexer());
        let strategy = Strategy::SingleConstant;
        let rows = build_all(
            &strategy,
            &table,
            OperationKind::Create,
            &values(&[("host", "web-{sequence}")], &[("key", "keys/web.pem")]),
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].identity(), None);
        assert_eq!(rows[0].body().get("host").unwrap(), Some("web-{sequence}"));
        assert_eq!(rows[0].body().get("実行処理種別").unwrap(), Some("登録"));
        assert_eq!(rows[0].file().get("key").unwrap(), Some("keys/web.pem"));
    }

    #[test]
    fn test_sequence_renders_each_element() {
        let table = Table::new(indexer());
        let strategy = Strategy::Sequence {
            values: vec![json!(10), json!(11)],
        };
        let rows = build_all(
            &strategy,
            &table,
            OperationKind::Create,
            &values(
                &[("host", "host-{sequence:0>2d}"), ("ip", "192.168.0.{sequence}")],
                &[("key", "keys/private-{sequence:0>2d}.key")],
            ),
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].body().get("host").unwrap(), Some("host-10"));
        assert_eq!(rows[1].body().get("host").unwrap(), Some("host-11"));
        assert_eq!(rows[1].body().get("ip").unwrap(), Some("192.168.0.11"));
        assert_eq!(rows[0].file().get("key").unwrap(), Some("keys/private-10.key"));
    }

    #[test]
    fn test_exact_match_selects_and_clones_for_edit() {
        let table = table();
        let strategy = Strategy::ExactMatch {
            criteria: BTreeMap::from([("host".to_string(), "srv-08".to_string())]),
            unique: false,
        };
        let rows = build_all(&strategy, &table, OperationKind::Update, &values(&[("ip", "10.9.9.9")], &[]));

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.identity(), Some("2"));
        assert_eq!(row.body().get("更新用の最終更新日時").unwrap(), Some("T2"));
        assert_eq!(row.body().get("ip").unwrap(), Some("10.9.9.9"));
        assert_eq!(row.body().get("host").unwrap(), None);
        assert_eq!(row.body().get("実行処理種別").unwrap(), Some("更新"));
    }

    #[test]
    fn test_regexp_exposes_groups() {
        let table = table();
        let strategy = Strategy::Regexp {
            patterns: BTreeMap::from([("host".to_string(), r"srv-(\d+)".to_string())]),
            unique: false,
        };

        let candidates: Vec<_> = strategy.select_rows(&table).unwrap().collect();
        assert_eq!(candidates.len(), 2);
        match &candidates[0] {
            Candidate::Selected { row, groups: Some(groups) } => {
                assert_eq!(row.identity(), Some("1"));
                assert_eq!(groups["host"], vec!["srv-07".to_string(), "07".to_string()]);
            }
            other => panic!("unexpected candidate {:?}", other),
        }

        let rows = build_all(
            &strategy,
            &table,
            OperationKind::Update,
            &values(&[("host", "srv-new-{groups[\"host\"][1]}")], &[]),
        );
        assert_eq!(rows[0].body().get("host").unwrap(), Some("srv-new-07"));
        assert_eq!(rows[1].body().get("host").unwrap(), Some("srv-new-08"));
    }

    #[test]
    fn test_regexp_requires_every_pattern() {
        let table = table();
        let strategy = Strategy::Regexp {
            patterns: BTreeMap::from([
                ("host".to_string(), r"srv-.*".to_string()),
                ("ip".to_string(), r".*\.8".to_string()),
            ]),
            unique: true,
        };
        let rows = build_all(&strategy, &table, OperationKind::Retire, &FieldValues::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].identity(), Some("2"));
        assert_eq!(rows[0].body().get("実行処理種別").unwrap(), Some("廃止"));
    }

    #[test]
    fn test_unique_selector_rejects_many_matches() {
        let table = table();
        let strategy = Strategy::ExactMatch {
            criteria: BTreeMap::from([("key".to_string(), String::new())]),
            unique: true,
        };
        // Rows carry no key value, so nothing matches an empty string.
        assert_eq!(strategy.select_rows(&table).unwrap().count(), 0);

        let strategy = Strategy::Regexp {
            patterns: BTreeMap::from([("host".to_string(), "srv-.*".to_string())]),
            unique: true,
        };
        assert!(matches!(
            strategy.select_rows(&table),
            Err(StrategyError::AmbiguousSelection { count: 2, .. })
        ));

        let shared = Table::from_wire(
            indexer(),
            &json!({"resultdata": {"CONTENTS": {"BODY": [
                ["header"],
                ["1", null, "srv-07", "10.0.0.7", "shared.pem", "T1"],
                ["2", null, "srv-08", "10.0.0.8", "shared.pem", "T2"]
            ]}}}),
        )
        .unwrap();
        let strategy = Strategy::ExactMatch {
            criteria: BTreeMap::from([("key".to_string(), "shared.pem".to_string())]),
            unique: true,
        };
        assert!(matches!(
            strategy.select_rows(&shared),
            Err(StrategyError::AmbiguousSelection { count: 2, .. })
        ));
    }

    #[test]
    fn test_regexp_matches_whole_value() {
        let table = Table::from_wire(
            indexer(),
            &json!({"resultdata": {"CONTENTS": {"BODY": [
                ["header"],
                ["1", null, "test-01-11", "192.168.1.11", null, "T1"],
                ["2", null, "xtest-01-123-backup", "192.168.1.12", null, "T2"],
                ["3", null, "test-01-12", "10.192.168.1.13", null, "T3"]
            ]}}}),
        )
        .unwrap();
        let strategy = Strategy::Regexp {
            patterns: BTreeMap::from([("host".to_string(), "test-01-1(1|2)".to_string())]),
            unique: false,
        };

        let candidates: Vec<_> = strategy.select_rows(&table).unwrap().collect();
        assert_eq!(candidates.len(), 2);
        match &candidates[1] {
            Candidate::Selected { row, groups: Some(groups) } => {
                assert_eq!(row.identity(), Some("3"));
                assert_eq!(groups["host"], vec!["test-01-12".to_string(), "2".to_string()]);
            }
            other => panic!("unexpected candidate {:?}", other),
        }

        let strategy = Strategy::Regexp {
            patterns: BTreeMap::from([("ip".to_string(), r"192\.168\.1\..*".to_string())]),
            unique: false,
        };
        let selected: Vec<_> = strategy
            .select_rows(&table)
            .unwrap()
            .filter_map(|candidate| match candidate {
                Candidate::Selected { row, .. } => row.identity(),
                _ => None,
            })
            .collect();
        assert_eq!(selected, vec!["1", "2"]);
    }

    #[test]
    fn test_empty_selector_rejected() {
        let table = table();
        for strategy in [
            Strategy::ExactMatch {
                criteria: BTreeMap::new(),
                unique: false,
            },
            Strategy::Regexp {
                patterns: BTreeMap::new(),
                unique: false,
            },
        ] {
            assert!(matches!(
                strategy.select_rows(&table),
                Err(StrategyError::EmptySelector { .. })
            ));
        }
    }

    #[test]
    fn test_selector_errors_surface_before_iteration() {
        let table = table();
        let unknown = Strategy::ExactMatch {
            criteria: BTreeMap::from([("hostname".to_string(), "x".to_string())]),
            unique: false,
        };
        assert!(matches!(
            unknown.select_rows(&table),
            Err(StrategyError::Model(ModelError::InvalidColumn { .. }))
        ));

        let bad_pattern = Strategy::Regexp {
            patterns: BTreeMap::from([("host".to_string(), "(".to_string())]),
            unique: false,
        };
        assert!(matches!(
            bad_pattern.select_rows(&table),
            Err(StrategyError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_identity_can_not_be_rewritten() {
        let table = table();
        let strategy = Strategy::ExactMatch {
            criteria: BTreeMap::from([("No".to_string(), "3".to_string())]),
            unique: true,
        };
        let candidate = strategy.select_rows(&table).unwrap().next().unwrap();
        let result = strategy.create_edited_row(
            &candidate,
            table.shared_indexer(),
            OperationKind::Update,
            &values(&[("No", "4")], &[]),
        );
        assert!(matches!(result, Err(StrategyError::Model(ModelError::Immutable { .. }))));
    }

    #[test]
    fn test_template_errors_propagate() {
        let table = Table::new(indexer());
        let strategy = Strategy::sequence_range(1..2);
        let candidate = strategy.select_rows(&table).unwrap().next().unwrap();
        let result = strategy.create_edited_row(
            &candidate,
            table.shared_indexer(),
            OperationKind::Create,
            &values(&[("host", "{groups[\"host\"][1]}")], &[]),
        );
        assert!(matches!(
            result,
            Err(StrategyError::Template(TemplateError::UndefinedVariable(_)))
        ));
    }

    #[test]
    fn test_deserialize_tagged() {
        let strategy: Strategy = serde_json::from_value(json!({
            "type": "regexp",
            "patterns": {"host": "srv-(\\d+)"},
            "unique": true
        }))
        .unwrap();
        assert_eq!(strategy.name(), "regexp");
        assert!(strategy.requires_unique());

        let strategy: Strategy = serde_json::from_value(json!({"type": "sequence", "values": [1, "a"]})).unwrap();
        assert_eq!(strategy, Strategy::Sequence { values: vec![json!(1), json!("a")] });
    }
}
