//! Template substitution for edited field values.
//!
//! A template is literal text with placeholders:
//!
//! ```text
//! host-{sequence:0>2d}            sequence element, zero padded to width 2
//! srv-new-{groups["host"][1]}     capture group 1 of the "host" column
//! {{literal braces}}              "{literal braces}"
//! ```
//!
//! A placeholder is a variable name followed by `["key"]` / `[index]`
//! accessors and an optional `:spec` format directive
//! (`[[fill]align][0][width][.precision][type]`, type one of `d s x X o b f`).
//! Nothing else is evaluated.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{TemplateError, TemplateResult};

/// Capture groups per column: index 0 is the whole match.
pub type CaptureGroups = BTreeMap<String, Vec<String>>;

/// Variables visible to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: Map<String, Value>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context exposing one sequence element as `sequence`.
    pub fn with_sequence(value: Value) -> Self {
        let mut context = Self::new();
        context.insert("sequence", value);
        context
    }

    /// Context exposing capture groups as `groups`.
    pub fn with_groups(groups: &CaptureGroups) -> Self {
        let groups = groups
            .iter()
            .map(|(column, captures)| {
                let captures = captures.iter().cloned().map(Value::String).collect();
                (column.clone(), Value::Array(captures))
            })
            .collect();

        let mut context = Self::new();
        context.insert("groups", Value::Object(groups));
        context
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// Parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq)]
struct Placeholder {
    expression: String,
    variable: String,
    accessors: Vec<Accessor>,
    spec: FormatSpec,
}

#[derive(Debug, Clone, PartialEq)]
enum Accessor {
    Key(String),
    Index(usize),
}

impl Template {
    pub fn parse(source: &str) -> TemplateResult<Self> {
        let syntax = |message: &str| TemplateError::Syntax {
            template: source.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(syntax("single '}' outside a placeholder")),
                '{' => {
                    let mut body = String::new();
                    let mut quote = None;
                    let mut closed = false;
                    for c in chars.by_ref() {
                        match (quote, c) {
                            (None, '}') => {
                                closed = true;
                                break;
                            }
                            (None, '"' | '\'') => quote = Some(c),
                            (Some(q), _) if q == c => quote = None,
                            _ => {}
                        }
                        body.push(c);
                    }
                    if !closed {
                        return Err(syntax("unterminated placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(parse_placeholder(&body, &syntax)?));
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// True when the template has no placeholders.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    pub fn render(&self, context: &TemplateContext) -> TemplateResult<String> {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Placeholder(placeholder) => {
                    let value = placeholder.resolve(context)?;
                    output.push_str(&placeholder.spec.apply(value)?);
                }
            }
        }
        Ok(output)
    }
}

/// Parse and render in one step.
pub fn render(source: &str, context: &TemplateContext) -> TemplateResult<String> {
    Template::parse(source)?.render(context)
}

fn parse_placeholder(body: &str, syntax: &dyn Fn(&str) -> TemplateError) -> TemplateResult<Placeholder> {
    let (expression, spec) = split_spec(body);
    let expression = expression.trim();
    let chars: Vec<char> = expression.chars().collect();

    let mut pos = 0;
    while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
        pos += 1;
    }
    if pos == 0 || chars[0].is_ascii_digit() {
        return Err(syntax(&format!("placeholder \"{}\" must start with a variable name", expression)));
    }
    let variable: String = chars[..pos].iter().collect();

    let mut accessors = Vec::new();
    while pos < chars.len() {
        if chars[pos] != '[' {
            return Err(syntax(&format!("unexpected '{}' in \"{}\"", chars[pos], expression)));
        }
        let close = chars[pos..]
            .iter()
            .position(|&c| c == ']')
            .map(|offset| pos + offset)
            .ok_or_else(|| syntax(&format!("unclosed '[' in \"{}\"", expression)))?;
        let inner: String = chars[pos + 1..close].iter().collect();
        accessors.push(parse_accessor(inner.trim(), expression).map_err(|m| syntax(&m))?);
        pos = close + 1;
    }

    Ok(Placeholder {
        expression: expression.to_string(),
        variable,
        accessors,
        spec: FormatSpec::parse(spec.unwrap_or(""))?,
    })
}

/// Split `expression:spec` at the first colon outside quotes and brackets.
fn split_spec(body: &str) -> (&str, Option<&str>) {
    let mut quote = None;
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), _) if q == c => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ':') if depth == 0 => return (&body[..i], Some(&body[i + 1..])),
            _ => {}
        }
    }
    (body, None)
}

fn parse_accessor(inner: &str, expression: &str) -> Result<Accessor, String> {
    let quoted = |q: char| inner.len() >= 2 && inner.starts_with(q) && inner.ends_with(q);
    if quoted('"') || quoted('\'') {
        return Ok(Accessor::Key(inner[1..inner.len() - 1].to_string()));
    }
    inner
        .parse::<usize>()
        .map(Accessor::Index)
        .map_err(|_| format!("invalid accessor [{}] in \"{}\"", inner, expression))
}

impl Placeholder {
    fn resolve<'a>(&self, context: &'a TemplateContext) -> TemplateResult<&'a Value> {
        let mut value = context
            .get(&self.variable)
            .ok_or_else(|| TemplateError::UndefinedVariable(self.variable.clone()))?;

        for accessor in &self.accessors {
            let next = match (accessor, value) {
                (Accessor::Key(key), Value::Object(map)) => map.get(key),
                (Accessor::Index(index), Value::Array(items)) => items.get(*index),
                _ => None,
            };
            value = next.ok_or_else(|| TemplateError::UndefinedIndex {
                expression: self.expression.clone(),
            })?;
        }

        match value {
            Value::Array(_) | Value::Object(_) | Value::Null => Err(TemplateError::NotScalar {
                expression: self.expression.clone(),
            }),
            scalar => Ok(scalar),
        }
    }
}

// =============================================================================
// Format Directives
// =============================================================================

/// Upper bound for format widths and precisions.
const MAX_WIDTH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatType {
    Default,
    Decimal,
    Str,
    Hex,
    HexUpper,
    Octal,
    Binary,
    Fixed,
}

#[derive(Debug, Clone, PartialEq)]
struct FormatSpec {
    source: String,
    fill: char,
    align: Option<Align>,
    zero: bool,
    width: usize,
    precision: Option<usize>,
    kind: FormatType,
}

impl FormatSpec {
    fn parse(source: &str) -> TemplateResult<Self> {
        let bad = |message: String| TemplateError::BadFormat {
            spec: source.to_string(),
            message,
        };
        let chars: Vec<char> = source.chars().collect();
        let align_of = |c: char| match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            _ => None,
        };

        let mut spec = FormatSpec {
            source: source.to_string(),
            fill: ' ',
            align: None,
            zero: false,
            width: 0,
            precision: None,
            kind: FormatType::Default,
        };

        let mut pos = 0;
        if chars.len() >= 2 && align_of(chars[1]).is_some() {
            spec.fill = chars[0];
            spec.align = align_of(chars[1]);
            pos = 2;
        } else if let Some(align) = chars.first().and_then(|&c| align_of(c)) {
            spec.align = Some(align);
            pos = 1;
        }

        if chars.get(pos) == Some(&'0') {
            spec.zero = true;
            pos += 1;
        }

        let start = pos;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos > start {
            let digits: String = chars[start..pos].iter().collect();
            spec.width = bounded(&digits).ok_or_else(|| bad(format!("width must be at most {}", MAX_WIDTH)))?;
        }

        if chars.get(pos) == Some(&'.') {
            pos += 1;
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            let digits: String = chars[start..pos].iter().collect();
            if digits.is_empty() {
                return Err(bad("missing precision after '.'".to_string()));
            }
            spec.precision =
                Some(bounded(&digits).ok_or_else(|| bad(format!("precision must be at most {}", MAX_WIDTH)))?);
        }

        if let Some(&c) = chars.get(pos) {
            spec.kind = match c {
                'd' => FormatType::Decimal,
                's' => FormatType::Str,
                'x' => FormatType::Hex,
                'X' => FormatType::HexUpper,
                'o' => FormatType::Octal,
                'b' => FormatType::Binary,
                'f' => FormatType::Fixed,
                other => return Err(bad(format!("unknown format type '{}'", other))),
            };
            pos += 1;
        }

        if pos != chars.len() {
            return Err(bad("trailing characters".to_string()));
        }
        Ok(spec)
    }

    fn apply(&self, value: &Value) -> TemplateResult<String> {
        let (text, numeric) = match self.kind {
            FormatType::Default => match value {
                Value::Number(n) => (n.to_string(), true),
                other => (scalar_string(other), false),
            },
            FormatType::Str => (scalar_string(value), false),
            FormatType::Decimal => (self.integer(value)?.to_string(), true),
            FormatType::Hex => (radix(self.integer(value)?, |n| format!("{:x}", n)), true),
            FormatType::HexUpper => (radix(self.integer(value)?, |n| format!("{:X}", n)), true),
            FormatType::Octal => (radix(self.integer(value)?, |n| format!("{:o}", n)), true),
            FormatType::Binary => (radix(self.integer(value)?, |n| format!("{:b}", n)), true),
            FormatType::Fixed => {
                let number = self.float(value)?;
                (format!("{:.*}", self.precision.unwrap_or(6), number), true)
            }
        };

        Ok(self.pad(text, numeric))
    }

    fn pad(&self, text: String, numeric: bool) -> String {
        let length = text.chars().count();
        if length >= self.width {
            return text;
        }
        let missing = self.width - length;

        // The '0' flag without explicit alignment pads numbers after the sign.
        if self.zero && self.align.is_none() && numeric {
            let (sign, digits) = match text.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", text.as_str()),
            };
            return format!("{}{}{}", sign, "0".repeat(missing), digits);
        }

        let fill = if self.zero && self.align.is_none() { '0' } else { self.fill };
        let align = self
            .align
            .unwrap_or(if numeric { Align::Right } else { Align::Left });
        let repeat = |n: usize| fill.to_string().repeat(n);

        match align {
            Align::Left => format!("{}{}", text, repeat(missing)),
            Align::Right => format!("{}{}", repeat(missing), text),
            Align::Center => format!("{}{}{}", repeat(missing / 2), text, repeat(missing - missing / 2)),
        }
    }

    fn integer(&self, value: &Value) -> TemplateResult<i64> {
        let parsed = match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| TemplateError::BadFormat {
            spec: self.source.clone(),
            message: format!("{} is not an integer", value),
        })
    }

    fn float(&self, value: &Value) -> TemplateResult<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| TemplateError::BadFormat {
            spec: self.source.clone(),
            message: format!("{} is not a number", value),
        })
    }
}

/// Width or precision, if it does not exceed [`MAX_WIDTH`].
fn bounded(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok().filter(|n| *n <= MAX_WIDTH)
}

fn radix(number: i64, format: impl Fn(u64) -> String) -> String {
    if number < 0 {
        format!("-{}", format(number.unsigned_abs()))
    } else {
        format(number as u64)
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn groups(column: &str, captures: &[&str]) -> TemplateContext {
        let mut groups = CaptureGroups::new();
        groups.insert(column.to_string(), captures.iter().map(|s| s.to_string()).collect());
        TemplateContext::with_groups(&groups)
    }

    #[test]
    fn test_sequence_zero_padding() {
        let template = Template::parse("host-{sequence:0>2d}").unwrap();
        assert_eq!(template.render(&TemplateContext::with_sequence(json!(10))).unwrap(), "host-10");
        assert_eq!(template.render(&TemplateContext::with_sequence(json!(7))).unwrap(), "host-07");
    }

    #[test]
    fn test_plain_sequence() {
        let context = TemplateContext::with_sequence(json!(12));
        assert_eq!(render("192.168.0.{sequence:d}", &context).unwrap(), "192.168.0.12");
        assert_eq!(render("{sequence}", &context).unwrap(), "12");
        assert_eq!(render("{sequence:04}", &context).unwrap(), "0012");
    }

    #[test]
    fn test_capture_groups() {
        let context = groups("host", &["srv-07", "07"]);
        assert_eq!(render("srv-new-{groups[\"host\"][1]}", &context).unwrap(), "srv-new-07");
        assert_eq!(render("{groups['host'][0]}", &context).unwrap(), "srv-07");
        assert_eq!(render("n{groups[\"host\"][1]:0>4d}", &context).unwrap(), "n0007");
    }

    #[test]
    fn test_escaped_braces() {
        let context = TemplateContext::with_sequence(json!("a"));
        assert_eq!(render("{{x}}-{sequence}", &context).unwrap(), "{x}-a");
        assert!(Template::parse("{{only literal}}").unwrap().is_literal());
    }

    #[test]
    fn test_alignment_and_radix() {
        let context = TemplateContext::with_sequence(json!(255));
        assert_eq!(render("{sequence:x}", &context).unwrap(), "ff");
        assert_eq!(render("{sequence:#^7X}", &context).unwrap(), "##FF###");
        assert_eq!(render("{sequence:b}", &context).unwrap(), "11111111");

        let context = TemplateContext::with_sequence(json!("ab"));
        assert_eq!(render("[{sequence:5}]", &context).unwrap(), "[ab   ]");
        assert_eq!(render("[{sequence:>5s}]", &context).unwrap(), "[   ab]");

        let context = TemplateContext::with_sequence(json!(-3));
        assert_eq!(render("{sequence:04d}", &context).unwrap(), "-003");

        let context = TemplateContext::with_sequence(json!(1.5));
        assert_eq!(render("{sequence:.2f}", &context).unwrap(), "1.50");
    }

    #[test]
    fn test_undefined_references() {
        let context = groups("host", &["srv-07", "07"]);
        assert!(matches!(
            render("{sequence}", &context),
            Err(TemplateError::UndefinedVariable(name)) if name == "sequence"
        ));
        assert!(matches!(
            render("{groups[\"host\"][2]}", &context),
            Err(TemplateError::UndefinedIndex { .. })
        ));
        assert!(matches!(
            render("{groups[\"ip\"][0]}", &context),
            Err(TemplateError::UndefinedIndex { .. })
        ));
        assert!(matches!(
            render("{groups[\"host\"]}", &context),
            Err(TemplateError::NotScalar { .. })
        ));
    }

    #[test]
    fn test_format_errors() {
        let context = TemplateContext::with_sequence(json!("abc"));
        assert!(matches!(render("{sequence:d}", &context), Err(TemplateError::BadFormat { .. })));
        assert!(matches!(Template::parse("{sequence:q}"), Err(TemplateError::BadFormat { .. })));
        assert!(matches!(Template::parse("{sequence:.f}"), Err(TemplateError::BadFormat { .. })));
    }

    #[test]
    fn test_oversized_width_rejected() {
        for source in [
            "{sequence:18446744073709551615}",
            "{sequence:0>1000000000000d}",
            "{sequence:4097}",
            "{sequence:.5000f}",
        ] {
            assert!(
                matches!(Template::parse(source), Err(TemplateError::BadFormat { .. })),
                "{} should be rejected",
                source
            );
        }

        let context = TemplateContext::with_sequence(json!(1));
        assert_eq!(render("{sequence:4096}", &context).unwrap().len(), 4096);
    }

    #[test]
    fn test_syntax_errors() {
        for source in ["{sequence", "a}b", "{}", "{1abc}", "{x[}", "{x[abc]}", "{x.y}", "{__import__('os')}"] {
            assert!(
                matches!(Template::parse(source), Err(TemplateError::Syntax { .. })),
                "{} should not parse",
                source
            );
        }
    }
}
