//! Filter compilation
//!
//! Turns flat client parameters such as `rating[gte]=4` or `genre=jazz` into a
//! typed conjunction of clauses. Operators come from a closed whitelist; field
//! names come from the resource schema; values are parsed by field kind and
//! stay literals all the way down to the bound SQL parameters.

use super::params::QueryParams;
use super::schema::{FieldKind, FieldSpec, ResourceSchema};
use serde::Serialize;
use std::fmt;

/// Comparison operators a client may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl Operator {
    /// Whitelisted `field[op]` suffixes. Anything else is not an operator.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gte" => Some(Operator::Gte),
            "gt" => Some(Operator::Gt),
            "lte" => Some(Operator::Lte),
            "lt" => Some(Operator::Lt),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gte => ">=",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Lt => "<",
        }
    }
}

/// A literal operand
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

/// `field <op> value`; several values under `Eq` mean "any of"
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: FieldSpec,
    pub op: Operator,
    pub values: Vec<FilterValue>,
}

impl Clause {
    pub fn eq(field: FieldSpec, value: impl Into<FilterValue>) -> Self {
        Self {
            field,
            op: Operator::Eq,
            values: vec![value.into()],
        }
    }

    pub fn compare(field: FieldSpec, op: Operator, value: impl Into<FilterValue>) -> Self {
        Self {
            field,
            op,
            values: vec![value.into()],
        }
    }
}

/// A conjunction of clauses. Empty matches everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    pub clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn constrains(&self, field: &FieldSpec) -> bool {
        self.clauses.iter().any(|c| c.field.name == field.name)
    }

    /// Caller scoping first; client clauses on a scoped field are dropped so
    /// user input can never widen or replace the scope.
    #[must_use]
    pub fn merged_under(self, base: &Filter) -> Filter {
        let mut clauses = base.clauses.clone();
        clauses.extend(
            self.clauses
                .into_iter()
                .filter(|clause| !base.constrains(&clause.field)),
        );
        Filter { clauses }
    }
}

/// Why a parameter was left out of the compiled filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterRejection {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

/// Result of compiling client parameters
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    pub filter: Filter,
    /// Malformed parameters; each was dropped without affecting the others
    pub rejections: Vec<FilterRejection>,
    /// Parameters naming fields outside the schema
    pub ignored: Vec<String>,
}

/// Split `field[op]` into `("field", Some("op"))`
pub fn split_key(key: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = key.strip_suffix(']') {
        if let Some((field, suffix)) = stripped.split_once('[') {
            return (field, Some(suffix));
        }
    }
    (key, None)
}

/// Compile every non-reserved parameter against the schema
pub fn compile(schema: &ResourceSchema, params: &QueryParams) -> CompiledFilter {
    let mut compiled = CompiledFilter::default();

    for (key, values) in params.filter_entries() {
        let (name, suffix) = split_key(key);

        let Some(field) = schema.public_field(name) else {
            compiled.ignored.push(key.to_string());
            continue;
        };

        // Unknown suffixes (ne, regex, where, ...) are never operators
        let op = suffix.and_then(Operator::from_suffix).unwrap_or(Operator::Eq);
        if let Some(suffix) = suffix {
            if op == Operator::Eq {
                tracing::debug!(key, suffix, "unrecognized filter operator, using equality");
            }
        }

        match compile_values(field, op, values) {
            Ok(clauses) => compiled.filter.clauses.extend(clauses),
            Err(reason) => compiled.rejections.push(FilterRejection {
                key: key.to_string(),
                reason,
            }),
        }
    }

    compiled
}

fn compile_values(
    field: FieldSpec,
    op: Operator,
    raw: &[String],
) -> std::result::Result<Vec<Clause>, String> {
    if op != Operator::Eq && matches!(field.kind, FieldKind::Id | FieldKind::List) {
        return Err(format!("'{}' only supports equality", field.name));
    }

    let values = raw
        .iter()
        .map(|value| parse_value(field.kind, value))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if values.is_empty() {
        return Ok(Vec::new());
    }

    Ok(if op == Operator::Eq {
        vec![Clause { field, op, values }]
    } else {
        values
            .into_iter()
            .map(|value| Clause::compare(field, op, value))
            .collect()
    })
}

fn parse_value(kind: FieldKind, raw: &str) -> std::result::Result<FilterValue, String> {
    match kind {
        FieldKind::Id | FieldKind::Text | FieldKind::Timestamp | FieldKind::List => {
            Ok(FilterValue::Text(raw.to_string()))
        }
        FieldKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FilterValue::Number)
            .ok_or_else(|| format!("'{raw}' is not a number")),
        FieldKind::Bool => match raw.trim() {
            "true" | "1" => Ok(FilterValue::Bool(true)),
            "false" | "0" => Ok(FilterValue::Bool(false)),
            _ => Err(format!("'{raw}' is not a boolean")),
        },
    }
}
