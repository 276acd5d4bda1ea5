//! Predicates and orderings understood by the content API
//!
//! Predicates render to the API's query syntax, for example
//! `[at(document.type, "posts")]`. A list of predicates is sent as a
//! single `q` parameter wrapped in an outer pair of brackets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicate operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateOp {
    /// Field equals the value
    At,
    /// Field equals one of the values
    Any,
    /// Field differs from the value
    Not,
}

impl PredicateOp {
    fn name(self) -> &'static str {
        match self {
            PredicateOp::At => "at",
            PredicateOp::Any => "any",
            PredicateOp::Not => "not",
        }
    }
}

/// A single filter on a document field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub op: PredicateOp,
    pub path: String,
    pub values: Vec<String>,
}

impl Predicate {
    /// `[at(path, "value")]`
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: PredicateOp::At,
            path: path.into(),
            values: vec![value.into()],
        }
    }

    /// `[any(path, ["a", "b"])]`
    pub fn any<I, S>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            op: PredicateOp::Any,
            path: path.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `[not(path, "value")]`
    pub fn not(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: PredicateOp::Not,
            path: path.into(),
            values: vec![value.into()],
        }
    }

    /// Check a field value against this predicate
    pub fn matches(&self, field: Option<&str>) -> bool {
        match self.op {
            PredicateOp::At => field.is_some_and(|f| self.values.iter().any(|v| v == f)),
            PredicateOp::Any => field.is_some_and(|f| self.values.iter().any(|v| v == f)),
            PredicateOp::Not => field.map_or(true, |f| self.values.iter().all(|v| v != f)),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.values.iter().map(|v| quote(v)).collect();
        match self.op {
            PredicateOp::Any => write!(
                f,
                "[{}({}, [{}])]",
                self.op.name(),
                self.path,
                quoted.join(", ")
            ),
            _ => write!(
                f,
                "[{}({}, {})]",
                self.op.name(),
                self.path,
                quoted.first().map(String::as_str).unwrap_or("\"\"")
            ),
        }
    }
}

/// Render a list of predicates as the `q` parameter
pub fn render_predicates(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{}]", inner)
}

/// Result ordering on a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Render orderings as the `orderings` parameter, e.g. `[my.posts.date desc]`
pub fn render_orderings(orderings: &[Ordering]) -> String {
    let parts: Vec<String> = orderings
        .iter()
        .map(|o| {
            if o.descending {
                format!("{} desc", o.field)
            } else {
                o.field.clone()
            }
        })
        .collect();
    format!("[{}]", parts.join(","))
}

fn quote(value: &str) -> String {
    // JSON string escaping matches the API's literal syntax
    serde_json::Value::String(value.to_string()).to_string()
}
