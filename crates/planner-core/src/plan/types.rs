//! Typed mirror of the task-plan schema.
//!
//! The HTTP path passes model output through as raw JSON; these types back
//! the optional local check and the CLI's human-readable rendering.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a plan request as received.
///
/// Fields are kept as raw JSON so that absence is judged by truthiness
/// rather than by deserialization failure. Missing, `null`, `false`, `0`,
/// and `""` are absent; every other value is present and is rendered as
/// text the way string interpolation would render it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub goal: Option<Value>,
    #[serde(default)]
    pub horizon: Option<Value>,
}

impl PlanRequest {
    pub fn goal(&self) -> Option<String> {
        present(self.goal.as_ref())
    }

    pub fn horizon(&self) -> Option<String> {
        present(self.horizon.as_ref())
    }
}

fn present(value: Option<&Value>) -> Option<String> {
    value.filter(|v| is_truthy(v)).map(interpolated)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a JSON value inside a template string: numbers without a
/// trailing `.0`, arrays joined by commas with `null` as empty, objects as
/// `[object Object]`.
fn interpolated(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(interpolated)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_owned(),
    }
}

/// Priority tier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

/// A single planned unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    /// Model-assigned identifier. Uniqueness is not enforced.
    pub id: String,
    pub title: String,
    /// `YYYY-MM-DD`, pattern-checked only.
    #[serde(rename = "dueDate")]
    pub due_date: String,
    pub priority: Priority,
    pub notes: String,
    /// Intended to be one glyph; not length-checked.
    pub emoji: String,
}

/// The generated plan: `{ "tasks": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskPlan {
    pub tasks: Vec<Task>,
}
