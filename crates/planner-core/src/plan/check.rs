//! Local structural check of model output against the task-plan schema.
//!
//! Strict-mode generation is expected to guarantee conformance already; this
//! is an optional second pass for backends whose guarantee is weaker.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::Value;

use super::schema::DUE_DATE_PATTERN;
use super::types::TaskPlan;

// ASCII digits only, matching JSON Schema's ECMA-262 `\d`.
static DUE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(DUE_DATE_PATTERN)
        .unicode(false)
        .build()
        .expect("due date pattern is a valid regex")
});

/// Verify that `value` conforms to the task-plan schema.
///
/// Checks required fields, string types, the priority enum, the absence of
/// undeclared properties, and the `dueDate` pattern. Returns a description
/// of the first violation found. Task count is not checked.
pub fn check_task_plan(value: &Value) -> Result<TaskPlan, String> {
    let plan = TaskPlan::deserialize(value).map_err(|e| e.to_string())?;
    for (index, task) in plan.tasks.iter().enumerate() {
        if !DUE_DATE_RE.is_match(&task.due_date) {
            return Err(format!(
                "tasks[{index}].dueDate {:?} does not match YYYY-MM-DD",
                task.due_date
            ));
        }
    }
    Ok(plan)
}
