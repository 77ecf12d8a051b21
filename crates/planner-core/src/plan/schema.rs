//! The task-plan JSON schema handed to the completion service.
//!
//! Every object level sets `additionalProperties: false` and lists all of its
//! properties as required, which strict structured-output mode demands.

use serde_json::{Value, json};

/// Name the schema is registered under in the output-format constraint.
pub const SCHEMA_NAME: &str = "task_plan";

/// Pattern every `dueDate` must match. No calendar validation.
pub const DUE_DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";

/// Allowed `priority` values.
pub const PRIORITIES: [&str; 3] = ["low", "medium", "high"];

/// Required fields of each task object, in declaration order.
pub const TASK_FIELDS: [&str; 6] = ["id", "title", "dueDate", "priority", "notes", "emoji"];

/// Build the task-plan schema.
pub fn task_plan_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["tasks"],
        "properties": {
            "tasks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": TASK_FIELDS,
                    "properties": {
                        "id": { "type": "string" },
                        "title": { "type": "string" },
                        "dueDate": { "type": "string", "pattern": DUE_DATE_PATTERN },
                        "priority": { "type": "string", "enum": PRIORITIES },
                        "notes": { "type": "string" },
                        "emoji": { "type": "string" }
                    }
                }
            }
        }
    })
}
