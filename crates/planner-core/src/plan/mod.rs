//! Plan generation: schema, prompt construction, output checking, service layer.

pub mod check;
pub mod prompt;
pub mod schema;
pub mod service;
pub mod types;

pub use check::check_task_plan;
pub use prompt::{SYSTEM_INSTRUCTIONS, build_user_message};
pub use schema::{SCHEMA_NAME, task_plan_schema};
pub use service::{PlanError, PlanOptions, build_request, create_plan, decode_output, resolve_input};
pub use types::{PlanRequest, Priority, Task, TaskPlan};
