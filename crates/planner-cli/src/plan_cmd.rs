//! `planner plan`: generate one plan from the command line.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde_json::Value;

use planner_core::llm::OpenAiClient;
use planner_core::plan::{self, TaskPlan, check_task_plan};

use crate::config::PlannerConfig;

/// Generate a plan for `goal` and print it.
///
/// Goes through the same [`plan::create_plan`] path as `POST /plan`. With
/// `json` set the decoded model output is printed as-is; otherwise it is
/// rendered as a task list when it has the expected shape.
pub async fn run_plan(config: PlannerConfig, goal: &str, horizon: &str, json: bool) -> Result<()> {
    let client = OpenAiClient::new(config.openai)?;
    let value = plan::create_plan(&client, &config.plan, Some(goal), Some(horizon))
        .await
        .map_err(|e| match e.raw().map(str::to_owned) {
            Some(raw) => anyhow::anyhow!("{e}\nraw model output:\n{raw}"),
            None => anyhow::Error::new(e),
        })?;

    println!("{}", format_output(&value, json)?);
    Ok(())
}

fn format_output(value: &Value, json: bool) -> Result<String> {
    if !json {
        if let Ok(plan) = check_task_plan(value) {
            return Ok(render_plan(&plan));
        }
    }
    serde_json::to_string_pretty(value).context("failed to serialize plan")
}

/// Render a plan as a numbered, human-readable list.
pub fn render_plan(plan: &TaskPlan) -> String {
    if plan.tasks.is_empty() {
        return "No tasks.".to_string();
    }

    let mut out = String::new();
    for (i, task) in plan.tasks.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {} {}  [{}] due {}",
            i + 1,
            task.emoji,
            task.title,
            task.priority,
            task.due_date
        );
        if !task.notes.is_empty() {
            let _ = writeln!(out, "      {}", task.notes);
        }
    }
    out.truncate(out.trim_end().len());
    out
}
