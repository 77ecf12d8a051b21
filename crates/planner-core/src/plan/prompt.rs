//! Prompt construction for plan generation.
//!
//! Pure string building; no I/O.

use crate::horizon::Horizon;

/// Fixed system-level instruction sent with every request.
pub const SYSTEM_INSTRUCTIONS: &str = "You are a helpful planning assistant. Return only JSON.";

/// Build the single user-role message for a goal and horizon.
///
/// The goal is interpolated verbatim inside double quotes.
pub fn build_user_message(goal: &str, horizon: Horizon) -> String {
    format!(
        "Create a task plan for \"{goal}\", spread until {}. Keep 4\u{2013}10 tasks.",
        horizon.deadline_text()
    )
}
