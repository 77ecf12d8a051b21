//! Shared test utilities for planner tests.
//!
//! Provides a scripted [`CompletionService`] that replays canned replies and
//! records every request it receives, plus a few plan fixtures.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use planner_core::llm::{CompletionService, LlmError, StructuredRequest};

/// The exact plan JSON used by the "Launch a blog" scenario.
pub const LAUNCH_A_BLOG_PLAN: &str = r#"{"tasks":[{"id":"1","title":"Pick a platform","dueDate":"2024-06-01","priority":"high","notes":"Compare options","emoji":"📝"}]}"#;

/// A plan with four tasks, the lower bound the prompt asks for.
pub fn four_task_plan() -> String {
    let tasks: Vec<serde_json::Value> = (1..=4)
        .map(|i: usize| {
            let priority = ["low", "medium", "high", "low"][i - 1];
            serde_json::json!({
                "id": i.to_string(),
                "title": format!("Step {i}"),
                "dueDate": format!("2024-06-0{i}"),
                "priority": priority,
                "notes": "",
                "emoji": "✅",
            })
        })
        .collect();
    serde_json::json!({ "tasks": tasks }).to_string()
}

/// One canned reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return this text as the model output.
    Text(String),
    /// Fail as if the service answered with this status.
    ApiError { status: u16, message: String },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }
}

/// Completion service double that replays [`Reply`] values in order.
///
/// Running out of replies is reported as a 500 API error so that a test
/// making more calls than it scripted fails loudly.
#[derive(Debug, Default)]
pub struct ScriptedCompletionService {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<StructuredRequest>>,
}

impl ScriptedCompletionService {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Service that answers every call (up to one) with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new([Reply::text(text)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<StructuredRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletionService {
    async fn complete(&self, request: &StructuredRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        debug!(?reply, "ScriptedCompletionService::complete");
        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::ApiError { status, message }) => Err(LlmError::Api { status, message }),
            None => Err(LlmError::Api {
                status: 500,
                message: "no scripted reply left".to_string(),
            }),
        }
    }
}
