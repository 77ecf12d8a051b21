//! The `CompletionService` trait -- the seam between the plan service and
//! whichever text-generation backend is in use.

use async_trait::async_trait;
use serde_json::Value;

use super::LlmError;

/// A single schema-constrained generation request.
///
/// Every request is independent: one system instruction, one user message,
/// no prior conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    /// System-level instruction.
    pub instructions: String,
    /// The one user-role message.
    pub user_message: String,
    /// Name the schema is registered under with the service.
    pub schema_name: String,
    /// JSON schema the output must conform to.
    pub schema: Value,
    /// Ask the service to enforce the schema strictly.
    pub strict: bool,
}

/// Stateless structured-output generation.
///
/// Implementations are constructed once at startup and shared across
/// concurrent requests, so they must be `Send + Sync` and must not hold
/// per-request mutable state.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Run one generation and return the raw output text.
    ///
    /// The text is returned as produced; decoding it is the caller's job.
    async fn complete(&self, request: &StructuredRequest) -> Result<String, LlmError>;
}

// Compile-time assertion: CompletionService must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn CompletionService) {}
};
