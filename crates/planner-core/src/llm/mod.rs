//! Completion-service adapters.
//!
//! [`CompletionService`] is the trait the plan service talks to;
//! [`OpenAiClient`] implements it against the OpenAI Responses API.

pub mod client;
mod error;
pub mod openai;

pub use client::{CompletionService, StructuredRequest};
pub use error::LlmError;
pub use openai::{OpenAiClient, OpenAiConfig};
