//! Core of the planner service.
//!
//! Turns a goal and a horizon into a schema-constrained generation request,
//! sends it through a [`llm::CompletionService`], and decodes the result.
//! Nothing here holds state between requests.

pub mod horizon;
pub mod llm;
pub mod plan;

pub use horizon::Horizon;
