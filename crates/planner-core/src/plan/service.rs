//! Plan service: validate input, build the prompt, call the completion
//! service once, decode the output.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::check::check_task_plan;
use super::prompt::{SYSTEM_INSTRUCTIONS, build_user_message};
use super::schema::{SCHEMA_NAME, task_plan_schema};
use crate::horizon::{Horizon, HorizonParseError};
use crate::llm::{CompletionService, LlmError, StructuredRequest};

/// Behaviour switches for [`create_plan`]. Both default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    /// Reject horizons other than `"today"` and `"week"` instead of treating
    /// them as the week bucket.
    pub strict_horizon: bool,
    /// Re-check decoded output against the schema before returning it.
    pub validate_output: bool,
}

/// Errors that can occur while producing a plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("goal and horizon required")]
    MissingInput,

    #[error("horizon must be \"today\" or \"week\"")]
    InvalidHorizon(#[source] HorizonParseError),

    /// The service answered, but its text is not JSON.
    #[error("Model returned invalid JSON")]
    InvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// Decoded output does not conform to the schema (only with
    /// [`PlanOptions::validate_output`]).
    #[error("Model output did not match task plan schema: {reason}")]
    SchemaViolation { raw: String, reason: String },

    #[error(transparent)]
    Upstream(#[from] LlmError),
}

impl PlanError {
    /// Raw model text, for failures where the model produced unusable output.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::InvalidJson { raw, .. } | Self::SchemaViolation { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether the caller supplied bad input (no upstream call was made).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingInput | Self::InvalidHorizon(_))
    }

    /// Whether the upstream service returned content that could not be used.
    pub fn is_bad_upstream_content(&self) -> bool {
        matches!(self, Self::InvalidJson { .. } | Self::SchemaViolation { .. })
    }
}

/// Validate the two inputs and resolve the horizon bucket.
///
/// Absent means `None` or empty. With `strict_horizon` unset, any present
/// horizon other than `"today"` maps to [`Horizon::Week`].
pub fn resolve_input<'a>(
    goal: Option<&'a str>,
    horizon: Option<&str>,
    options: &PlanOptions,
) -> Result<(&'a str, Horizon), PlanError> {
    let goal = goal.filter(|g| !g.is_empty());
    let horizon = horizon.filter(|h| !h.is_empty());
    let (Some(goal), Some(horizon)) = (goal, horizon) else {
        return Err(PlanError::MissingInput);
    };

    let horizon = if options.strict_horizon {
        horizon.parse().map_err(PlanError::InvalidHorizon)?
    } else {
        Horizon::from_selector(horizon)
    };
    Ok((goal, horizon))
}

/// Build the structured generation request for a validated goal and horizon.
pub fn build_request(goal: &str, horizon: Horizon) -> StructuredRequest {
    StructuredRequest {
        instructions: SYSTEM_INSTRUCTIONS.to_owned(),
        user_message: build_user_message(goal, horizon),
        schema_name: SCHEMA_NAME.to_owned(),
        schema: task_plan_schema(),
        strict: true,
    }
}

/// Decode raw model text.
///
/// Without `validate_output` the decoded value is returned whatever its
/// shape; the service's strict mode is trusted for structure.
pub fn decode_output(raw: String, options: &PlanOptions) -> Result<Value, PlanError> {
    let value: Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(source) => {
            warn!(raw_len = raw.len(), error = %source, "decode_output: model returned invalid JSON");
            return Err(PlanError::InvalidJson { raw, source });
        }
    };

    if options.validate_output {
        if let Err(reason) = check_task_plan(&value) {
            warn!(%reason, "decode_output: model output failed schema check");
            return Err(PlanError::SchemaViolation { raw, reason });
        }
    }

    Ok(value)
}

/// Generate a task plan for `goal` spanning `horizon`.
///
/// Makes exactly one call to `service` unless the inputs are rejected, in
/// which case no call is made. Two identical calls may return different
/// plans.
pub async fn create_plan(
    service: &dyn CompletionService,
    options: &PlanOptions,
    goal: Option<&str>,
    horizon: Option<&str>,
) -> Result<Value, PlanError> {
    let (goal, horizon) = resolve_input(goal, horizon, options)?;
    debug!(%horizon, goal_len = goal.len(), "create_plan: input accepted");

    let request = build_request(goal, horizon);
    let raw = service.complete(&request).await?;
    debug!(raw_len = raw.len(), "create_plan: completion received");

    decode_output(raw, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRICT: PlanOptions = PlanOptions {
        strict_horizon: true,
        validate_output: false,
    };

    #[test]
    fn missing_goal_or_horizon_is_rejected() {
        let opts = PlanOptions::default();
        for (goal, horizon) in [
            (None, Some("today")),
            (Some("x"), None),
            (None, None),
            (Some(""), Some("today")),
            (Some("x"), Some("")),
        ] {
            let err = resolve_input(goal, horizon, &opts).unwrap_err();
            assert!(matches!(err, PlanError::MissingInput), "{goal:?}/{horizon:?}");
            assert_eq!(err.to_string(), "goal and horizon required");
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn permissive_horizon_falls_back_to_week() {
        let (_, h) = resolve_input(Some("x"), Some("fortnight"), &PlanOptions::default()).unwrap();
        assert_eq!(h, Horizon::Week);
    }

    #[test]
    fn strict_horizon_rejects_unknown_values() {
        let err = resolve_input(Some("x"), Some("fortnight"), &STRICT).unwrap_err();
        assert!(matches!(err, PlanError::InvalidHorizon(_)));
        assert!(err.is_client_error());

        let (_, h) = resolve_input(Some("x"), Some("week"), &STRICT).unwrap();
        assert_eq!(h, Horizon::Week);
    }

    #[test]
    fn build_request_uses_fixed_instruction_and_strict_schema() {
        let req = build_request("Launch a blog", Horizon::Today);
        assert_eq!(req.instructions, "You are a helpful planning assistant. Return only JSON.");
        assert!(req.user_message.contains("\"Launch a blog\""));
        assert!(req.user_message.contains("end of today"));
        assert_eq!(req.schema_name, "task_plan");
        assert_eq!(req.schema, task_plan_schema());
        assert!(req.strict);
    }

    #[test]
    fn decode_output_passes_json_through_untouched() {
        let raw = r#"{"tasks":[],"unexpected":42}"#.to_string();
        let value = decode_output(raw, &PlanOptions::default()).unwrap();
        assert_eq!(value, serde_json::json!({ "tasks": [], "unexpected": 42 }));
    }

    #[test]
    fn decode_output_keeps_raw_text_on_invalid_json() {
        let err = decode_output("not json".to_string(), &PlanOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Model returned invalid JSON");
        assert_eq!(err.raw(), Some("not json"));
        assert!(err.is_bad_upstream_content());
    }

    #[test]
    fn decode_output_rejects_empty_text() {
        let err = decode_output(String::new(), &PlanOptions::default()).unwrap_err();
        assert_eq!(err.raw(), Some(""));
    }

    #[test]
    fn validate_output_flags_schema_violations() {
        let opts = PlanOptions {
            strict_horizon: false,
            validate_output: true,
        };
        let raw = r#"{"tasks":[],"unexpected":42}"#.to_string();
        let err = decode_output(raw.clone(), &opts).unwrap_err();
        assert!(matches!(err, PlanError::SchemaViolation { .. }));
        assert_eq!(err.raw(), Some(raw.as_str()));
        assert!(
            err.to_string()
                .starts_with("Model output did not match task plan schema")
        );
    }

    #[test]
    fn upstream_errors_carry_no_raw_text() {
        let err = PlanError::from(LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(err.raw(), None);
        assert!(!err.is_client_error());
        assert!(!err.is_bad_upstream_content());
        assert_eq!(err.to_string(), "500 boom");
    }
}
