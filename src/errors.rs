use std::fmt;

use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

/// The only failure text ever shown to the user for delivery problems.
/// Underlying causes are logged, never surfaced.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to send message. Please try again later.";

#[derive(Debug)]
pub enum PipelineError {
    Validation(Vec<FieldError>),
    RateLimited(String),
    Dispatch(DispatchError),
    Config(String),
    Internal(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Validation(errors) => {
                let messages = errors
                    .iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            PipelineError::RateLimited(msg) => write!(f, "rate limited: {}", msg),
            PipelineError::Dispatch(err) => write!(f, "dispatch error: {}", err),
            PipelineError::Config(msg) => write!(f, "configuration error: {}", msg),
            PipelineError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl PipelineError {
    /// The text the UI layer may render. Internal detail never leaks here:
    /// anything that is not user-correctable collapses to the generic
    /// failure message, except configuration errors, which are deploy-time
    /// defects and surface as-is.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation(_) => "Please correct the highlighted fields.".to_string(),
            PipelineError::RateLimited(msg) => msg.clone(),
            PipelineError::Dispatch(err) => err.to_string(),
            PipelineError::Config(msg) => msg.clone(),
            PipelineError::Internal(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<ValidationErrors> for PipelineError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        PipelineError::Validation(field_errors)
    }
}

impl From<DispatchError> for PipelineError {
    fn from(err: DispatchError) -> Self {
        PipelineError::Dispatch(err)
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Internal(err.to_string())
    }
}

/// Delivery failure, already normalized for the UI. The underlying cause is
/// logged at the construction site and not carried here.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DispatchError {
    #[display("Failed to send message. Please try again later.")]
    SendFailed,
}

/// Anti-bot proof acquisition failure. Swallowed by the orchestrator; the
/// submission proceeds without a proof token.
#[derive(Debug, Display)]
pub enum AntiBotError {
    #[display("Failed to load anti-bot challenge script: {_0}")]
    ScriptLoad(String),

    #[display("Anti-bot token unavailable: {_0}")]
    Token(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
