use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Raw field values as captured by the embedding UI. Nothing here has been
/// sanitized yet; the declarative bounds are a coarse first gate under the
/// sanitizer pass.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RawContactForm {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Invalid name. Use letters and spaces only (minimum 3 characters)."
    ))]
    pub name: String,

    #[validate(
        email(message = "Invalid email. Please enter a valid email address."),
        length(max = 255, message = "Invalid email. Please enter a valid email address.")
    )]
    pub email: String,

    pub phone: String,

    #[validate(length(
        min = 10,
        max = 2000,
        message = "Invalid message. It must be between 10 and 2000 characters."
    ))]
    pub message: String,
}

/// Environment facts supplied by the embedding UI alongside the form fields.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub user_agent: String,
    pub referrer: String,
}

/// A submission whose every field has passed sanitization. This is the only
/// shape the dispatch layer accepts; raw user input never crosses into it.
///
/// Wire keys follow the receiving endpoints' expectations.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    pub referrer: String,
    pub recaptcha_token: Option<String>,
}

/// Uniform success shape across every backend variant.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub success: bool,
    pub message: String,
    pub data: serde_json::Value,
}
