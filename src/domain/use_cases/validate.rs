use std::collections::BTreeMap;
use std::sync::Arc;

use validator::Validate;

use crate::domain::entities::contact::{ClientContext, RawContactForm, SanitizedSubmission};
use crate::domain::sanitizer;
use crate::errors::FieldError;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::limiter::rate_limiter::RateLimiter;

/// Synthetic key for the throttling error. Rendered by the UI layer as a
/// form-level message, not attached to any field.
pub const RATE_LIMIT_KEY: &str = "rateLimit";

/// Field-name → human-readable message mapping, rebuilt on every validation
/// pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    errors: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.errors.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn rate_limit_message(&self) -> Option<&str> {
        self.get(RATE_LIMIT_KEY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_field_errors(self) -> Vec<FieldError> {
        self.errors
            .into_iter()
            .map(|(field, message)| FieldError { field, message })
            .collect()
    }
}

/// Orchestrates the per-field sanitizers plus the rate limiter into one
/// aggregated report.
pub struct FormValidator {
    rate_limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl FormValidator {
    pub fn new(rate_limiter: Arc<RateLimiter>, clock: Arc<dyn Clock>) -> Self {
        Self { rate_limiter, clock }
    }

    /// Runs every field validator and the rate-limit check. The returned
    /// report is empty iff the form may be submitted.
    pub fn validate(&self, form: &RawContactForm) -> ValidationReport {
        let mut report = ValidationReport::default();

        // Declarative bounds first; the sanitizer pass below overwrites any
        // shared key with its canonical message.
        if let Err(errors) = form.validate() {
            for (field, field_errors) in errors.field_errors() {
                if let Some(error) = field_errors.first() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string());
                    report.insert(field.as_ref(), message);
                }
            }
        }

        if sanitizer::sanitize_name(&form.name).is_none() {
            report.insert(
                "name",
                "Invalid name. Use letters and spaces only (minimum 3 characters).",
            );
        }

        if sanitizer::sanitize_email(&form.email).is_none() {
            report.insert("email", "Invalid email. Please enter a valid email address.");
        }

        if sanitizer::sanitize_phone(&form.phone).is_none() {
            report.insert(
                "phone",
                "Invalid phone number. Use the Brazilian format: (11) 99999-9999",
            );
        }

        if sanitizer::sanitize_message(&form.message).is_none() {
            report.insert(
                "message",
                "Invalid message. It must be between 10 and 2000 characters.",
            );
        }

        let decision = self.rate_limiter.can_submit();
        if let Some(message) = decision.message() {
            report.insert(RATE_LIMIT_KEY, message);
        }

        report
    }

    /// Re-derives the normalized value of every field and stamps the
    /// submission metadata. Independent of any previous [`validate`] call;
    /// callers must have seen a valid report first and only proceed on
    /// `Some`.
    ///
    /// [`validate`]: FormValidator::validate
    pub fn sanitized_data(
        &self,
        form: &RawContactForm,
        context: &ClientContext,
    ) -> Option<SanitizedSubmission> {
        Some(SanitizedSubmission {
            name: sanitizer::sanitize_name(&form.name)?,
            email: sanitizer::sanitize_email(&form.email)?,
            phone: sanitizer::sanitize_phone(&form.phone)?,
            message: sanitizer::sanitize_message(&form.message)?,
            timestamp: self.clock.now(),
            user_agent: context.user_agent.clone(),
            referrer: context.referrer.clone(),
            recaptcha_token: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::test_support::ManualClock;
    use crate::infrastructure::storage::MemoryStore;

    fn validator() -> (FormValidator, Arc<RateLimiter>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = Arc::new(MemoryStore::new());
        let rate_limiter = Arc::new(RateLimiter::new(store, clock.clone()));
        (FormValidator::new(rate_limiter.clone(), clock), rate_limiter)
    }

    fn valid_form() -> RawContactForm {
        RawContactForm {
            name: "Maria Oliveira".to_string(),
            email: "maria@example.com".to_string(),
            phone: "(11) 99999-9999".to_string(),
            message: "I would like to schedule an appointment.".to_string(),
        }
    }

    #[test]
    fn valid_form_produces_empty_report() {
        let (validator, _) = validator();
        let report = validator.validate(&valid_form());
        assert!(report.is_valid());
    }

    #[test]
    fn every_bad_field_is_reported() {
        let (validator, _) = validator();

        let form = RawContactForm {
            name: "x1".to_string(),
            email: "nope".to_string(),
            phone: "123".to_string(),
            message: "short".to_string(),
        };

        let report = validator.validate(&form);
        assert!(!report.is_valid());
        assert!(report.get("name").is_some());
        assert!(report.get("email").is_some());
        assert!(report.get("phone").is_some());
        assert!(report.get("message").is_some());
        assert!(report.rate_limit_message().is_none());
    }

    #[test]
    fn throttled_state_adds_form_level_error() {
        let (validator, rate_limiter) = validator();
        rate_limiter.block_user(60);

        let report = validator.validate(&valid_form());
        assert!(!report.is_valid());
        assert!(report.get("name").is_none());
        assert!(report.rate_limit_message().unwrap().contains("Try again in 60"));
    }

    #[test]
    fn sanitized_data_carries_normalized_fields_and_context() {
        let (validator, _) = validator();

        let mut form = valid_form();
        form.email = "  MARIA@Example.COM ".to_string();

        let context = ClientContext {
            user_agent: "TestAgent/1.0".to_string(),
            referrer: "https://example.com/contact".to_string(),
        };

        let submission = validator.sanitized_data(&form, &context).unwrap();
        assert_eq!(submission.email, "maria@example.com");
        assert_eq!(submission.user_agent, "TestAgent/1.0");
        assert_eq!(submission.referrer, "https://example.com/contact");
        assert_eq!(submission.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert!(submission.recaptcha_token.is_none());
    }

    #[test]
    fn sanitized_data_refuses_rejected_fields() {
        let (validator, _) = validator();

        let mut form = valid_form();
        form.name = "99".to_string();

        assert!(validator.sanitized_data(&form, &ClientContext::default()).is_none());
    }
}
