//! Client-side contact-form submission pipeline: input sanitization and
//! validation, advisory rate limiting, CSRF token preparation, best-effort
//! anti-bot proof acquisition, and dispatch to one of three interchangeable
//! delivery backends.
//!
//! The embedding UI layer captures raw field values, hands them to
//! [`FormPipeline::submit`], and renders the outcome. Everything rendered —
//! per-field messages, the form-level rate-limit message, the success text —
//! comes out of this crate already normalized; no backend or internal error
//! text ever reaches the user.

mod domain;
mod infrastructure;

pub mod constants;
pub mod errors;
pub mod settings;

pub use domain::{entities, sanitizer, use_cases};
pub use infrastructure::{antibot, clock, dispatch, limiter, security, storage};

use std::sync::Arc;

use entities::contact::{ClientContext, RawContactForm, SubmitOutcome};
use errors::PipelineError;
use infrastructure::antibot::{ChallengeProvider, RecaptchaClient};
use infrastructure::clock::{Clock, SystemClock};
use infrastructure::dispatch::build_dispatcher;
use infrastructure::limiter::rate_limiter::RateLimiter;
use infrastructure::security::csrf::CsrfProtection;
use infrastructure::storage::{JsonFileStore, MemoryStore, StateStore};
use settings::PipelineConfig;
use use_cases::submit::SubmissionPipeline;
use use_cases::validate::{FormValidator, RATE_LIMIT_KEY};

/// Everything wired together from one [`PipelineConfig`]: storage, clock,
/// rate limiter, CSRF lifecycle, anti-bot client and the configured
/// dispatcher.
pub struct FormPipeline {
    validator: FormValidator,
    pipeline: SubmissionPipeline,
    rate_limiter: Arc<RateLimiter>,
    csrf: Arc<CsrfProtection>,
}

impl FormPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let durable: Arc<dyn StateStore> = match &config.storage_path {
            Some(path) => Arc::new(JsonFileStore::new(path.clone())),
            None => Arc::new(MemoryStore::new()),
        };
        let session: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let rate_limiter = Arc::new(RateLimiter::new(durable, clock.clone()));
        let csrf = Arc::new(CsrfProtection::new(session, clock.clone()));

        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| PipelineError::Internal(format!("failed to build HTTP client: {err}")))?;

        let antibot: Arc<dyn ChallengeProvider> =
            Arc::new(RecaptchaClient::new(client.clone(), config.recaptcha.clone()));
        let dispatcher = build_dispatcher(&config, csrf.clone(), client)?;

        Ok(Self {
            validator: FormValidator::new(rate_limiter.clone(), clock),
            pipeline: SubmissionPipeline::new(rate_limiter.clone(), antibot, dispatcher),
            rate_limiter,
            csrf,
        })
    }

    /// Validates, sanitizes and submits in one call.
    ///
    /// A rate-limited form fails with [`PipelineError::RateLimited`] (a
    /// form-level message); any field problem fails with
    /// [`PipelineError::Validation`] before anything leaves the process.
    pub async fn submit(
        &self,
        form: RawContactForm,
        context: ClientContext,
    ) -> Result<SubmitOutcome, PipelineError> {
        let report = self.validator.validate(&form);
        if !report.is_valid() {
            let only_rate_limited = report.iter().all(|(field, _)| field == RATE_LIMIT_KEY);
            if only_rate_limited {
                let message = report.rate_limit_message().unwrap_or_default().to_string();
                return Err(PipelineError::RateLimited(message));
            }
            return Err(PipelineError::Validation(report.into_field_errors()));
        }

        let submission = self.validator.sanitized_data(&form, &context).ok_or_else(|| {
            PipelineError::Internal("sanitized data unavailable after a valid report".to_string())
        })?;

        self.pipeline.submit(submission).await
    }

    pub fn validator(&self) -> &FormValidator {
        &self.validator
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn csrf(&self) -> &CsrfProtection {
        &self.csrf
    }
}
