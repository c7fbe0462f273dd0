use std::sync::Arc;

use crate::domain::entities::contact::{SanitizedSubmission, SubmitOutcome};
use crate::errors::PipelineError;
use crate::infrastructure::antibot::ChallengeProvider;
use crate::infrastructure::dispatch::Dispatcher;
use crate::infrastructure::limiter::rate_limiter::RateLimiter;

/// One submission attempt, no retry. The steps run strictly in sequence:
/// rate check, best-effort anti-bot proof, dispatch, history record.
///
/// Not reentrancy-safe: the embedding UI is expected to allow at most one
/// in-flight call per form instance (disable the submit control while a
/// call is pending).
pub struct SubmissionPipeline {
    rate_limiter: Arc<RateLimiter>,
    antibot: Arc<dyn ChallengeProvider>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl SubmissionPipeline {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        antibot: Arc<dyn ChallengeProvider>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            rate_limiter,
            antibot,
            dispatcher,
        }
    }

    /// Sends an already-sanitized submission through the configured backend.
    ///
    /// Anti-bot proof acquisition is best-effort: on failure the submission
    /// proceeds without a token (availability over strict bot-blocking). A
    /// successful send is recorded in the rate-limit history.
    pub async fn submit(
        &self,
        mut submission: SanitizedSubmission,
    ) -> Result<SubmitOutcome, PipelineError> {
        let decision = self.rate_limiter.can_submit();
        if let Some(message) = decision.message() {
            return Err(PipelineError::RateLimited(message.to_string()));
        }

        submission.recaptcha_token = match self.antibot.token("submit").await {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::warn!("anti-bot proof unavailable, proceeding without it: {err}");
                None
            }
        };

        let outcome = self.dispatcher.send(&submission).await?;

        self.rate_limiter.record_submission();
        Ok(outcome)
    }
}
