pub mod custom;
pub mod emailjs;
pub mod form_relay;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entities::contact::{SanitizedSubmission, SubmitOutcome};
use crate::errors::{DispatchError, PipelineError};
use crate::infrastructure::security::csrf::CsrfProtection;
use crate::settings::{BackendKind, PipelineConfig};

pub use custom::CustomDispatcher;
pub use emailjs::EmailJsDispatcher;
pub use form_relay::FormRelayDispatcher;

/// Success text used when a backend has nothing better to say.
pub const SEND_SUCCESS_MESSAGE: &str = "Message sent successfully!";

/// Uniform send contract over the delivery backends. Implementations
/// normalize every failure to [`DispatchError`] and log the underlying cause
/// themselves; nothing backend-specific leaks to the caller.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, submission: &SanitizedSubmission) -> Result<SubmitOutcome, DispatchError>;
}

/// Resolves the configured backend variant once, at construction. Per-call
/// code never re-checks the selection.
pub fn build_dispatcher(
    config: &PipelineConfig,
    csrf: Arc<CsrfProtection>,
    client: reqwest::Client,
) -> Result<Arc<dyn Dispatcher>, PipelineError> {
    match config.backend {
        BackendKind::Emailjs => Ok(Arc::new(EmailJsDispatcher::new(client, config.emailjs.clone()))),
        BackendKind::FormRelay => {
            let endpoint = config.form_relay.endpoint.clone().ok_or_else(|| {
                PipelineError::Config("form_relay.endpoint must be configured".to_string())
            })?;
            Ok(Arc::new(FormRelayDispatcher::new(
                client,
                endpoint,
                config.subject.clone(),
            )))
        }
        BackendKind::Custom => Ok(Arc::new(CustomDispatcher::new(
            client,
            config.custom.clone(),
            csrf,
        )?)),
    }
}
