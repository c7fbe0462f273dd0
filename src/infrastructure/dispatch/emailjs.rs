use async_trait::async_trait;

use crate::domain::entities::contact::{SanitizedSubmission, SubmitOutcome};
use crate::errors::DispatchError;
use crate::settings::EmailJsSettings;

use super::{Dispatcher, SEND_SUCCESS_MESSAGE};

/// Third-party email relay. The submission is mapped onto a configured
/// service/template pair and sent through the relay's REST endpoint, with
/// the public key identifying the account.
pub struct EmailJsDispatcher {
    client: reqwest::Client,
    settings: EmailJsSettings,
}

impl EmailJsDispatcher {
    pub fn new(client: reqwest::Client, settings: EmailJsSettings) -> Self {
        Self { client, settings }
    }

    fn request_body(&self, submission: &SanitizedSubmission) -> serde_json::Value {
        serde_json::json!({
            "service_id": self.settings.service_id,
            "template_id": self.settings.template_id,
            "user_id": self.settings.public_key,
            "template_params": {
                "from_name": submission.name,
                "from_email": submission.email,
                "phone": submission.phone,
                "message": submission.message,
                "reply_to": submission.email,
            },
        })
    }
}

#[async_trait]
impl Dispatcher for EmailJsDispatcher {
    async fn send(&self, submission: &SanitizedSubmission) -> Result<SubmitOutcome, DispatchError> {
        let response = self
            .client
            .post(&self.settings.api_url)
            .json(&self.request_body(submission))
            .send()
            .await
            .map_err(|err| {
                tracing::error!("EmailJS request failed: {err}");
                DispatchError::SendFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("EmailJS rejected submission: HTTP {status}");
            return Err(DispatchError::SendFailed);
        }

        let body = response.text().await.unwrap_or_default();

        Ok(SubmitOutcome {
            success: true,
            message: SEND_SUCCESS_MESSAGE.to_string(),
            data: serde_json::json!({
                "status": status.as_u16(),
                "body": body,
            }),
        })
    }
}
