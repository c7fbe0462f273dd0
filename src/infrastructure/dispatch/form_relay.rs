use async_trait::async_trait;
use reqwest::header::ACCEPT;
use url::Url;

use crate::domain::entities::contact::{SanitizedSubmission, SubmitOutcome};
use crate::errors::DispatchError;

use super::{Dispatcher, SEND_SUCCESS_MESSAGE};

/// Generic form-relay endpoint (Formspree-style): one JSON POST carrying the
/// form fields plus a subject line and a plain-text format hint.
pub struct FormRelayDispatcher {
    client: reqwest::Client,
    endpoint: Url,
    subject: String,
}

impl FormRelayDispatcher {
    pub fn new(client: reqwest::Client, endpoint: Url, subject: String) -> Self {
        Self {
            client,
            endpoint,
            subject,
        }
    }

    fn payload(&self, submission: &SanitizedSubmission) -> serde_json::Value {
        serde_json::json!({
            "name": submission.name,
            "email": submission.email,
            "phone": submission.phone,
            "message": submission.message,
            "_subject": self.subject,
            "_format": "plain",
        })
    }
}

#[async_trait]
impl Dispatcher for FormRelayDispatcher {
    async fn send(&self, submission: &SanitizedSubmission) -> Result<SubmitOutcome, DispatchError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, "application/json")
            .json(&self.payload(submission))
            .send()
            .await
            .map_err(|err| {
                tracing::error!("form relay request failed: {err}");
                DispatchError::SendFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("form relay rejected submission: HTTP {status}");
            return Err(DispatchError::SendFailed);
        }

        let data: serde_json::Value = response.json().await.map_err(|err| {
            tracing::error!("form relay returned an unreadable body: {err}");
            DispatchError::SendFailed
        })?;

        Ok(SubmitOutcome {
            success: true,
            message: SEND_SUCCESS_MESSAGE.to_string(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn payload_carries_fields_subject_and_format_hint() {
        let dispatcher = FormRelayDispatcher::new(
            reqwest::Client::new(),
            Url::parse("https://relay.example/f/abc").unwrap(),
            "New message from the website".to_string(),
        );

        let submission = SanitizedSubmission {
            name: "Maria Oliveira".to_string(),
            email: "maria@example.com".to_string(),
            phone: "(11) 99999-9999".to_string(),
            message: "I would like to schedule an appointment.".to_string(),
            timestamp: Utc::now(),
            user_agent: String::new(),
            referrer: String::new(),
            recaptcha_token: Some("proof".to_string()),
        };

        let payload = dispatcher.payload(&submission);
        assert_eq!(payload["name"], "Maria Oliveira");
        assert_eq!(payload["_subject"], "New message from the website");
        assert_eq!(payload["_format"], "plain");
        assert!(payload.get("recaptcha_token").is_none());
    }
}
