use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;

use crate::domain::entities::contact::{SanitizedSubmission, SubmitOutcome};
use crate::errors::{DispatchError, PipelineError};
use crate::infrastructure::security::csrf::CsrfProtection;
use crate::settings::CustomEndpointSettings;

use super::{Dispatcher, SEND_SUCCESS_MESSAGE};

const CSRF_HEADER: &str = "X-CSRF-Token";

/// First-party endpoint. The request carries every submission field plus the
/// CSRF token, in the body and in the `X-CSRF-Token` header; method and
/// default headers come from configuration, resolved once here.
pub struct CustomDispatcher {
    client: reqwest::Client,
    endpoint: String,
    method: Method,
    headers: HeaderMap,
    csrf: Arc<CsrfProtection>,
}

impl CustomDispatcher {
    pub fn new(
        client: reqwest::Client,
        settings: CustomEndpointSettings,
        csrf: Arc<CsrfProtection>,
    ) -> Result<Self, PipelineError> {
        let method = Method::from_bytes(settings.method.as_bytes()).map_err(|_| {
            PipelineError::Config(format!(
                "custom.method is not a valid HTTP method: {}",
                settings.method
            ))
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                PipelineError::Config(format!("custom.headers contains an invalid name: {name}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                PipelineError::Config(format!("custom.headers contains an invalid value for {name}"))
            })?;
            headers.insert(name, value);
        }

        Ok(Self {
            client,
            endpoint: settings.endpoint,
            method,
            headers,
            csrf,
        })
    }

    fn payload(
        &self,
        submission: &SanitizedSubmission,
        csrf_token: &str,
    ) -> Result<serde_json::Value, DispatchError> {
        let mut payload = serde_json::to_value(submission).map_err(|err| {
            tracing::error!("failed to serialize submission: {err}");
            DispatchError::SendFailed
        })?;
        payload["csrf_token"] = serde_json::Value::String(csrf_token.to_string());
        Ok(payload)
    }
}

#[async_trait]
impl Dispatcher for CustomDispatcher {
    async fn send(&self, submission: &SanitizedSubmission) -> Result<SubmitOutcome, DispatchError> {
        let csrf_token = self.csrf.get_token();
        let payload = self.payload(submission, &csrf_token)?;

        let response = self
            .client
            .request(self.method.clone(), &self.endpoint)
            .headers(self.headers.clone())
            .header(CSRF_HEADER, csrf_token.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("custom endpoint request failed: {err}");
                DispatchError::SendFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("custom endpoint rejected submission: HTTP {status}");
            return Err(DispatchError::SendFailed);
        }

        let data: serde_json::Value = response.json().await.map_err(|err| {
            tracing::error!("custom endpoint returned an unreadable body: {err}");
            DispatchError::SendFailed
        })?;

        let message = data
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(SEND_SUCCESS_MESSAGE)
            .to_string();

        Ok(SubmitOutcome {
            success: true,
            message,
            data,
        })
    }
}
