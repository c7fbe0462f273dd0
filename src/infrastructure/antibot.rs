use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::errors::AntiBotError;
use crate::settings::RecaptchaSettings;

/// Per-attempt anti-bot proof acquisition. Failures are expected to be
/// treated as non-fatal by the caller: the pipeline degrades to submitting
/// without a proof token.
#[async_trait]
pub trait ChallengeProvider: Send + Sync {
    async fn token(&self, action: &str) -> Result<String, AntiBotError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

/// reCAPTCHA-style challenge client. The widget bootstrap is fetched lazily
/// and at most once per client; every attempt then negotiates an
/// execution-scoped token with the remote service.
///
/// No timeout of its own: a stalled negotiation stalls the submission until
/// the HTTP client gives up.
pub struct RecaptchaClient {
    client: reqwest::Client,
    settings: RecaptchaSettings,
    bootstrap: OnceCell<()>,
}

impl RecaptchaClient {
    pub fn new(client: reqwest::Client, settings: RecaptchaSettings) -> Self {
        Self {
            client,
            settings,
            bootstrap: OnceCell::new(),
        }
    }

    /// Idempotent challenge-script bootstrap. Resolves immediately once a
    /// previous call has succeeded.
    async fn ensure_loaded(&self) -> Result<(), AntiBotError> {
        self.bootstrap
            .get_or_try_init(|| async {
                let url = format!("{}?render={}", self.settings.script_url, self.settings.site_key);
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| AntiBotError::ScriptLoad(e.to_string()))?;
                response
                    .error_for_status()
                    .map_err(|e| AntiBotError::ScriptLoad(e.to_string()))?;

                tracing::debug!("anti-bot challenge script loaded");
                Ok(())
            })
            .await
            .copied()
    }
}

#[async_trait]
impl ChallengeProvider for RecaptchaClient {
    async fn token(&self, action: &str) -> Result<String, AntiBotError> {
        self.ensure_loaded().await?;

        let request = serde_json::json!({
            "site_key": self.settings.site_key,
            "version": self.settings.version,
            "action": action,
        });

        let response = self
            .client
            .post(&self.settings.token_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AntiBotError::Token(e.to_string()))?
            .error_for_status()
            .map_err(|e| AntiBotError::Token(e.to_string()))?;

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| AntiBotError::Token(e.to_string()))?;

        if payload.token.trim().is_empty() {
            return Err(AntiBotError::Token(
                "challenge service returned an empty token".to_string(),
            ));
        }

        Ok(payload.token)
    }
}
