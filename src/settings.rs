use std::collections::HashMap;
use std::path::PathBuf;
use std::{fmt, str::FromStr};

use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::Deserialize;
use url::Url;

/// The active delivery backend. A closed set: an unrecognized name fails at
/// configuration parse time, before any pipeline is constructed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Emailjs,
    FormRelay,
    Custom,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "emailjs" => Ok(BackendKind::Emailjs),
            "form_relay" => Ok(BackendKind::FormRelay),
            "custom" => Ok(BackendKind::Custom),
            _ => Err(ConfigError::Message(format!("Invalid backend variant: {}", s))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Emailjs => "emailjs",
            BackendKind::FormRelay => "form_relay",
            BackendKind::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    #[serde(default)]
    pub emailjs: EmailJsSettings,

    #[serde(default)]
    pub form_relay: FormRelaySettings,

    #[serde(default)]
    pub custom: CustomEndpointSettings,

    #[serde(default)]
    pub recaptcha: RecaptchaSettings,

    /// Durable state location (submission history, block timestamp).
    /// `None` keeps everything in memory.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,

    /// Subject line forwarded by the form-relay backend.
    #[serde(default = "default_subject")]
    pub subject: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct EmailJsSettings {
    #[serde(default)]
    pub service_id: String,

    #[serde(default)]
    pub template_id: String,

    #[serde(default)]
    pub public_key: String,

    #[serde(default = "default_emailjs_api_url")]
    pub api_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub struct FormRelaySettings {
    #[serde(default)]
    pub endpoint: Option<Url>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct CustomEndpointSettings {
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct RecaptchaSettings {
    #[serde(default)]
    pub site_key: String,

    #[serde(default = "default_recaptcha_version")]
    pub version: u8,

    #[serde(default = "default_recaptcha_script_url")]
    pub script_url: String,

    #[serde(default = "default_recaptcha_token_url")]
    pub token_url: String,
}

fn default_backend() -> BackendKind {
    BackendKind::Emailjs
}
fn default_subject() -> String {
    "New message from the website".to_string()
}
fn default_emailjs_api_url() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}
fn default_method() -> String {
    "POST".to_string()
}
fn default_headers() -> HashMap<String, String> {
    HashMap::from([("Content-Type".to_string(), "application/json".to_string())])
}
fn default_recaptcha_version() -> u8 {
    3
}
fn default_recaptcha_script_url() -> String {
    "https://www.google.com/recaptcha/api.js".to_string()
}
fn default_recaptcha_token_url() -> String {
    "https://www.google.com/recaptcha/api/token".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            emailjs: EmailJsSettings::default(),
            form_relay: FormRelaySettings::default(),
            custom: CustomEndpointSettings::default(),
            recaptcha: RecaptchaSettings::default(),
            storage_path: None,
            subject: default_subject(),
        }
    }
}

impl Default for EmailJsSettings {
    fn default() -> Self {
        Self {
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            api_url: default_emailjs_api_url(),
        }
    }
}

impl Default for CustomEndpointSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            method: default_method(),
            headers: default_headers(),
        }
    }
}

impl Default for RecaptchaSettings {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            version: default_recaptcha_version(),
            script_url: default_recaptcha_script_url(),
            token_url: default_recaptcha_token_url(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__").ignore_empty(true));

        let config: Self = builder.build()?.try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        match self.backend {
            BackendKind::Emailjs => {
                if placeholder(&self.emailjs.service_id) {
                    errors.push("emailjs.service_id must be configured".to_string());
                }
                if placeholder(&self.emailjs.template_id) {
                    errors.push("emailjs.template_id must be configured".to_string());
                }
                if placeholder(&self.emailjs.public_key) {
                    errors.push("emailjs.public_key must be configured".to_string());
                }
            }
            BackendKind::FormRelay => {
                if self.form_relay.endpoint.is_none() {
                    errors.push("form_relay.endpoint must be configured".to_string());
                }
            }
            BackendKind::Custom => {
                if Url::parse(&self.custom.endpoint).is_err() {
                    errors.push("custom.endpoint must be an absolute URL".to_string());
                }
                if reqwest::Method::from_bytes(self.custom.method.as_bytes()).is_err() {
                    errors.push(format!("custom.method is not a valid HTTP method: {}", self.custom.method));
                }
            }
        }

        if !self.recaptcha.site_key.is_empty() {
            if !matches!(self.recaptcha.version, 2 | 3) {
                errors.push(format!("recaptcha.version must be 2 or 3, got {}", self.recaptcha.version));
            }
            if Url::parse(&self.recaptcha.script_url).is_err() {
                errors.push("recaptcha.script_url must be an absolute URL".to_string());
            }
            if Url::parse(&self.recaptcha.token_url).is_err() {
                errors.push("recaptcha.token_url must be an absolute URL".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }
}

/// Unconfigured or copy-pasted placeholder values count as missing.
fn placeholder(value: &str) -> bool {
    value.trim().is_empty() || value.starts_with("YOUR_")
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("backend", &self.backend)
            .field("emailjs.service_id", &self.emailjs.service_id)
            .field("emailjs.template_id", &self.emailjs.template_id)
            .field("emailjs.public_key", &self.emailjs.public_key.redact())
            .field("form_relay.endpoint", &self.form_relay.endpoint)
            .field("custom.endpoint", &self.custom.endpoint)
            .field("custom.method", &self.custom.method)
            .field("recaptcha.site_key", &self.recaptcha.site_key.redact())
            .field("recaptcha.version", &self.recaptcha.version)
            .field("storage_path", &self.storage_path)
            .field("subject", &self.subject)
            .finish()
    }
}
