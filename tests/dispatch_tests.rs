
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use url::Url;

use contact_pipeline::clock::SystemClock;
use contact_pipeline::dispatch::{CustomDispatcher, Dispatcher, EmailJsDispatcher, FormRelayDispatcher};
use contact_pipeline::errors::DispatchError;
use contact_pipeline::security::csrf::CsrfProtection;
use contact_pipeline::settings::{
    BackendKind, CustomEndpointSettings, EmailJsSettings, PipelineConfig,
};
use contact_pipeline::storage::MemoryStore;
use contact_pipeline::FormPipeline;

use test_utils::*;

type Received = Arc<Mutex<Vec<Value>>>;

fn capture_router(path: &str, received: Received) -> Router {
    Router::new()
        .route(
            path,
            post(|State(received): State<Received>, Json(body): Json<Value>| async move {
                received.lock().push(body);
                Json(json!({"ok": true}))
            }),
        )
        .with_state(received)
}

fn csrf() -> Arc<CsrfProtection> {
    Arc::new(CsrfProtection::new(
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
    ))
}

#[tokio::test]
async fn form_relay_posts_fields_and_succeeds() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let base = spawn_stub(capture_router("/f/abc", received.clone())).await;

    let dispatcher = FormRelayDispatcher::new(
        reqwest::Client::new(),
        Url::parse(&format!("{base}/f/abc")).unwrap(),
        "New message from the website".to_string(),
    );

    let outcome = dispatcher.send(&sample_submission()).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.message, "Message sent successfully!");
    assert_eq!(outcome.data["ok"], true);

    let bodies = received.lock();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["name"], "Maria Oliveira");
    assert_eq!(bodies[0]["_subject"], "New message from the website");
    assert_eq!(bodies[0]["_format"], "plain");
}

#[tokio::test]
async fn form_relay_normalizes_remote_rejection() {
    let router = Router::new().route(
        "/f/abc",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = spawn_stub(router).await;

    let dispatcher = FormRelayDispatcher::new(
        reqwest::Client::new(),
        Url::parse(&format!("{base}/f/abc")).unwrap(),
        "subject".to_string(),
    );

    let err = dispatcher.send(&sample_submission()).await.unwrap_err();
    assert_eq!(err, DispatchError::SendFailed);
    assert_eq!(err.to_string(), "Failed to send message. Please try again later.");
}

#[tokio::test]
async fn custom_sends_csrf_header_and_propagates_response_message() {
    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));

    let router = Router::new()
        .route(
            "/api/contact",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let token = headers
                        .get("X-CSRF-Token")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    captured.lock().push((token, body));
                    Json(json!({"message": "Thanks! We got it."}))
                },
            ),
        )
        .with_state(captured.clone());
    let base = spawn_stub(router).await;

    let dispatcher = CustomDispatcher::new(
        reqwest::Client::new(),
        CustomEndpointSettings {
            endpoint: format!("{base}/api/contact"),
            ..CustomEndpointSettings::default()
        },
        csrf(),
    )
    .unwrap();

    let mut submission = sample_submission();
    submission.recaptcha_token = Some("proof".to_string());

    let outcome = dispatcher.send(&submission).await.unwrap();
    assert_eq!(outcome.message, "Thanks! We got it.");

    let captured = captured.lock();
    let (header_token, body) = &captured[0];
    let header_token = header_token.as_ref().expect("CSRF header present");
    assert_eq!(header_token.len(), 64);
    assert_eq!(body["csrf_token"], *header_token);
    assert_eq!(body["userAgent"], "TestAgent/1.0");
    assert_eq!(body["recaptcha_token"], "proof");
}

#[tokio::test]
async fn custom_treats_non_json_success_body_as_failure() {
    let router = Router::new().route("/api/contact", post(|| async { "OK" }));
    let base = spawn_stub(router).await;

    let dispatcher = CustomDispatcher::new(
        reqwest::Client::new(),
        CustomEndpointSettings {
            endpoint: format!("{base}/api/contact"),
            ..CustomEndpointSettings::default()
        },
        csrf(),
    )
    .unwrap();

    let err = dispatcher.send(&sample_submission()).await.unwrap_err();
    assert_eq!(err, DispatchError::SendFailed);
}

#[tokio::test]
async fn emailjs_posts_service_template_and_account_key() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route(
            "/api/v1.0/email/send",
            post(|State(received): State<Received>, Json(body): Json<Value>| async move {
                received.lock().push(body);
                "OK"
            }),
        )
        .with_state(received.clone());
    let base = spawn_stub(router).await;

    let dispatcher = EmailJsDispatcher::new(
        reqwest::Client::new(),
        EmailJsSettings {
            service_id: "service_x".to_string(),
            template_id: "template_y".to_string(),
            public_key: "key_z".to_string(),
            api_url: format!("{base}/api/v1.0/email/send"),
        },
    );

    let outcome = dispatcher.send(&sample_submission()).await.unwrap();
    assert!(outcome.success);

    let bodies = received.lock();
    assert_eq!(bodies[0]["service_id"], "service_x");
    assert_eq!(bodies[0]["template_id"], "template_y");
    assert_eq!(bodies[0]["user_id"], "key_z");
    assert_eq!(bodies[0]["template_params"]["from_name"], "Maria Oliveira");
}

fn stub_config(base: &str) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.backend = BackendKind::FormRelay;
    config.form_relay.endpoint = Some(Url::parse(&format!("{base}/f/abc")).unwrap());
    config.recaptcha.site_key = "stub-site-key".to_string();
    config.recaptcha.script_url = format!("{base}/recaptcha/api.js");
    config.recaptcha.token_url = format!("{base}/recaptcha/token");
    config
}

#[tokio::test]
async fn full_pipeline_submits_through_the_stub_backend() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let router = capture_router("/f/abc", received.clone())
        .route("/recaptcha/api.js", get(|| async { "// widget" }))
        .route(
            "/recaptcha/token",
            post(|| async { Json(json!({"token": "stub-proof"})) }),
        );
    let base = spawn_stub(router).await;

    let pipeline = FormPipeline::new(stub_config(&base)).unwrap();
    let outcome = pipeline.submit(sample_form(), sample_context()).await.unwrap();

    assert!(outcome.success);
    assert!(!outcome.message.is_empty());
    assert_eq!(received.lock().len(), 1);
}

#[tokio::test]
async fn full_pipeline_survives_an_unreachable_challenge_service() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    // No recaptcha routes at all: both bootstrap and token exchange 404.
    let router = capture_router("/f/abc", received.clone());
    let base = spawn_stub(router).await;

    let pipeline = FormPipeline::new(stub_config(&base)).unwrap();
    let outcome = pipeline.submit(sample_form(), sample_context()).await.unwrap();

    assert!(outcome.success);
    assert_eq!(received.lock().len(), 1);
}

#[tokio::test]
async fn full_pipeline_rejects_invalid_fields_before_any_network_call() {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let base = spawn_stub(capture_router("/f/abc", received.clone())).await;

    let pipeline = FormPipeline::new(stub_config(&base)).unwrap();

    let mut form = sample_form();
    form.email = "not-an-email".to_string();

    let err = pipeline.submit(form, sample_context()).await.unwrap_err();
    match err {
        contact_pipeline::errors::PipelineError::Validation(fields) => {
            assert!(fields.iter().any(|f| f.field == "email"));
        }
        other => panic!("expected a validation error, got {other}"),
    }
    assert!(received.lock().is_empty());
}
