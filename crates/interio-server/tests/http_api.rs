use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use interio_contracts::models::{AiModel, EditMode};
use interio_contracts::responses::TokenUsage;
use interio_engine::{
    ImageProvider, ImageProviderRegistry, ImageRouter, ProviderEditRequest, ProviderError,
    ProviderGenerateRequest, ProviderImageResult,
};
use interio_server::build_app;
use interio_server::cors::CorsPolicy;
use serde_json::{json, Value};
use tower::ServiceExt;

const FRONTEND: &str = "http://localhost:3000";

#[derive(Default)]
struct Calls {
    generate: AtomicUsize,
    edit: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl Calls {
    fn total(&self) -> usize {
        self.generate.load(Ordering::SeqCst) + self.edit.load(Ordering::SeqCst)
    }
}

struct CountingProvider {
    mode: EditMode,
    fail: bool,
    calls: Arc<Calls>,
}

impl CountingProvider {
    fn outcome(&self) -> Result<ProviderImageResult, ProviderError> {
        if self.fail {
            return Err(ProviderError::Status {
                provider: "Stub",
                status: 502,
                body: "upstream unavailable".to_string(),
            });
        }
        Ok(ProviderImageResult {
            image_base64: "aW1hZ2U=".to_string(),
            mime_type: None,
            description: Some("stub description".to_string()),
            token_usage: match self.mode {
                EditMode::Masked => Some(TokenUsage {
                    input_tokens: 10,
                    output_tokens: 20,
                    total_tokens: 30,
                }),
                EditMode::Semantic => None,
            },
        })
    }
}

#[async_trait]
impl ImageProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn edit_mode(&self) -> EditMode {
        self.mode
    }

    async fn generate(
        &self,
        request: &ProviderGenerateRequest,
    ) -> Result<ProviderImageResult, ProviderError> {
        self.calls.generate.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_prompt.lock().unwrap() = Some(request.prompt.clone());
        self.outcome()
    }

    async fn edit(
        &self,
        request: &ProviderEditRequest,
    ) -> Result<ProviderImageResult, ProviderError> {
        self.calls.edit.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_prompt.lock().unwrap() = Some(request.prompt.clone());
        self.outcome()
    }
}

struct Harness {
    app: Router,
    openai: Arc<Calls>,
    gemini: Arc<Calls>,
}

fn harness_with(fail: bool) -> Harness {
    let openai = Arc::new(Calls::default());
    let gemini = Arc::new(Calls::default());
    let mut registry = ImageProviderRegistry::new();
    registry.register(
        AiModel::GptImage,
        CountingProvider {
            mode: EditMode::Masked,
            fail,
            calls: openai.clone(),
        },
    );
    registry.register(
        AiModel::GeminiFlash,
        CountingProvider {
            mode: EditMode::Semantic,
            fail,
            calls: gemini.clone(),
        },
    );
    let app = build_app(
        ImageRouter::new(registry),
        CorsPolicy::new([FRONTEND]),
        1024 * 1024,
    );
    Harness { app, openai, gemini }
}

fn harness() -> Harness {
    harness_with(false)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_reports_version() {
    let harness = harness();
    for uri in ["/", "/health"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(&harness.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "version": "0.1.0" }));
    }
}

#[tokio::test]
async fn generate_returns_normalized_shape() {
    let harness = harness();
    let (status, body) = send(
        &harness.app,
        post_json("/api/generate", json!({ "prompt": "a cozy reading nook" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "image_base64": "aW1hZ2U=",
            "mime_type": "image/png",
            "description": "stub description",
            "token_usage": { "input_tokens": 10, "output_tokens": 20, "total_tokens": 30 },
        })
    );
    assert_eq!(harness.openai.generate.load(Ordering::SeqCst), 1);
    assert_eq!(harness.gemini.total(), 0);
    let prompt = harness.openai.last_prompt.lock().unwrap().clone();
    assert_eq!(
        prompt.as_deref(),
        Some(
            "Professional interior design photograph: a cozy reading nook. \
             Photorealistic, well-lit, high quality architectural photography."
        )
    );
}

#[tokio::test]
async fn generate_routes_gemini_selector() {
    let harness = harness();
    let (status, body) = send(
        &harness.app,
        post_json(
            "/api/generate",
            json!({
                "prompt": "loft",
                "model": "gemini-flash",
                "aspect_ratio": "9:16",
                "stream": true,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("token_usage").is_none());
    assert_eq!(harness.gemini.generate.load(Ordering::SeqCst), 1);
    assert_eq!(harness.openai.total(), 0);
}

#[tokio::test]
async fn edit_without_mask_for_gpt_image_is_rejected() {
    let harness = harness();
    let (status, body) = send(
        &harness.app,
        post_json(
            "/api/edit",
            json!({ "image_base64": "aW1n", "prompt": "add a rug", "model": "gpt-image-1.5" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!(
            "GPT Image requires a mask for editing. \
             Use the semantic edit endpoint for Gemini Flash."
        )
    );
    assert_eq!(harness.openai.total(), 0);
    assert_eq!(harness.gemini.total(), 0);
}

#[tokio::test]
async fn edit_with_mask_appends_preserved_elements() {
    let harness = harness();
    let (status, body) = send(
        &harness.app,
        post_json(
            "/api/edit",
            json!({
                "image_base64": "aW1n",
                "mask_base64": "bWFzaw==",
                "prompt": "replace the sofa",
                "preserve_elements": ["lighting", "wall color"],
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("description").is_none());
    assert_eq!(body["mime_type"], json!("image/png"));
    let prompt = harness.openai.last_prompt.lock().unwrap().clone();
    assert_eq!(
        prompt.as_deref(),
        Some("replace the sofa. Keep the following unchanged: lighting, wall color.")
    );
}

#[tokio::test]
async fn semantic_edit_always_uses_gemini() {
    let harness = harness();
    let (status, body) = send(
        &harness.app,
        post_json(
            "/api/edit/semantic",
            json!({
                "image_base64": "aW1n",
                "prompt": "change the blue sofa to brown",
                "preserve_description": "Keep lighting unchanged",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["image_base64"], json!("aW1hZ2U="));
    assert_eq!(harness.gemini.edit.load(Ordering::SeqCst), 1);
    assert_eq!(harness.openai.total(), 0);
    let prompt = harness.gemini.last_prompt.lock().unwrap().clone();
    assert_eq!(
        prompt.as_deref(),
        Some("change the blue sofa to brown. Keep lighting unchanged")
    );
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let harness = harness();
    let cases = [
        json!({ "prompt": "x", "quality": "ultra" }),
        json!({ "prompt": "x", "aspect_ratio": "3:4" }),
        json!({ "prompt": "x", "model": "dall-e-3" }),
        json!({ "model": "gpt-image-1.5" }),
        json!({ "prompt": "   " }),
    ];
    for case in cases {
        let (status, body) = send(&harness.app, post_json("/api/generate", case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case: {case}");
        assert!(body["error"].is_string(), "case: {case}");
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/edit/semantic")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&harness.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.openai.total() + harness.gemini.total(), 0);
}

#[tokio::test]
async fn provider_failure_is_internal_error() {
    let harness = harness_with(true);
    let (status, body) = send(
        &harness.app,
        post_json("/api/generate", json!({ "prompt": "a sunroom" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "Stub request failed (502): upstream unavailable" })
    );
}

#[tokio::test]
async fn allowed_origin_gets_credentialed_cors_headers() {
    let harness = harness();
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, FRONTEND)
        .body(Body::empty())
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], FRONTEND);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::VARY], "Origin");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_origin_gets_no_cors_headers() {
    let harness = harness();
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = harness.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn preflight_is_answered_for_allowed_origin_only() {
    let harness = harness();
    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/generate")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    };

    let response = harness.app.clone().oneshot(preflight(FRONTEND)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], FRONTEND);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "600");
    assert!(headers[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .contains("POST"));

    let response = harness
        .app
        .clone()
        .oneshot(preflight("https://evil.example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Disallowed CORS origin");
    assert_eq!(harness.openai.total(), 0);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let harness = harness();
    let huge = "A".repeat(2 * 1024 * 1024);
    let (status, _) = send(
        &harness.app,
        post_json("/api/edit/semantic", json!({ "image_base64": huge, "prompt": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(harness.gemini.total(), 0);
}
