use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
    ACCESS_CONTROL_REQUEST_METHOD, ORIGIN, VARY,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

const ALLOWED_METHODS: &str = "DELETE, GET, HEAD, OPTIONS, PATCH, POST, PUT";
const PREFLIGHT_MAX_AGE: &str = "600";

/// Origins allowed to call the API with credentials. `*` admits any origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_any: bool,
    origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: Vec<String> = origins.into_iter().map(Into::into).collect();
        Self {
            allow_any: origins.iter().any(|origin| origin == "*"),
            origins,
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allow_any || self.origins.iter().any(|allowed| allowed == origin)
    }
}

fn credential_headers(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
}

fn preflight(policy: &CorsPolicy, origin: HeaderValue, request: &Request) -> Response {
    let allowed = origin
        .to_str()
        .map(|origin| policy.allows(origin))
        .unwrap_or(false);
    if !allowed {
        tracing::warn!(origin = ?origin, "rejected CORS preflight");
        return (StatusCode::BAD_REQUEST, "Disallowed CORS origin").into_response();
    }

    let mut response = (StatusCode::OK, "OK").into_response();
    let headers = response.headers_mut();
    credential_headers(headers, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(PREFLIGHT_MAX_AGE));
    if let Some(requested) = request.headers().get(ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
    }
    response
}

/// Answers preflights directly and decorates responses to allowed origins.
pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(ORIGIN).cloned();
    let Some(origin) = origin else {
        return next.run(request).await;
    };

    if request.method() == Method::OPTIONS
        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
    {
        return preflight(&policy, origin, &request);
    }

    let allowed = origin
        .to_str()
        .map(|value| policy.allows(value))
        .unwrap_or(false);
    let mut response = next.run(request).await;
    if allowed {
        credential_headers(response.headers_mut(), origin);
    }
    response
}
