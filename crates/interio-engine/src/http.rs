use reqwest::Response as HttpResponse;
use serde_json::Value;

use crate::error::{truncate_text, ProviderError};

pub(crate) async fn response_json_or_error(
    provider: &'static str,
    endpoint: &str,
    response: HttpResponse,
) -> Result<Value, ProviderError> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .await
        .map_err(|source| ProviderError::Transport {
            provider,
            endpoint: endpoint.to_string(),
            source,
        })?;
    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: code,
            body: truncate_text(&body, 512),
        });
    }
    serde_json::from_str(&body).map_err(|source| ProviderError::InvalidJson { provider, source })
}

/// Trims whitespace and trailing slashes; falls back to `default` when blank.
pub(crate) fn normalize_api_base(raw: &str, default: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return default.to_string();
    }
    trimmed.to_string()
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
