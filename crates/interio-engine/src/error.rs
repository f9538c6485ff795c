use std::error::Error as StdError;

/// Failure of a provider call, or of the provider to return what it promised.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} API key is not configured")]
    MissingApiKey { provider: &'static str },

    #[error("{provider} edits require a mask")]
    MissingMask { provider: &'static str },

    #[error("{field} is not valid base64")]
    InvalidAttachment {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{provider} request failed ({endpoint})")]
    Transport {
        provider: &'static str,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed ({status}): {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned invalid JSON payload")]
    InvalidJson {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} response contained no image data")]
    MissingImage { provider: &'static str },
}

/// Joins an error's source chain into one line, skipping repeated messages.
/// Returns `None` when the error has no sources.
pub fn error_chain_text(err: &(dyn StdError + 'static), max_chars: usize) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut cause = err.source();
    while let Some(current) = cause {
        let text = current.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty()
            && parts
                .last()
                .map(|existing| existing != trimmed)
                .unwrap_or(true)
        {
            parts.push(trimmed.to_string());
        }
        cause = current.source();
    }
    if parts.is_empty() {
        return None;
    }
    Some(truncate_text(&parts.join(" | caused by: "), max_chars))
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
