use interio_contracts::responses::{EditResponse, GenerateResponse, DEFAULT_MIME_TYPE};

use crate::provider::ProviderImageResult;

fn mime_or_default(mime_type: Option<String>) -> String {
    mime_type
        .map(|mime| mime.trim().to_string())
        .filter(|mime| !mime.is_empty())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

pub fn generate_response(result: ProviderImageResult) -> GenerateResponse {
    GenerateResponse {
        image_base64: result.image_base64,
        mime_type: mime_or_default(result.mime_type),
        description: result.description,
        token_usage: result.token_usage,
    }
}

/// Edit responses drop any description the provider produced.
pub fn edit_response(result: ProviderImageResult) -> EditResponse {
    EditResponse {
        image_base64: result.image_base64,
        mime_type: mime_or_default(result.mime_type),
        token_usage: result.token_usage,
    }
}
