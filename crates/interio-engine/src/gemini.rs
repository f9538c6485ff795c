use async_trait::async_trait;
use interio_contracts::models::EditMode;
use reqwest::Client as HttpClient;
use serde_json::{json, Map, Value};

use crate::error::ProviderError;
use crate::http::{non_empty, normalize_api_base, response_json_or_error};
use crate::media::sniff_base64_mime;
use crate::prompts::semantic_edit_prompt;
use crate::provider::{
    ImageProvider, ProviderEditRequest, ProviderGenerateRequest, ProviderImageResult,
};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "Gemini";
const EDIT_ASPECT_RATIO: &str = "16:9";

/// `generateContent` adapter. Edits are instruction-driven, no mask.
pub struct GeminiProvider {
    api_base: String,
    api_key: Option<String>,
    model: String,
    http: HttpClient,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>, api_base: &str, model: impl Into<String>) -> Self {
        Self {
            api_base: normalize_api_base(api_base, DEFAULT_GEMINI_API_BASE),
            api_key: non_empty(api_key),
            model: model.into(),
            http: HttpClient::new(),
        }
    }

    /// Ratio token passed through `imageConfig`; unknown tokens become 16:9.
    pub fn aspect_ratio_for(aspect_ratio: &str) -> &'static str {
        match aspect_ratio {
            "1:1" => "1:1",
            "16:9" => "16:9",
            "9:16" => "9:16",
            "4:3" => "4:3",
            "3:4" => "3:4",
            _ => "16:9",
        }
    }

    fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey { provider: PROVIDER })
    }

    fn payload(parts: Vec<Value>, modalities: &[&str], aspect_ratio: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseModalities": modalities,
                "imageConfig": { "aspectRatio": aspect_ratio },
            },
        })
    }

    async fn generate_content(&self, payload: &Value) -> Result<Value, ProviderError> {
        let api_key = self.api_key()?;
        let endpoint = self.endpoint();
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(payload)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                endpoint: endpoint.clone(),
                source,
            })?;
        response_json_or_error(PROVIDER, &endpoint, response).await
    }

    fn first_candidate_parts(response_payload: &Value) -> Vec<Value> {
        response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    fn inline_image(part: &Value) -> Option<(String, Option<String>)> {
        let inline: &Map<String, Value> = part
            .get("inlineData")
            .or_else(|| part.get("inline_data"))
            .and_then(Value::as_object)?;
        let data = inline
            .get("data")
            .and_then(Value::as_str)
            .filter(|data| !data.is_empty())?;
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Some((data.to_string(), mime_type))
    }

    /// First inline image plus, when `with_text` is set, the first text part.
    fn extract_image(
        response_payload: &Value,
        with_text: bool,
    ) -> Result<ProviderImageResult, ProviderError> {
        let mut image = None;
        let mut description = None;
        for part in Self::first_candidate_parts(response_payload) {
            if image.is_none() {
                image = Self::inline_image(&part);
            }
            if with_text && description.is_none() {
                description = part
                    .get("text")
                    .and_then(Value::as_str)
                    .filter(|text| !text.trim().is_empty())
                    .map(str::to_string);
            }
            if image.is_some() && (!with_text || description.is_some()) {
                break;
            }
        }

        let Some((image_base64, mime_type)) = image else {
            return Err(ProviderError::MissingImage { provider: PROVIDER });
        };
        Ok(ProviderImageResult {
            image_base64,
            mime_type,
            description,
            token_usage: None,
        })
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn edit_mode(&self) -> EditMode {
        EditMode::Semantic
    }

    async fn generate(
        &self,
        request: &ProviderGenerateRequest,
    ) -> Result<ProviderImageResult, ProviderError> {
        let aspect_ratio = Self::aspect_ratio_for(request.aspect_ratio.as_str());
        let payload = Self::payload(
            vec![json!({ "text": request.prompt })],
            &["TEXT", "IMAGE"],
            aspect_ratio,
        );

        tracing::info!(model = %self.model, aspect_ratio, "Gemini image generation");
        let response_payload = self.generate_content(&payload).await?;
        let result = Self::extract_image(&response_payload, true)?;
        tracing::debug!(
            has_description = result.description.is_some(),
            "Gemini generation complete"
        );
        Ok(result)
    }

    async fn edit(
        &self,
        request: &ProviderEditRequest,
    ) -> Result<ProviderImageResult, ProviderError> {
        let image_base64 = request.image_base64.trim();
        let mime_type = sniff_base64_mime(image_base64);
        let payload = Self::payload(
            vec![
                json!({ "inlineData": { "mimeType": mime_type, "data": image_base64 } }),
                json!({ "text": semantic_edit_prompt(&request.prompt) }),
            ],
            &["IMAGE"],
            EDIT_ASPECT_RATIO,
        );

        tracing::info!(model = %self.model, input_mime = mime_type, "Gemini semantic edit");
        let response_payload = self.generate_content(&payload).await?;
        Self::extract_image(&response_payload, false)
    }
}
