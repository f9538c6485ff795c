use async_trait::async_trait;
use interio_contracts::models::EditMode;
use interio_contracts::responses::{TokenUsage, DEFAULT_MIME_TYPE};
use reqwest::multipart::{Form as MultipartForm, Part as MultipartPart};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::http::{non_empty, normalize_api_base, response_json_or_error};
use crate::media::{decode_attachment, image_kind};
use crate::prompts::masked_edit_prompt;
use crate::provider::{
    ImageProvider, ProviderEditRequest, ProviderGenerateRequest, ProviderImageResult,
};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "OpenAI";

/// Images API adapter: masked edits, one PNG per call.
pub struct OpenAiProvider {
    api_base: String,
    api_key: Option<String>,
    model: String,
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(alias = "prompt_tokens")]
    input_tokens: u64,
    #[serde(alias = "completion_tokens")]
    output_tokens: u64,
    total_tokens: Option<u64>,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, api_base: &str, model: impl Into<String>) -> Self {
        Self {
            api_base: normalize_api_base(api_base, DEFAULT_OPENAI_API_BASE),
            api_key: non_empty(api_key),
            model: model.into(),
            http: HttpClient::new(),
        }
    }

    /// Nearest supported pixel size for a ratio token. There is no 4:3 size,
    /// so it borrows the landscape one.
    pub fn size_for_aspect_ratio(aspect_ratio: &str) -> &'static str {
        match aspect_ratio {
            "1:1" => "1024x1024",
            "16:9" => "1536x1024",
            "9:16" => "1024x1536",
            "4:3" => "1536x1024",
            _ => "1024x1024",
        }
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey { provider: PROVIDER })
    }

    async fn post_json(
        &self,
        endpoint: &str,
        api_key: &str,
        payload: &Value,
    ) -> Result<Value, ProviderError> {
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                endpoint: endpoint.to_string(),
                source,
            })?;
        response_json_or_error(PROVIDER, endpoint, response).await
    }

    fn attachment_part(
        endpoint: &str,
        field: &'static str,
        bytes: Vec<u8>,
    ) -> Result<MultipartPart, ProviderError> {
        let (mime, ext) = image_kind(&bytes);
        MultipartPart::bytes(bytes)
            .file_name(format!("{field}.{ext}"))
            .mime_str(mime)
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                endpoint: endpoint.to_string(),
                source,
            })
    }

    fn extract_image(response_payload: &Value) -> Result<ProviderImageResult, ProviderError> {
        let image_base64 = response_payload
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(|row| row.get("b64_json"))
            .and_then(Value::as_str)
            .filter(|data| !data.is_empty())
            .ok_or(ProviderError::MissingImage { provider: PROVIDER })?;

        Ok(ProviderImageResult {
            image_base64: image_base64.to_string(),
            mime_type: Some(DEFAULT_MIME_TYPE.to_string()),
            description: None,
            token_usage: Self::extract_token_usage(response_payload),
        })
    }

    fn extract_token_usage(response_payload: &Value) -> Option<TokenUsage> {
        let usage = response_payload.get("usage").filter(|usage| !usage.is_null())?;
        match serde_json::from_value::<OpenAiUsage>(usage.clone()) {
            Ok(usage) => Some(TokenUsage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                total_tokens: usage
                    .total_tokens
                    .unwrap_or(usage.input_tokens.saturating_add(usage.output_tokens)),
            }),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unrecognised OpenAI usage block");
                None
            }
        }
    }
}

#[async_trait]
impl ImageProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn edit_mode(&self) -> EditMode {
        EditMode::Masked
    }

    async fn generate(
        &self,
        request: &ProviderGenerateRequest,
    ) -> Result<ProviderImageResult, ProviderError> {
        let api_key = self.api_key()?;
        let endpoint = format!("{}/images/generations", self.api_base);
        let size = Self::size_for_aspect_ratio(request.aspect_ratio.as_str());
        let payload = json!({
            "model": self.model,
            "prompt": request.prompt,
            "n": 1,
            "size": size,
            "quality": request.quality.as_str(),
            "output_format": "png",
        });

        tracing::info!(
            model = %self.model,
            size,
            quality = request.quality.as_str(),
            "OpenAI image generation"
        );
        let response_payload = self.post_json(&endpoint, api_key, &payload).await?;
        let result = Self::extract_image(&response_payload)?;
        tracing::debug!(
            has_usage = result.token_usage.is_some(),
            "OpenAI generation complete"
        );
        Ok(result)
    }

    async fn edit(
        &self,
        request: &ProviderEditRequest,
    ) -> Result<ProviderImageResult, ProviderError> {
        let api_key = self.api_key()?;
        let Some(mask_base64) = request.mask_base64.as_deref() else {
            return Err(ProviderError::MissingMask { provider: PROVIDER });
        };
        let image_bytes = decode_attachment("image_base64", &request.image_base64)?;
        let mask_bytes = decode_attachment("mask_base64", mask_base64)?;
        let endpoint = format!("{}/images/edits", self.api_base);

        tracing::info!(
            model = %self.model,
            quality = request.quality.as_str(),
            image_bytes = image_bytes.len(),
            mask_bytes = mask_bytes.len(),
            "OpenAI image edit"
        );
        let form = MultipartForm::new()
            .text("model", self.model.clone())
            .text("prompt", masked_edit_prompt(&request.prompt))
            .text("n", "1")
            .text("quality", request.quality.as_str())
            .part("image", Self::attachment_part(&endpoint, "image", image_bytes)?)
            .part("mask", Self::attachment_part(&endpoint, "mask", mask_bytes)?);

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                endpoint: endpoint.clone(),
                source,
            })?;
        let response_payload = response_json_or_error(PROVIDER, &endpoint, response).await?;
        Self::extract_image(&response_payload)
    }
}
