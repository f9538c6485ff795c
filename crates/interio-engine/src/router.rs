use interio_contracts::models::{AiModel, EditMode};
use interio_contracts::requests::{EditRequest, GenerateRequest, SemanticEditRequest};
use interio_contracts::responses::{EditResponse, GenerateResponse};

use crate::error::ProviderError;
use crate::normalize::{edit_response, generate_response};
use crate::prompts::{interior_design_prompt, with_preserve_description, with_preserved_elements};
use crate::provider::{
    ImageProvider, ImageProviderRegistry, ProviderEditRequest, ProviderGenerateRequest,
};

/// Model used for instruction-only edits.
pub const SEMANTIC_EDIT_MODEL: AiModel = AiModel::GeminiFlash;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("{0}")]
    Validation(String),

    #[error("no provider registered for model '{0}'")]
    Unavailable(&'static str),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Validates requests, rewrites prompts and dispatches to exactly one provider.
#[derive(Clone)]
pub struct ImageRouter {
    registry: ImageProviderRegistry,
}

impl ImageRouter {
    pub fn new(registry: ImageProviderRegistry) -> Self {
        Self { registry }
    }

    fn provider(&self, model: AiModel) -> Result<&dyn ImageProvider, RouteError> {
        let provider = self
            .registry
            .get(model)
            .ok_or(RouteError::Unavailable(model.as_str()))?;
        let expected = model.spec().provider;
        if provider.name() != expected {
            tracing::debug!(
                model = %model,
                expected,
                registered = provider.name(),
                "model served by a non-default provider"
            );
        }
        Ok(provider)
    }

    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, RouteError> {
        request.validate().map_err(RouteError::Validation)?;
        let provider = self.provider(request.model)?;
        if request.stream {
            tracing::debug!(
                model = %request.model,
                "stream requested; returning a single response"
            );
        }

        let provider_request = ProviderGenerateRequest {
            prompt: interior_design_prompt(&request.prompt),
            quality: request.quality,
            aspect_ratio: request.aspect_ratio,
        };
        tracing::info!(
            model = %request.model,
            provider = provider.name(),
            aspect_ratio = request.aspect_ratio.as_str(),
            "routing generation"
        );
        let result = provider.generate(&provider_request).await?;
        Ok(generate_response(result))
    }

    pub async fn edit(&self, request: &EditRequest) -> Result<EditResponse, RouteError> {
        request.validate().map_err(RouteError::Validation)?;
        let provider = self.provider(request.model)?;
        let mask = request.mask();
        if provider.edit_mode() == EditMode::Masked && mask.is_none() {
            return Err(RouteError::Validation(format!(
                "{} requires a mask for editing. Use the semantic edit endpoint for {}.",
                request.model.spec().display_name,
                SEMANTIC_EDIT_MODEL.spec().display_name,
            )));
        }

        let preserve = request.preserve_elements.as_deref().unwrap_or_default();
        let provider_request = ProviderEditRequest {
            image_base64: request.image_base64.clone(),
            mask_base64: mask.map(str::to_string),
            prompt: with_preserved_elements(&request.prompt, preserve),
            quality: request.quality,
        };
        tracing::info!(
            model = %request.model,
            provider = provider.name(),
            masked = provider_request.mask_base64.is_some(),
            preserved = preserve.len(),
            "routing edit"
        );
        let result = provider.edit(&provider_request).await?;
        Ok(edit_response(result))
    }

    pub async fn semantic_edit(
        &self,
        request: &SemanticEditRequest,
    ) -> Result<EditResponse, RouteError> {
        request.validate().map_err(RouteError::Validation)?;
        let provider = self.provider(SEMANTIC_EDIT_MODEL)?;

        let provider_request = ProviderEditRequest {
            image_base64: request.image_base64.clone(),
            mask_base64: None,
            prompt: with_preserve_description(
                &request.prompt,
                request.preserve_description.as_deref(),
            ),
            quality: Default::default(),
        };
        tracing::info!(provider = provider.name(), "routing semantic edit");
        let result = provider.edit(&provider_request).await?;
        Ok(edit_response(result))
    }
}
