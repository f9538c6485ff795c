use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use interio_contracts::models::{AiModel, EditMode};
use interio_contracts::requests::{AspectRatio, Quality};
use interio_contracts::responses::TokenUsage;

use crate::error::ProviderError;
use crate::gemini::{GeminiProvider, DEFAULT_GEMINI_API_BASE};
use crate::openai::{OpenAiProvider, DEFAULT_OPENAI_API_BASE};

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderGenerateRequest {
    pub prompt: String,
    pub quality: Quality,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEditRequest {
    pub image_base64: String,
    pub mask_base64: Option<String>,
    pub prompt: String,
    pub quality: Quality,
}

/// What an adapter got back, before normalisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderImageResult {
    pub image_base64: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub token_usage: Option<TokenUsage>,
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn edit_mode(&self) -> EditMode;
    async fn generate(
        &self,
        request: &ProviderGenerateRequest,
    ) -> Result<ProviderImageResult, ProviderError>;
    async fn edit(&self, request: &ProviderEditRequest)
        -> Result<ProviderImageResult, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ImageProviderRegistry {
    providers: BTreeMap<AiModel, Arc<dyn ImageProvider>>,
}

impl ImageProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: ImageProvider + 'static>(&mut self, model: AiModel, provider: P) {
        self.register_shared(model, Arc::new(provider));
    }

    pub fn register_shared(&mut self, model: AiModel, provider: Arc<dyn ImageProvider>) {
        self.providers.insert(model, provider);
    }

    pub fn get(&self, model: AiModel) -> Option<&dyn ImageProvider> {
        self.providers.get(&model).map(|provider| provider.as_ref())
    }

    pub fn models(&self) -> Vec<AiModel> {
        self.providers.keys().copied().collect()
    }
}

/// Credentials and endpoints for the built-in providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            gemini_api_key: None,
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
        }
    }
}

pub fn default_provider_registry(settings: &ProviderSettings) -> ImageProviderRegistry {
    let mut registry = ImageProviderRegistry::new();
    registry.register(
        AiModel::GptImage,
        OpenAiProvider::new(
            settings.openai_api_key.clone(),
            &settings.openai_api_base,
            AiModel::GptImage.spec().upstream_model,
        ),
    );
    registry.register(
        AiModel::GeminiFlash,
        GeminiProvider::new(
            settings.gemini_api_key.clone(),
            &settings.gemini_api_base,
            AiModel::GeminiFlash.spec().upstream_model,
        ),
    );
    registry
}
