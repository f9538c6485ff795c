mod error;
mod gemini;
mod http;
mod media;
mod normalize;
mod openai;
mod prompts;
mod provider;
mod router;

pub use error::{error_chain_text, ProviderError};
pub use gemini::{GeminiProvider, DEFAULT_GEMINI_API_BASE};
pub use normalize::{edit_response, generate_response};
pub use openai::{OpenAiProvider, DEFAULT_OPENAI_API_BASE};
pub use prompts::{interior_design_prompt, with_preserve_description, with_preserved_elements};
pub use provider::{
    default_provider_registry, ImageProvider, ImageProviderRegistry, ProviderEditRequest,
    ProviderGenerateRequest, ProviderImageResult, ProviderSettings,
};
pub use router::{ImageRouter, RouteError, SEMANTIC_EDIT_MODEL};
