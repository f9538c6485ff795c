use std::fmt;

use serde::{Deserialize, Serialize};

/// Model selector accepted by the API. Each selector is served by exactly one
/// upstream provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum AiModel {
    #[default]
    #[serde(rename = "gpt-image-1.5")]
    GptImage,
    #[serde(rename = "gemini-flash")]
    GeminiFlash,
}

/// How a provider expects edit regions to be described.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Edits need a pixel mask whose transparent regions mark the edit area.
    Masked,
    /// Edits are driven by the prompt alone.
    Semantic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub display_name: &'static str,
    pub provider: &'static str,
    pub upstream_model: &'static str,
}

impl AiModel {
    pub const ALL: [AiModel; 2] = [AiModel::GptImage, AiModel::GeminiFlash];

    pub fn as_str(self) -> &'static str {
        match self {
            AiModel::GptImage => "gpt-image-1.5",
            AiModel::GeminiFlash => "gemini-flash",
        }
    }

    pub fn spec(self) -> ModelSpec {
        match self {
            AiModel::GptImage => ModelSpec {
                display_name: "GPT Image",
                provider: "openai",
                upstream_model: "gpt-image-1.5",
            },
            AiModel::GeminiFlash => ModelSpec {
                display_name: "Gemini Flash",
                provider: "gemini",
                upstream_model: "gemini-2.5-flash-image",
            },
        }
    }
}

impl fmt::Display for AiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
