use serde::{Deserialize, Serialize};

use crate::models::AiModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Standard,
    ];

    /// Ratio token in `W:H` form, as providers expect it.
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
        }
    }
}

/// `POST /api/generate` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: AiModel,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Accepted for compatibility; responses are never streamed.
    #[serde(default)]
    pub stream: bool,
}

/// `POST /api/edit` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    pub image_base64: String,
    #[serde(default)]
    pub mask_base64: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub model: AiModel,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub preserve_elements: Option<Vec<String>>,
}

/// `POST /api/edit/semantic` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticEditRequest {
    pub image_base64: String,
    pub prompt: String,
    #[serde(default)]
    pub preserve_description: Option<String>,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_text("prompt", &self.prompt)
    }
}

impl EditRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_text("image_base64", &self.image_base64)?;
        require_text("prompt", &self.prompt)
    }

    /// The mask, ignoring a blank string sent in its place.
    pub fn mask(&self) -> Option<&str> {
        self.mask_base64
            .as_deref()
            .map(str::trim)
            .filter(|mask| !mask.is_empty())
    }
}

impl SemanticEditRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_text("image_base64", &self.image_base64)?;
        require_text("prompt", &self.prompt)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("'{field}' must not be empty."));
    }
    Ok(())
}
