//! Prompt templates applied before a request reaches a provider.

/// Biases generations toward photorealistic architectural photography.
pub fn interior_design_prompt(prompt: &str) -> String {
    format!(
        "Professional interior design photograph: {prompt}. \
         Photorealistic, well-lit, high quality architectural photography."
    )
}

/// Appends the preservation clause for masked edits. An empty list leaves the
/// prompt untouched.
pub fn with_preserved_elements(prompt: &str, elements: &[String]) -> String {
    if elements.is_empty() {
        return prompt.to_string();
    }
    format!(
        "{prompt}. Keep the following unchanged: {}.",
        elements.join(", ")
    )
}

/// Appends a free-text preservation description verbatim. A blank
/// description leaves the prompt untouched.
pub fn with_preserve_description(prompt: &str, description: Option<&str>) -> String {
    match description.filter(|text| !text.trim().is_empty()) {
        Some(description) => format!("{prompt}. {description}"),
        None => prompt.to_string(),
    }
}

pub(crate) fn masked_edit_prompt(prompt: &str) -> String {
    format!(
        "Interior design edit: {prompt}. Maintain photorealistic quality, consistent lighting, \
         and natural integration with existing elements."
    )
}

pub(crate) fn semantic_edit_prompt(prompt: &str) -> String {
    format!(
        "Using the provided interior image, make the following change: {prompt}. \
         Maintain photorealistic quality, consistent lighting, and preserve all elements \
         not explicitly mentioned in the edit request."
    )
}
