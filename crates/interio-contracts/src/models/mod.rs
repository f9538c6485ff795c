mod registry;

pub use registry::{AiModel, EditMode, ModelSpec};
