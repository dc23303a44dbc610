use std::time::Duration;

use companion_provider::GenerationError;
use companion_recipes::RecipeError;

/// Typed failure of a pipeline run. No partial result accompanies an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    #[error("generation failed: {0}")]
    GenerationError(#[source] GenerationError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<GenerationError> for PipelineError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Timeout(after) => Self::GenerationTimeout(after),
            other => Self::GenerationError(other),
        }
    }
}

impl From<RecipeError> for PipelineError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::UnknownRecipe(id) => Self::UnknownRecipe(id),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}
