pub mod error;
pub mod recipe;
pub mod registry;
pub mod template;

pub use error::{RecipeError, Result};
pub use recipe::{
    CONTEXT_PLACEHOLDER, GenerationDefaults, LongInputProfile, ModelProfile, ModelTier,
    OutputFormat, Recipe, built_in_recipes,
};
pub use registry::{RecipeRegistry, default_registry};
pub use template::{PromptTemplate, TemplateError};
