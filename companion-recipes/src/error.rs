/// Errors produced while registering recipes or filling their templates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeError {
    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("duplicate recipe: {0}")]
    DuplicateRecipe(String),

    #[error("invalid template for recipe '{recipe}': {reason}")]
    InvalidTemplate { recipe: String, reason: String },

    #[error("missing template variable: {0}")]
    MissingVariable(String),
}

pub type Result<T> = std::result::Result<T, RecipeError>;
