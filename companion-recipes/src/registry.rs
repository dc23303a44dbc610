use crate::error::{RecipeError, Result};
use crate::recipe::{Recipe, built_in_recipes};

/// An immutable registry of recipes, keyed by recipe id.
#[derive(Debug, Clone)]
pub struct RecipeRegistry {
    recipes: Vec<Recipe>,
}

impl RecipeRegistry {
    /// Register `recipes`. Every recipe is validated and ids must be unique;
    /// any failure here is a startup error.
    pub fn new(recipes: Vec<Recipe>) -> Result<Self> {
        for (idx, recipe) in recipes.iter().enumerate() {
            recipe.validate()?;
            if recipes[..idx].iter().any(|r| r.id == recipe.id) {
                return Err(RecipeError::DuplicateRecipe(recipe.id.clone()));
            }
        }
        tracing::debug!(count = recipes.len(), "registered recipes");
        Ok(Self { recipes })
    }

    /// Look up a recipe by id.
    pub fn get(&self, recipe_id: &str) -> Result<&Recipe> {
        self.recipes
            .iter()
            .find(|r| r.id == recipe_id)
            .ok_or_else(|| RecipeError::UnknownRecipe(recipe_id.to_string()))
    }

    /// All registered recipes, in registration order.
    pub fn all(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.recipes.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// Returns a registry holding the built-in recipes.
pub fn default_registry() -> Result<RecipeRegistry> {
    RecipeRegistry::new(built_in_recipes())
}
