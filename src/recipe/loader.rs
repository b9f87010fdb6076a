//! Recipe file loading.

use crate::error::{RecipeError, Result};
use crate::recipe::model::Recipe;
use crate::recipe::parser::parse_recipe;
use std::fs;
use std::path::Path;

/// Read a recipe file from disk.
///
/// # Errors
///
/// Returns `RecipeNotFound` if the file doesn't exist, `Io` for other read
/// failures, and any parse error from [`parse_recipe`].
pub fn read_recipe_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RecipeError::RecipeNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RecipeError::Io(e)
        }
    })
}

/// Load and parse a recipe file.
pub fn load_recipe(path: &Path) -> Result<Recipe> {
    let content = read_recipe_file(path)?;
    let recipe = parse_recipe(&content)?;
    tracing::debug!(
        "Loaded recipe '{}' ({} steps) from {}",
        recipe.name,
        recipe.steps.len(),
        path.display()
    );
    Ok(recipe)
}
