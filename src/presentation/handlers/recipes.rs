use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::info;

use crate::presentation::{
    forms::{IngredientForm, RecipeForm, RecipeSearchForm, TagForm},
    middleware::{CleanedData, CleanedDataList, UserContext},
};

/// Liveness endpoint
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "api-guards-demo"
    }))
}

/// Search recipes from query parameters
pub async fn search_recipes(CleanedData(search): CleanedData<RecipeSearchForm>) -> Json<Value> {
    Json(json!({ "search": search, "results": [] }))
}

/// Create a recipe for the authenticated caller
pub async fn create_recipe(
    user: UserContext,
    CleanedData(recipe): CleanedData<RecipeForm>,
) -> (StatusCode, Json<Value>) {
    info!(author = %user.subject, title = %recipe.title, "Recipe created");
    (StatusCode::CREATED, Json(json!({ "recipe": recipe, "author": user.subject })))
}

/// Attach a list of ingredients
pub async fn add_ingredients(
    CleanedDataList(ingredients): CleanedDataList<IngredientForm>,
) -> Json<Value> {
    Json(json!({ "count": ingredients.len(), "ingredients": ingredients }))
}

/// Replace the tag list; an absent list clears all tags
pub async fn set_tags(CleanedDataList(tags): CleanedDataList<TagForm>) -> Json<Value> {
    let labels: Vec<String> = tags.into_iter().map(|tag| tag.label).collect();
    Json(json!({ "tags": labels }))
}
