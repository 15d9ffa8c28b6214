use axum::{
    http::Method,
    middleware::from_fn,
    routing::{any, get},
    Router,
};

use crate::infrastructure::config::GuardConfig;
use crate::presentation::{
    forms::{IngredientForm, RecipeForm, RecipeSearchForm, TagForm},
    handlers::recipes,
    middleware::{
        clean_form_with, clean_forms_with, method_exclusive, require_auth, BearerAuth,
        ExtensionAuth, JwtService, UserContext,
    },
};

/// Create all application routes
///
/// Guards are layered per route; the last `.layer` call runs first, so each
/// chain reads bottom-up: method, then authentication, then validation.
pub fn create_routes(jwt: &JwtService, guards: GuardConfig) -> Router {
    Router::new().route("/api/v1/health", get(recipes::health)).merge(recipe_routes(jwt, guards))
}

fn recipe_routes(jwt: &JwtService, guards: GuardConfig) -> Router {
    Router::new()
        .route(
            "/api/v1/recipes/search",
            any(recipes::search_recipes)
                .layer(from_fn(clean_form_with::<RecipeSearchForm>(guards)))
                .layer(from_fn(method_exclusive(Method::GET))),
        )
        .route(
            "/api/v1/recipes",
            any(recipes::create_recipe)
                .layer(from_fn(clean_form_with::<RecipeForm>(guards)))
                .layer(from_fn(require_auth(ExtensionAuth::<UserContext>::new())))
                .layer(from_fn(method_exclusive(Method::POST))),
        )
        .route(
            "/api/v1/recipes/ingredients",
            any(recipes::add_ingredients)
                .layer(from_fn(clean_forms_with::<IngredientForm>("ingredients", true, guards)))
                .layer(from_fn(require_auth(BearerAuth::new(jwt.clone()))))
                .layer(from_fn(method_exclusive(Method::POST))),
        )
        .route(
            "/api/v1/recipes/tags",
            any(recipes::set_tags)
                .layer(from_fn(clean_forms_with::<TagForm>("tags", false, guards)))
                .layer(from_fn(method_exclusive(Method::POST))),
        )
}
