use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
};
use tracing::{debug, error};

use super::{error::GuardError, input::read_input, GuardFuture};
use crate::domain::{BoundForm, Form};
use crate::infrastructure::config::GuardConfig;

/// Cleaned data produced by [`clean_form`], handed to the handler
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedData<F>(pub F);

impl<F, S> FromRequestParts<S> for CleanedData<F>
where
    F: Form + Clone,
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CleanedData<F>>().cloned().ok_or_else(|| {
            error!(form = std::any::type_name::<F>(), "CleanedData requested without clean_form");
            GuardError::MissingContext { context: "CleanedData" }
        })
    }
}

/// Validate the request input against `F` before the handler runs.
///
/// POST requests are validated from their body parameters, every other
/// method from the query string. Invalid input is answered with 400 and the
/// form's field errors; valid input reaches the handler as [`CleanedData<F>`].
pub fn clean_form<F: Form + Clone>() -> impl Fn(Request, Next) -> GuardFuture + Clone {
    clean_form_with::<F>(GuardConfig::default())
}

/// [`clean_form`] with explicit guard settings
pub fn clean_form_with<F: Form + Clone>(
    config: GuardConfig,
) -> impl Fn(Request, Next) -> GuardFuture + Clone {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let (mut request, input) = read_input(request, config.max_body_size).await?;

            let cleaned = BoundForm::<F>::bind(&input).into_result().map_err(|errors| {
                debug!(form = std::any::type_name::<F>(), %errors, "Form rejected");
                GuardError::ValidationFailed { errors }
            })?;
            request.extensions_mut().insert(CleanedData(cleaned));

            Ok(next.run(request).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::forms::PersonForm;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Method, StatusCode},
        routing::any,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tower::ServiceExt;

    fn app(calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/people",
                any(move |CleanedData(person): CleanedData<PersonForm>| {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"name": person.name, "age": person.age}))
                    }
                }),
            )
            .layer(axum::middleware::from_fn(clean_form::<PersonForm>()))
    }

    fn post(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/people")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_valid_post_injects_typed_cleaned_data() {
        let calls = Arc::new(AtomicUsize::new(0));

        let response = app(Arc::clone(&calls)).oneshot(post("name=a&age=30")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"name": "a", "age": 30}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_post_returns_field_errors() {
        let calls = Arc::new(AtomicUsize::new(0));

        let response = app(Arc::clone(&calls)).oneshot(post("name=&age=abc")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({
                "name": ["This field is required."],
                "age": ["Enter a whole number."]
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_validates_query_string() {
        let calls = Arc::new(AtomicUsize::new(0));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/people?name=b&age=41")
            .body(Body::empty())
            .unwrap();

        let response = app(Arc::clone(&calls)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"name": "b", "age": 41}));
    }

    #[tokio::test]
    async fn test_post_does_not_read_query_string() {
        let calls = Arc::new(AtomicUsize::new(0));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/people?name=b&age=41")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::empty())
            .unwrap();

        let response = app(Arc::clone(&calls)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_extractor_without_guard_is_server_error() {
        let app = Router::new().route(
            "/people",
            any(|CleanedData(person): CleanedData<PersonForm>| async move { person.name }),
        );
        let request = Request::builder().uri("/people").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
