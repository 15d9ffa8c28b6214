use axum::{http::StatusCode, middleware::from_fn, response::Json, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::infrastructure::config::AppConfig;
use crate::presentation::{
    middleware::{authenticate, JwtService},
    routes,
};

/// Create the main application router
pub fn create_app(config: &AppConfig) -> Router {
    let jwt = JwtService::new_with_validation(&config.auth.jwt_secret, config.auth.audience.as_deref());

    let middleware_stack = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_seconds),
        ))
        .layer(from_fn(authenticate(jwt.clone())));

    routes::create_routes(&jwt, config.guards)
        .fallback(not_found_handler)
        .layer(middleware_stack)
}

/// Handler for 404 not found
async fn not_found_handler() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": "The requested resource was not found"
        })),
    )
}

/// Start the HTTP server
///
/// # Errors
/// Returns an error if the address is invalid or the server fails to start
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_app(&config);
    let addr = config.server.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::{
        AuthConfig, GuardConfig, LogFormat, LoggingConfig, RuntimeMode, ServerConfig,
    };
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request},
    };
    use tower::ServiceExt;

    fn create_test_config() -> AppConfig {
        AppConfig {
            mode: RuntimeMode::Local,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                request_timeout_seconds: 5,
            },
            auth: AuthConfig { jwt_secret: "test-secret".to_string(), audience: None },
            guards: GuardConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                filter: None,
                format: LogFormat::Json,
            },
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_app(&create_test_config());

        let request = Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_not_found_handler() {
        let (status, json_response) = not_found_handler().await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_response["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = create_app(&create_test_config());

        let request = Request::builder().uri("/non-existent-route").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_guarded_route_rejects_anonymous_caller() {
        let app = create_app(&create_test_config());

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/recipes")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("title=Soup&servings=2"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
