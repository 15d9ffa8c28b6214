use axum::{
    http::{header::ALLOW, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::domain::FieldErrors;

/// Message used when a required list field is absent
pub const LIST_FIELD_REQUIRED: &str = "This field is required";

/// Rejections produced by the guards.
///
/// Every variant resolves to a complete response; the wrapped handler never
/// runs once a guard has produced one of these.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Method not allowed, expected {allowed}")]
    MethodNotAllowed { allowed: Method },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Validation failed: {errors}")]
    ValidationFailed { errors: FieldErrors },

    #[error("Required list field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Malformed element {index} in {field}: {reason}")]
    MalformedElement { field: String, index: usize, reason: String },

    #[error("Unable to read request body: {reason}")]
    UnreadableBody { reason: String },

    #[error("Handler expected {context} but no guard provided it")]
    MissingContext { context: &'static str },
}

impl GuardError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GuardError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GuardError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GuardError::ValidationFailed { .. }
            | GuardError::RequiredFieldMissing { .. }
            | GuardError::MalformedElement { .. }
            | GuardError::UnreadableBody { .. } => StatusCode::BAD_REQUEST,
            GuardError::MissingContext { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type for logging
    pub fn error_type(&self) -> &'static str {
        match self {
            GuardError::MethodNotAllowed { .. } => "method_not_allowed",
            GuardError::Unauthenticated => "unauthenticated",
            GuardError::ValidationFailed { .. } => "validation_failed",
            GuardError::RequiredFieldMissing { .. } => "required_field_missing",
            GuardError::MalformedElement { .. } => "malformed_element",
            GuardError::UnreadableBody { .. } => "unreadable_body",
            GuardError::MissingContext { .. } => "missing_context",
        }
    }

    /// JSON body sent to the client, `None` for bodiless rejections
    pub fn body(&self) -> Option<Value> {
        match self {
            GuardError::MethodNotAllowed { .. } | GuardError::Unauthenticated => None,
            GuardError::ValidationFailed { errors } => Some(json!(errors)),
            GuardError::RequiredFieldMissing { field } => Some(json!({ field: LIST_FIELD_REQUIRED })),
            GuardError::MalformedElement { field, index, .. } => {
                Some(json!({ field: format!("Element {index} is not a valid JSON object") }))
            }
            GuardError::UnreadableBody { .. } => Some(json!(FieldErrors::single(
                crate::domain::NON_FIELD_ERRORS,
                "Unable to read request body"
            ))),
            GuardError::MissingContext { .. } => {
                Some(json!({ "error": "Internal Server Error" }))
            }
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if matches!(self, GuardError::MissingContext { .. }) {
            error!(error_type = self.error_type(), "Guard misconfiguration: {}", self);
        } else {
            debug!(error_type = self.error_type(), status = status.as_u16(), "Request rejected: {}", self);
        }

        let mut response = match self.body() {
            Some(body) => (status, Json(body)).into_response(),
            None => status.into_response(),
        };

        if let GuardError::MethodNotAllowed { allowed } = &self {
            if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
                response.headers_mut().insert(ALLOW, value);
            }
        }

        response
    }
}
