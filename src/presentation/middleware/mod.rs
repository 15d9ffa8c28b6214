//! Request guards for JSON API handlers
//!
//! Each guard is an `axum::middleware::from_fn` compatible function that
//! either rejects the request with a complete response or runs the wrapped
//! handler untouched:
//! - Method restriction (405)
//! - Authentication gating (401)
//! - Single form validation (400, injects [`CleanedData`])
//! - Repeated form list validation (400, injects [`CleanedDataList`])
//!
//! Guards stack on a single route. With `.layer(a).layer(b)` the last layer
//! applied (`b`) is outermost and runs first.

use axum::response::Response;
use std::{future::Future, pin::Pin};

pub mod auth;
pub mod error;
pub mod form;
pub mod form_list;
pub mod input;
pub mod method;

/// Future returned by every guard
pub type GuardFuture = Pin<Box<dyn Future<Output = Result<Response, GuardError>> + Send>>;

// Re-export commonly used types
pub use auth::{
    authenticate, require_auth, AuthFlag, AuthProvider, AuthQuery, BearerAuth, Caller, Claims,
    ExtensionAuth, JwtError, JwtService, UserContext,
};
pub use error::GuardError;
pub use form::{clean_form, clean_form_with, CleanedData};
pub use form_list::{clean_forms, clean_forms_with, CleanedDataList};
pub use method::method_exclusive;
