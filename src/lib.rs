#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(warnings)]
// Allow some overly strict pedantic lints for middleware code
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]

//! API Guards
//!
//! Composable request guards for JSON APIs built on axum. Handlers declare
//! the preconditions a request must meet (HTTP method, authenticated caller,
//! valid form input, valid list of nested records) and receive typed cleaned
//! data; violations short-circuit into well-formed 405/401/400 responses.

pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use domain::{BoundForm, FieldErrors, Files, Form, FormCleaner, FormData, FormInput, UploadedFile};
pub use presentation::middleware::{
    clean_form, clean_form_with, clean_forms, clean_forms_with, method_exclusive, require_auth,
    AuthProvider, CleanedData, CleanedDataList, GuardError,
};
