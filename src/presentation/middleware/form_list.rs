use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error};

use super::{error::GuardError, input::read_input, GuardFuture};
use crate::domain::{BoundForm, Form, FormData, FormInput};
use crate::infrastructure::config::GuardConfig;

/// Cleaned list produced by [`clean_forms`], in submission order
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedDataList<F>(pub Vec<F>);

impl<F, S> FromRequestParts<S> for CleanedDataList<F>
where
    F: Form + Clone,
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CleanedDataList<F>>().cloned().ok_or_else(|| {
            error!(form = std::any::type_name::<F>(), "CleanedDataList requested without clean_forms");
            GuardError::MissingContext { context: "CleanedDataList" }
        })
    }
}

/// Validate every element submitted under `field[]` against `F`.
///
/// Each element is a JSON-encoded object, which lets flat form encoding carry
/// a list of nested records. Elements are checked in order and the first
/// malformed or invalid one rejects the whole request with 400. When nothing
/// was submitted the request is rejected if `required`, otherwise the handler
/// receives an empty list.
pub fn clean_forms<F: Form + Clone>(
    field: &str,
    required: bool,
) -> impl Fn(Request, Next) -> GuardFuture + Clone + use<F> {
    clean_forms_with::<F>(field, required, GuardConfig::default())
}

/// [`clean_forms`] with explicit guard settings
pub fn clean_forms_with<F: Form + Clone>(
    field: &str,
    required: bool,
    config: GuardConfig,
) -> impl Fn(Request, Next) -> GuardFuture + Clone + use<F> {
    let field: Arc<str> = Arc::from(field);
    move |request: Request, next: Next| {
        let field = Arc::clone(&field);
        Box::pin(async move {
            let (mut request, input) = read_input(request, config.max_body_size).await?;

            let cleaned = clean_list::<F>(&field, required, input.data())?;
            debug!(field = %field, count = cleaned.len(), "Form list accepted");
            request.extensions_mut().insert(CleanedDataList(cleaned));

            Ok(next.run(request).await)
        })
    }
}

fn clean_list<F: Form>(field: &str, required: bool, data: &FormData) -> Result<Vec<F>, GuardError> {
    let elements = data.get_all(&format!("{field}[]"));

    if elements.is_empty() {
        if required {
            return Err(GuardError::RequiredFieldMissing { field: field.to_string() });
        }
        return Ok(Vec::new());
    }

    // collect() stops at the first Err, nothing after a bad element is bound
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let object = decode_element(element).map_err(|reason| {
                debug!(field, index, %reason, "Malformed list element");
                GuardError::MalformedElement { field: field.to_string(), index, reason }
            })?;

            let input = FormInput::new(FormData::from_json_object(object));
            BoundForm::<F>::bind(&input).into_result().map_err(|errors| {
                debug!(field, index, %errors, "List element rejected");
                GuardError::ValidationFailed { errors }
            })
        })
        .collect()
}

/// Decode one submitted element into a JSON object
fn decode_element(element: &Value) -> Result<Map<String, Value>, String> {
    let decoded = match element {
        Value::String(raw) => serde_json::from_str::<Value>(raw).map_err(|e| e.to_string())?,
        other => other.clone(),
    };

    match decoded {
        Value::Object(object) => Ok(object),
        _ => Err("expected a JSON object".to_string()),
    }
}
