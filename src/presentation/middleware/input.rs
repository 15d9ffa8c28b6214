use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::{header::CONTENT_TYPE, Method},
};
use futures_util::stream;
use multer::{Constraints, Multipart, SizeLimit};
use serde_json::Value;
use std::convert::Infallible;
use tracing::debug;

use super::error::GuardError;
use crate::domain::{Files, FormData, FormInput, UploadedFile};

const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// Collect the raw input bag a form guard binds to.
///
/// POST requests read body parameters, every other method reads the query
/// string. The body is buffered and put back so the handler still receives it.
pub async fn read_input(
    request: Request,
    max_body_size: usize,
) -> Result<(Request, FormInput), GuardError> {
    if request.method() != Method::POST {
        let data = FormData::from_pairs(decode_pairs(request.uri().query().unwrap_or_default()));
        return Ok((request, FormInput::new(data)));
    }

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, max_body_size)
        .await
        .map_err(|e| GuardError::UnreadableBody { reason: e.to_string() })?;
    let request = Request::from_parts(parts, Body::from(bytes.clone()));

    let input = match main_type(&content_type).as_str() {
        URLENCODED => FormInput::new(FormData::from_pairs(decode_pairs_bytes(&bytes))),
        MULTIPART => read_multipart(&content_type, bytes, max_body_size).await?,
        other => {
            debug!(content_type = other, "POST body is not form encoded, using empty form data");
            FormInput::default()
        }
    };

    Ok((request, input))
}

fn main_type(content_type: &str) -> String {
    content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

fn decode_pairs(query: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(query).unwrap_or_default()
}

fn decode_pairs_bytes(body: &Bytes) -> Vec<(String, String)> {
    serde_urlencoded::from_bytes(body).unwrap_or_default()
}

/// Split an already buffered multipart body into text fields and files
async fn read_multipart(
    content_type: &str,
    bytes: Bytes,
    max_body_size: usize,
) -> Result<FormInput, GuardError> {
    let unreadable = |e: multer::Error| GuardError::UnreadableBody { reason: e.to_string() };

    let boundary = multer::parse_boundary(content_type).map_err(unreadable)?;
    let constraints = Constraints::new()
        .size_limit(SizeLimit::new().whole_stream(max_body_size as u64));
    let body = stream::once(async move { Ok::<_, Infallible>(bytes) });
    let mut multipart = Multipart::with_constraints(body, boundary, constraints);

    let mut data = FormData::new();
    let mut files = Files::new();

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_string);
            let file_type = field.content_type().map(ToString::to_string);
            let data = field.bytes().await.map_err(unreadable)?;
            files.append(name, UploadedFile { file_name, content_type: file_type, data });
        } else {
            let text = field.text().await.map_err(unreadable)?;
            data.append(name, Value::String(text));
        }
    }

    Ok(FormInput::new(data).with_files(files))
}
