use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Error key used for errors that do not belong to a single field
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Raw, multi-valued key/value input a form is bound to.
///
/// Values are kept as JSON values so the same bag can carry query-string or
/// urlencoded pairs (always strings) and decoded JSON objects (typed values).
/// Keys keep every submitted value in submission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    fields: BTreeMap<String, Vec<Value>>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ordered key/value string pairs, as decoded from a query
    /// string or an urlencoded body. Repeated keys accumulate.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = Self::new();
        for (key, value) in pairs {
            data.append(key, Value::String(value.into()));
        }
        data
    }

    /// Build from a decoded JSON object, one value per key
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        let fields = object.into_iter().map(|(key, value)| (key, vec![value])).collect();
        Self { fields }
    }

    pub fn append(&mut self, key: impl Into<String>, value: Value) {
        self.fields.entry(key.into()).or_default().push(value);
    }

    /// Last value submitted under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).and_then(|values| values.last())
    }

    /// Every value submitted under `key`, in submission order
    pub fn get_all(&self, key: &str) -> &[Value] {
        self.fields.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// A file part received in a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Files submitted with a request, keyed by form field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Files {
    files: BTreeMap<String, Vec<UploadedFile>>,
}

impl Files {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, field: impl Into<String>, file: UploadedFile) {
        self.files.entry(field.into()).or_default().push(file);
    }

    pub fn get(&self, field: &str) -> Option<&UploadedFile> {
        self.files.get(field).and_then(|files| files.last())
    }

    pub fn get_all(&self, field: &str) -> &[UploadedFile] {
        self.files.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Everything a form sees when it is bound: the data bag and the files bag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormInput {
    data: FormData,
    files: Files,
}

impl FormInput {
    pub fn new(data: FormData) -> Self {
        Self { data, files: Files::default() }
    }

    #[must_use]
    pub fn with_files(mut self, files: Files) -> Self {
        self.files = files;
        self
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn files(&self) -> &Files {
        &self.files
    }
}

/// Field name to error messages, serialised verbatim as the 400 body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build errors for a single field
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message);
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

/// A validation schema.
///
/// Implementors turn raw [`FormInput`] into a typed, cleaned value, or report
/// per-field error messages. The cleaned value is what guarded handlers
/// receive.
pub trait Form: Sized + Send + Sync + 'static {
    fn clean(input: &FormInput) -> Result<Self, FieldErrors>;
}

/// A form bound to one input, holding either its cleaned data or its errors
#[derive(Debug, Clone)]
pub struct BoundForm<F> {
    cleaned: Option<F>,
    errors: FieldErrors,
}

impl<F: Form> BoundForm<F> {
    pub fn bind(input: &FormInput) -> Self {
        match F::clean(input) {
            Ok(cleaned) => Self { cleaned: Some(cleaned), errors: FieldErrors::new() },
            Err(errors) => Self { cleaned: None, errors },
        }
    }

    pub fn is_valid(&self) -> bool {
        self.cleaned.is_some()
    }

    pub fn cleaned_data(&self) -> Option<&F> {
        self.cleaned.as_ref()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn into_result(self) -> Result<F, FieldErrors> {
        self.cleaned.ok_or(self.errors)
    }
}
