use serde_json::Value;

use super::form::{FieldErrors, FormInput, UploadedFile};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_INTEGER: &str = "Enter a whole number.";
pub const INVALID_NUMBER: &str = "Enter a number.";
pub const INVALID_VALUE: &str = "Enter a valid value.";
pub const NO_FILE: &str = "No file was submitted.";

/// Field-by-field cleaning helper for [`Form`](super::Form) implementations.
///
/// Each accessor reads one field, records an error when it is missing or
/// malformed and returns `None` in that case. Errors accumulate across fields
/// so a form reports every bad field at once; call [`FormCleaner::finish`]
/// before assembling the cleaned value.
///
/// ```
/// use api_guards::domain::{FieldErrors, Form, FormCleaner, FormInput};
///
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// impl Form for Person {
///     fn clean(input: &FormInput) -> Result<Self, FieldErrors> {
///         let mut cleaner = FormCleaner::new(input);
///         let name = cleaner.required_str("name");
///         let age = cleaner.required_int("age");
///         cleaner.finish()?;
///
///         let (Some(name), Some(age)) = (name, age) else {
///             return Err(FieldErrors::new());
///         };
///         Ok(Person { name, age })
///     }
/// }
/// ```
#[derive(Debug)]
pub struct FormCleaner<'a> {
    input: &'a FormInput,
    errors: FieldErrors,
}

impl<'a> FormCleaner<'a> {
    pub fn new(input: &'a FormInput) -> Self {
        Self { input, errors: FieldErrors::new() }
    }

    /// Trimmed, non-empty string
    pub fn required_str(&mut self, field: &str) -> Option<String> {
        match self.text(field) {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                self.errors.add(field, REQUIRED);
                None
            }
            Err(message) => {
                self.errors.add(field, message);
                None
            }
        }
    }

    /// Trimmed string, `None` when absent or blank
    pub fn optional_str(&mut self, field: &str) -> Option<String> {
        match self.text(field) {
            Ok(value) => value,
            Err(message) => {
                self.errors.add(field, message);
                None
            }
        }
    }

    pub fn required_int(&mut self, field: &str) -> Option<i64> {
        self.required(field, parse_integer)
    }

    /// `None` when absent; records an error when present but not a whole number
    pub fn optional_int(&mut self, field: &str) -> Option<i64> {
        self.optional(field, parse_integer)
    }

    pub fn required_number(&mut self, field: &str) -> Option<f64> {
        self.required(field, parse_number)
    }

    pub fn optional_number(&mut self, field: &str) -> Option<f64> {
        self.optional(field, parse_number)
    }

    /// Checkbox semantics: absent, blank, `false`, `0` and `off` are false
    pub fn boolean(&mut self, field: &str) -> bool {
        match self.input.data().get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(value)) => *value,
            Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(value)) => {
                !matches!(value.trim().to_lowercase().as_str(), "" | "false" | "0" | "off")
            }
            Some(_) => {
                self.errors.add(field, INVALID_VALUE);
                false
            }
        }
    }

    /// Required string that must be one of `choices`
    pub fn choice(&mut self, field: &str, choices: &[&str]) -> Option<String> {
        let value = self.required_str(field)?;
        if choices.contains(&value.as_str()) {
            Some(value)
        } else {
            self.errors.add(
                field,
                format!("Select a valid choice. {value} is not one of the available choices."),
            );
            None
        }
    }

    pub fn required_file(&mut self, field: &str) -> Option<UploadedFile> {
        match self.input.files().get(field) {
            Some(file) if !file.data.is_empty() => Some(file.clone()),
            Some(_) => {
                self.errors.add(field, "The submitted file is empty.");
                None
            }
            None => {
                self.errors.add(field, NO_FILE);
                None
            }
        }
    }

    pub fn optional_file(&mut self, field: &str) -> Option<UploadedFile> {
        self.input.files().get(field).cloned()
    }

    /// Record an error when `value` is longer than `max` characters
    pub fn max_length(&mut self, field: &str, value: &str, max: usize) {
        let length = value.chars().count();
        if length > max {
            self.errors.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {length})."),
            );
        }
    }

    /// Record `message` against `field` unless `condition` holds
    pub fn check(&mut self, field: &str, condition: bool, message: &str) {
        if !condition {
            self.errors.add(field, message);
        }
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.errors.add_non_field(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
    }

    fn required<T>(&mut self, field: &str, parse: fn(&Value) -> Result<T, &'static str>) -> Option<T> {
        match self.present(field) {
            Some(value) => self.record(field, parse(value)),
            None => {
                self.errors.add(field, REQUIRED);
                None
            }
        }
    }

    fn optional<T>(&mut self, field: &str, parse: fn(&Value) -> Result<T, &'static str>) -> Option<T> {
        let value = self.present(field)?;
        self.record(field, parse(value))
    }

    fn record<T>(&mut self, field: &str, parsed: Result<T, &'static str>) -> Option<T> {
        parsed.map_err(|message| self.errors.add(field, message)).ok()
    }

    /// The field's value unless it is absent, null or blank
    fn present(&self, field: &str) -> Option<&'a Value> {
        match self.input.data().get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(value)) if value.trim().is_empty() => None,
            Some(value) => Some(value),
        }
    }

    fn text(&self, field: &str) -> Result<Option<String>, &'static str> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.trim().to_string())),
            Some(Value::Number(number)) => Ok(Some(number.to_string())),
            Some(Value::Bool(value)) => Ok(Some(value.to_string())),
            Some(_) => Err(INVALID_VALUE),
        }
    }
}

fn parse_integer(value: &Value) -> Result<i64, &'static str> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(whole_f64_to_i64))
            .ok_or(INVALID_INTEGER),
        Value::String(text) => text.trim().parse::<i64>().map_err(|_| INVALID_INTEGER),
        _ => Err(INVALID_INTEGER),
    }
}

/// `2.0` is a whole number; values outside the `i64` range are not
fn whole_f64_to_i64(n: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    let in_range = n >= i64::MIN as f64 && n < i64::MAX as f64;
    (n.fract() == 0.0 && in_range).then_some(n as i64)
}

fn parse_number(value: &Value) -> Result<f64, &'static str> {
    match value {
        Value::Number(number) => number.as_f64().ok_or(INVALID_NUMBER),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or(INVALID_NUMBER),
        _ => Err(INVALID_NUMBER),
    }
}
