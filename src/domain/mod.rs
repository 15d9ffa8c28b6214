pub mod cleaner;
pub mod form;

pub use cleaner::FormCleaner;
pub use form::{
    BoundForm, FieldErrors, Files, Form, FormData, FormInput, UploadedFile, NON_FIELD_ERRORS,
};
