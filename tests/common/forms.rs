use api_guards::{FieldErrors, Form, FormCleaner, FormInput};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonForm {
    pub name: String,
    pub age: i64,
}

impl Form for PersonForm {
    fn clean(input: &FormInput) -> Result<Self, FieldErrors> {
        let mut cleaner = FormCleaner::new(input);
        let name = cleaner.required_str("name");
        let age = cleaner.required_int("age");
        cleaner.finish()?;

        let (Some(name), Some(age)) = (name, age) else {
            return Err(FieldErrors::new());
        };
        Ok(Self { name, age })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointForm {
    pub x: i64,
}

impl Form for PointForm {
    fn clean(input: &FormInput) -> Result<Self, FieldErrors> {
        let mut cleaner = FormCleaner::new(input);
        let x = cleaner.required_int("x");
        cleaner.finish()?;

        x.map(|x| Self { x }).ok_or_else(FieldErrors::new)
    }
}
