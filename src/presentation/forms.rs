//! Forms used by the demo recipe endpoints

use serde::Serialize;

use crate::domain::{FieldErrors, Form, FormCleaner, FormInput, UploadedFile};

pub const UNITS: &[&str] = &["g", "kg", "ml", "l", "cup", "tbsp", "tsp", "piece"];
pub const SORT_ORDERS: &[&str] = &["newest", "title"];

/// Summary of an uploaded recipe photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoSummary {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

impl From<UploadedFile> for PhotoSummary {
    fn from(file: UploadedFile) -> Self {
        Self { size: file.size(), file_name: file.file_name, content_type: file.content_type }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeForm {
    pub title: String,
    pub servings: i64,
    pub description: Option<String>,
    pub vegetarian: bool,
    pub photo: Option<PhotoSummary>,
}

impl Form for RecipeForm {
    fn clean(input: &FormInput) -> Result<Self, FieldErrors> {
        let mut cleaner = FormCleaner::new(input);
        let title = cleaner.required_str("title");
        let servings = cleaner.required_int("servings");
        let description = cleaner.optional_str("description");
        let vegetarian = cleaner.boolean("vegetarian");
        let photo = cleaner.optional_file("photo");

        if let Some(title) = &title {
            cleaner.max_length("title", title, 120);
        }
        if let Some(servings) = servings {
            cleaner.check("servings", (1..=100).contains(&servings), "Servings must be between 1 and 100.");
        }
        if let Some(photo) = &photo {
            let is_image = photo.content_type.as_deref().is_some_and(|ct| ct.starts_with("image/"));
            cleaner.check("photo", is_image, "Upload a valid image.");
        }
        cleaner.finish()?;

        let (Some(title), Some(servings)) = (title, servings) else {
            return Err(FieldErrors::new());
        };
        Ok(Self { title, servings, description, vegetarian, photo: photo.map(PhotoSummary::from) })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSearchForm {
    pub q: String,
    pub limit: i64,
    pub sort: String,
}

impl Form for RecipeSearchForm {
    fn clean(input: &FormInput) -> Result<Self, FieldErrors> {
        let mut cleaner = FormCleaner::new(input);
        let q = cleaner.required_str("q");
        let limit = cleaner.optional_int("limit").unwrap_or(20);
        let sort = cleaner.optional_str("sort").unwrap_or_else(|| "newest".to_string());

        cleaner.check("limit", (1..=100).contains(&limit), "Ensure this value is between 1 and 100.");
        if !SORT_ORDERS.contains(&sort.as_str()) {
            cleaner.add_error(
                "sort",
                format!("Select a valid choice. {sort} is not one of the available choices."),
            );
        }
        cleaner.finish()?;

        q.map(|q| Self { q, limit, sort }).ok_or_else(FieldErrors::new)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientForm {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

impl Form for IngredientForm {
    fn clean(input: &FormInput) -> Result<Self, FieldErrors> {
        let mut cleaner = FormCleaner::new(input);
        let name = cleaner.required_str("name");
        let quantity = cleaner.required_number("quantity");
        let unit = cleaner.choice("unit", UNITS);

        if let Some(quantity) = quantity {
            cleaner.check("quantity", quantity > 0.0, "Ensure this value is greater than 0.");
        }
        cleaner.finish()?;

        let (Some(name), Some(quantity), Some(unit)) = (name, quantity, unit) else {
            return Err(FieldErrors::new());
        };
        Ok(Self { name, quantity, unit })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagForm {
    pub label: String,
}

impl Form for TagForm {
    fn clean(input: &FormInput) -> Result<Self, FieldErrors> {
        let mut cleaner = FormCleaner::new(input);
        let label = cleaner.required_str("label").map(|label| label.to_lowercase());

        if let Some(label) = &label {
            cleaner.max_length("label", label, 32);
        }
        cleaner.finish()?;

        label.map(|label| Self { label }).ok_or_else(FieldErrors::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FormData;
    use serde_json::json;

    fn bind<F: Form>(pairs: &[(&str, &str)]) -> Result<F, FieldErrors> {
        F::clean(&FormInput::new(FormData::from_pairs(pairs.iter().copied())))
    }

    #[test]
    fn test_recipe_form_valid() {
        let recipe: RecipeForm =
            bind(&[("title", "Tomato soup"), ("servings", "4"), ("vegetarian", "on")]).unwrap();

        assert_eq!(recipe.title, "Tomato soup");
        assert_eq!(recipe.servings, 4);
        assert!(recipe.vegetarian);
        assert_eq!(recipe.description, None);
        assert_eq!(recipe.photo, None);
    }

    #[test]
    fn test_recipe_form_reports_every_bad_field() {
        let errors = bind::<RecipeForm>(&[("servings", "0")]).unwrap_err();

        assert!(errors.contains("title"));
        assert_eq!(
            errors.get("servings"),
            Some(&["Servings must be between 1 and 100.".to_string()][..])
        );
    }

    #[test]
    fn test_search_form_defaults() {
        let search: RecipeSearchForm = bind(&[("q", "soup")]).unwrap();

        assert_eq!(search, RecipeSearchForm { q: "soup".into(), limit: 20, sort: "newest".into() });
    }

    #[test]
    fn test_search_form_rejects_unknown_sort() {
        let errors = bind::<RecipeSearchForm>(&[("q", "soup"), ("sort", "rating")]).unwrap_err();

        assert!(errors.contains("sort"));
        assert!(!errors.contains("q"));
    }

    #[test]
    fn test_ingredient_form_from_json_object() {
        let object = json!({"name": "flour", "quantity": 250, "unit": "g"});
        let input = FormInput::new(FormData::from_json_object(object.as_object().cloned().unwrap()));

        let ingredient = IngredientForm::clean(&input).unwrap();

        assert_eq!(ingredient.name, "flour");
        assert!((ingredient.quantity - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ingredient_form_rejects_negative_quantity_and_bad_unit() {
        let errors =
            bind::<IngredientForm>(&[("name", "salt"), ("quantity", "-1"), ("unit", "bucket")])
                .unwrap_err();

        assert!(errors.contains("quantity"));
        assert!(errors.contains("unit"));
    }

    #[test]
    fn test_tag_form_lowercases() {
        let tag: TagForm = bind(&[("label", "Quick")]).unwrap();
        assert_eq!(tag.label, "quick");
    }
}
