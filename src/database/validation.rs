use std::collections::HashSet;

use crate::{
    config::Limits,
    constants::{MAX_NAME_LENGTH, MIN_LIMIT, RESERVED_USERNAMES},
};

use super::{
    error::ServiceError,
    schema::{IngredientAmount, NewTag, RecipeForm, RegistrationForm, Uuid},
};

/// A `RecipeForm` that passed every field rule. Tag ids are deduplicated,
/// ingredient lines keep their submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecipe {
    pub name: String,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: i32,
    tags: Vec<Uuid>,
    ingredients: Vec<IngredientAmount>,
}

impl ValidatedRecipe {
    pub fn tags(&self) -> &[Uuid] {
        &self.tags
    }

    pub fn ingredients(&self) -> &[IngredientAmount] {
        &self.ingredients
    }

    pub fn ingredient_ids(&self) -> Vec<Uuid> {
        self.ingredients.iter().map(|line| line.ingredient_id).collect()
    }
}

pub fn check_limit(field: &str, value: i32, limits: &Limits) -> Result<(), ServiceError> {
    let min = limits.min.max(MIN_LIMIT);
    if value < min || !limits.contains(value) {
        return Err(ServiceError::validation(
            field,
            format!("must be between {min} and {}, got {value}", limits.max),
        ));
    }
    Ok(())
}

pub fn check_name(field: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(field, "must not be empty"));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ServiceError::validation(
            field,
            format!("must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_recipe(form: RecipeForm, limits: &Limits) -> Result<ValidatedRecipe, ServiceError> {
    check_name("name", &form.name)?;
    check_limit("cooking_time", form.cooking_time, limits)?;

    if form.ingredients.is_empty() {
        return Err(ServiceError::validation(
            "ingredients",
            "at least one ingredient is required",
        ));
    }

    let mut seen = HashSet::new();
    for (i, line) in form.ingredients.iter().enumerate() {
        check_limit(&format!("ingredients[{i}].amount"), line.amount, limits)?;

        if !seen.insert(line.ingredient_id) {
            return Err(ServiceError::validation(
                &format!("ingredients[{i}].id"),
                format!("duplicate ingredient {}", line.ingredient_id),
            ));
        }
    }

    let mut seen = HashSet::new();
    let tags = form
        .tags
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect();

    Ok(ValidatedRecipe {
        name: form.name,
        text: form.text,
        image: form.image,
        cooking_time: form.cooking_time,
        tags,
        ingredients: form.ingredients,
    })
}

/// `#` followed by exactly six hex digits.
pub fn check_color(value: &str) -> Result<(), ServiceError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(ServiceError::validation(
            "color",
            format!("`{value}` is not a #rrggbb color code"),
        ));
    }
    Ok(())
}

pub fn check_slug(value: &str) -> Result<(), ServiceError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !valid {
        return Err(ServiceError::validation(
            "slug",
            "may only contain letters, digits, hyphens and underscores",
        ));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ServiceError::validation(
            "slug",
            format!("must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_tag(tag: &NewTag) -> Result<(), ServiceError> {
    check_name("name", &tag.name)?;
    if let Some(color) = &tag.color {
        check_color(color)?;
    }
    check_slug(&tag.slug)
}

pub fn validate_registration(form: &RegistrationForm) -> Result<(), ServiceError> {
    check_name("username", &form.username)?;
    if RESERVED_USERNAMES.contains(&form.username.as_str()) {
        return Err(ServiceError::validation(
            "username",
            format!("`{}` is a reserved username", form.username),
        ));
    }

    check_name("email", &form.email)?;
    if !form.email.contains('@') {
        return Err(ServiceError::validation("email", "not a valid email address"));
    }

    if form.password.is_empty() {
        return Err(ServiceError::validation("password", "must not be empty"));
    }
    Ok(())
}
