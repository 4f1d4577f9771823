use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use super::{
    error::ServiceError,
    schema::{IngredientAmount, RecipeForm, Uuid},
};

pub type FormData = HashMap<String, Value>;

/// Loosely typed request body. Numbers may arrive as JSON numbers or as
/// strings, the way HTML forms post them.
pub struct Form {
    inner: HashMap<String, Value>,
}

fn parse_number<T: FromStr>(key: &str, value: &Value) -> Result<T, ServiceError> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(ServiceError::validation(key, "expected a number")),
    };

    raw.parse()
        .map_err(|_e| ServiceError::validation(key, format!("`{raw}` is not a valid number")))
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    fn get(&self, key: &str) -> Result<&Value, ServiceError> {
        self.inner
            .get(key)
            .ok_or_else(|| ServiceError::validation(key, "field is required"))
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, ServiceError>
    where
        T: FromStr,
    {
        parse_number(key, self.get(key)?)
    }

    pub fn get_str(&self, key: &str) -> Result<String, ServiceError> {
        match self.get(key)?.as_str() {
            Some(v) => Ok(v.to_string()),
            None => Err(ServiceError::validation(key, "expected a string")),
        }
    }

    /// Missing, `null` and empty strings all read as `None`.
    pub fn get_optional_str(&self, key: &str) -> Result<Option<String>, ServiceError> {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.to_string())),
            Some(_) => Err(ServiceError::validation(key, "expected a string")),
        }
    }

    /// A missing key reads as an empty list.
    pub fn get_id_list(&self, key: &str) -> Result<Vec<Uuid>, ServiceError> {
        match self.inner.get(key) {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(values)) => values
                .iter()
                .enumerate()
                .map(|(i, value)| parse_number(&format!("{key}[{i}]"), value))
                .collect(),
            Some(_) => Err(ServiceError::validation(key, "expected a list of ids")),
        }
    }

    /// Reads `[{"id": .., "amount": ..}, ..]`.
    pub fn get_ingredient_lines(&self, key: &str) -> Result<Vec<IngredientAmount>, ServiceError> {
        let values = match self.get(key)? {
            Value::Array(values) => values,
            _ => return Err(ServiceError::validation(key, "expected a list of ingredients")),
        };

        values
            .iter()
            .enumerate()
            .map(|(i, value)| -> Result<IngredientAmount, ServiceError> {
                let field = |name: &str| -> Result<i32, ServiceError> {
                    let path = format!("{key}[{i}].{name}");
                    match value.get(name) {
                        Some(v) => parse_number(&path, v),
                        None => Err(ServiceError::validation(&path, "field is required")),
                    }
                };

                Ok(IngredientAmount {
                    ingredient_id: field("id")?,
                    amount: field("amount")?,
                })
            })
            .collect()
    }
}

impl TryFrom<Form> for RecipeForm {
    type Error = ServiceError;

    fn try_from(form: Form) -> Result<Self, Self::Error> {
        Ok(Self {
            name: form.get_str("name")?,
            text: form.get_optional_str("text")?,
            image: form.get_optional_str("image")?,
            cooking_time: form.get_number("cooking_time")?,
            tags: form.get_id_list("tags")?,
            ingredients: form.get_ingredient_lines("ingredients")?,
        })
    }
}
