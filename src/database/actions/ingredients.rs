use crate::{
    error::ServiceError,
    schema::{Ingredient, NewIngredient, Uuid},
    store::Store,
    validation::check_name,
};

pub async fn create_ingredient<S: Store>(
    ingredient: NewIngredient,
    store: &S,
) -> Result<Ingredient, ServiceError> {
    check_name("name", &ingredient.name)?;
    check_name("measurement_unit", &ingredient.measurement_unit)?;

    let ingredient = store.insert_ingredient(ingredient).await?;
    log::debug!("created ingredient {} ({})", ingredient.id, ingredient.name);

    Ok(ingredient)
}

pub async fn get_ingredient<S: Store>(id: Uuid, store: &S) -> Result<Ingredient, ServiceError> {
    store
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("No ingredient with id {id}")))
}

/// Case-insensitive substring search on the name. An empty query lists every
/// ingredient.
pub async fn search_ingredients<S: Store>(
    query: &str,
    store: &S,
) -> Result<Vec<Ingredient>, ServiceError> {
    store.search_ingredients(query.trim()).await
}
