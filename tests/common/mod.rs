//! Seed helpers shared by the integration tests.
//!
//! Everything runs against a fresh `MemoryStore`.

use recipe_share_sdk::{
    actions,
    config::Limits,
    memory::MemoryStore,
    schema::{IngredientAmount, NewIngredient, NewTag, RecipeDetail, RecipeForm, RegistrationForm, Tag, Uuid},
};

#[allow(dead_code, reason = "it's used in the other tests")]
pub fn store() -> MemoryStore {
    MemoryStore::new()
}

#[allow(dead_code, reason = "it's used in the other tests")]
pub fn limits() -> Limits {
    Limits::default()
}

#[allow(dead_code, reason = "it's used in the other tests")]
pub fn registration(username: &str) -> RegistrationForm {
    RegistrationForm {
        email: format!("{username}@example.com"),
        username: username.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        password: format!("{username}-password"),
    }
}

/// registers `username` and returns its id
#[allow(dead_code, reason = "it's used in the other tests")]
pub async fn user(store: &MemoryStore, username: &str) -> Uuid {
    actions::register_user(registration(username), store)
        .await
        .expect("register user")
        .id
}

#[allow(dead_code, reason = "it's used in the other tests")]
pub async fn ingredient(store: &MemoryStore, name: &str, unit: &str) -> Uuid {
    actions::create_ingredient(
        NewIngredient {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        },
        store,
    )
    .await
    .expect("create ingredient")
    .id
}

#[allow(dead_code, reason = "it's used in the other tests")]
pub async fn tag(store: &MemoryStore, slug: &str) -> Tag {
    actions::create_tag(
        NewTag {
            name: slug.to_uppercase(),
            color: Some(String::from("#aa00ff")),
            slug: slug.to_string(),
        },
        store,
    )
    .await
    .expect("create tag")
}

#[allow(dead_code, reason = "it's used in the other tests")]
pub fn form(name: &str, tags: &[Uuid], lines: &[(Uuid, i32)]) -> RecipeForm {
    RecipeForm {
        name: name.to_string(),
        text: Some(String::from("Mix and cook.")),
        image: None,
        cooking_time: 20,
        tags: tags.to_vec(),
        ingredients: lines
            .iter()
            .map(|&(ingredient_id, amount)| IngredientAmount {
                ingredient_id,
                amount,
            })
            .collect(),
    }
}

#[allow(dead_code, reason = "it's used in the other tests")]
pub async fn recipe(
    store: &MemoryStore,
    author_id: Uuid,
    name: &str,
    lines: &[(Uuid, i32)],
) -> RecipeDetail {
    actions::create_recipe(author_id, form(name, &[], lines), &limits(), store)
        .await
        .expect("create recipe")
}
