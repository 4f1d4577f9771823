use crate::{
    authentication::permissions::ActionType,
    config::Limits,
    error::ServiceError,
    pagination::PageContext,
    schema::{Recipe, RecipeDetail, RecipeFilter, RecipeForm, Membership, UserProfile, Uuid},
    store::Store,
    validation::{validate_recipe, ValidatedRecipe},
};

use super::subscriptions::is_subscribed;

/// Fails with a reference error when any submitted tag or ingredient id does
/// not exist. Runs before anything is written.
async fn check_references<S: Store>(recipe: &ValidatedRecipe, store: &S) -> Result<(), ServiceError> {
    let found = store.existing_tags(recipe.tags()).await?;
    let missing: Vec<Uuid> = recipe
        .tags()
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::reference("tags", missing));
    }

    let ids = recipe.ingredient_ids();
    let found = store.existing_ingredients(&ids).await?;
    let missing: Vec<Uuid> = ids.into_iter().filter(|id| !found.contains(id)).collect();
    if !missing.is_empty() {
        return Err(ServiceError::reference("ingredients", missing));
    }

    Ok(())
}

async fn prepare<S: Store>(
    form: RecipeForm,
    limits: &Limits,
    store: &S,
) -> Result<ValidatedRecipe, ServiceError> {
    let recipe = validate_recipe(form, limits).map_err(|e| {
        log::debug!("rejected recipe: {e}");
        e
    })?;
    check_references(&recipe, store).await?;

    Ok(recipe)
}

pub async fn create_recipe<S: Store>(
    author_id: Uuid,
    form: RecipeForm,
    limits: &Limits,
    store: &S,
) -> Result<RecipeDetail, ServiceError> {
    if store.get_user(author_id).await?.is_none() {
        return Err(ServiceError::not_found(format!("No user with id {author_id}")));
    }

    let recipe = prepare(form, limits, store).await?;
    let row = store.insert_recipe(author_id, &recipe).await?;
    log::debug!("user {author_id} created recipe {}", row.id);

    recipe_detail(row, Some(author_id), store).await
}

pub async fn get_recipe_mut<S: Store>(
    id: Uuid,
    user_id: Uuid,
    action: ActionType,
    store: &S,
) -> Result<Recipe, ServiceError> {
    match store.get_recipe(id).await? {
        Some(recipe) => {
            action.authorize(&recipe, user_id)?;
            Ok(recipe)
        }
        None => Err(ServiceError::not_found(format!("No recipe with id {id}"))),
    }
}

/// Replaces every field of a recipe, its whole ingredient list and its tag set.
/// The author and publication date are kept.
pub async fn update_recipe<S: Store>(
    id: Uuid,
    user_id: Uuid,
    form: RecipeForm,
    limits: &Limits,
    store: &S,
) -> Result<RecipeDetail, ServiceError> {
    get_recipe_mut(id, user_id, ActionType::UpdateRecipe, store).await?;

    let recipe = prepare(form, limits, store).await?;
    let row = store
        .replace_recipe(id, &recipe)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("No recipe with id {id}")))?;
    log::debug!("user {user_id} replaced recipe {id}");

    recipe_detail(row, Some(user_id), store).await
}

/// Creates a recipe when `id` is `None`, replaces recipe `id` otherwise.
pub async fn create_or_replace_recipe<S: Store>(
    user_id: Uuid,
    id: Option<Uuid>,
    form: RecipeForm,
    limits: &Limits,
    store: &S,
) -> Result<RecipeDetail, ServiceError> {
    match id {
        Some(id) => update_recipe(id, user_id, form, limits, store).await,
        None => create_recipe(user_id, form, limits, store).await,
    }
}

pub async fn delete_recipe<S: Store>(id: Uuid, user_id: Uuid, store: &S) -> Result<(), ServiceError> {
    get_recipe_mut(id, user_id, ActionType::DeleteRecipe, store).await?;

    if !store.delete_recipe(id).await? {
        return Err(ServiceError::not_found(format!("No recipe with id {id}")));
    }
    log::debug!("user {user_id} deleted recipe {id}");

    Ok(())
}

pub async fn recipe_detail<S: Store>(
    recipe: Recipe,
    viewer: Option<Uuid>,
    store: &S,
) -> Result<RecipeDetail, ServiceError> {
    let author = store
        .get_user(recipe.author_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("No user with id {}", recipe.author_id)))?;
    let is_subscribed = is_subscribed(viewer, author.id, store).await?;

    let tags = store.list_recipe_tags(recipe.id).await?;
    let ingredients = store.list_recipe_lines(recipe.id).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(user_id) => (
            store
                .membership_exists(Membership::Favorite, user_id, recipe.id)
                .await?,
            store
                .membership_exists(Membership::ShoppingCart, user_id, recipe.id)
                .await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetail {
        id: recipe.id,
        tags,
        author: UserProfile::from_user(author, is_subscribed),
        ingredients: ingredients.into_iter().map(Into::into).collect(),
        is_favorited,
        is_in_shopping_cart,
        image: recipe.image,
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
    })
}

pub async fn get_recipe<S: Store>(
    id: Uuid,
    viewer: Option<Uuid>,
    store: &S,
) -> Result<RecipeDetail, ServiceError> {
    match store.get_recipe(id).await? {
        Some(recipe) => recipe_detail(recipe, viewer, store).await,
        None => Err(ServiceError::not_found(format!("No recipe with id {id}"))),
    }
}

/// Newest recipes first.
///
/// `favorited_by` and `in_cart_of` only make sense for the viewer's own lists;
/// an anonymous viewer asking for either gets an empty page.
pub async fn list_recipes<S: Store>(
    filter: RecipeFilter,
    viewer: Option<Uuid>,
    offset: i64,
    page_size: i64,
    store: &S,
) -> Result<PageContext<RecipeDetail>, ServiceError> {
    let offset = offset.max(0);
    let page_size = page_size.max(0);
    let wants_own_list = filter.favorited_by.is_some() || filter.in_cart_of.is_some();
    let own_list = filter
        .favorited_by
        .iter()
        .chain(filter.in_cart_of.iter())
        .all(|id| Some(*id) == viewer);

    if wants_own_list && !own_list {
        return Ok(PageContext::no_rows(0));
    }

    let (rows, total_count) = store.list_recipes(&filter, page_size, offset).await?;

    let mut details = Vec::with_capacity(rows.len());
    for recipe in rows {
        details.push(recipe_detail(recipe, viewer, store).await?);
    }

    Ok(PageContext::from_rows(details, total_count, page_size, offset))
}
