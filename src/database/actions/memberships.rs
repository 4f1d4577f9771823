use crate::{
    error::ServiceError,
    schema::{Membership, Uuid},
    store::Store,
};

/// Adds or removes the (user, recipe) pair in the favorites or the shopping
/// cart.
pub async fn toggle_membership<S: Store>(
    kind: Membership,
    user_id: Uuid,
    recipe_id: Uuid,
    add: bool,
    store: &S,
) -> Result<(), ServiceError> {
    if store.get_recipe(recipe_id).await?.is_none() {
        return Err(ServiceError::not_found(format!("No recipe with id {recipe_id}")));
    }

    if add {
        // The insert reports a lost race with a concurrent add the same way.
        if store.membership_exists(kind, user_id, recipe_id).await?
            || !store.insert_membership(kind, user_id, recipe_id).await?
        {
            return Err(ServiceError::conflict(format!(
                "Recipe {recipe_id} is already in {}",
                kind.label()
            )));
        }
        log::debug!("user {user_id} added recipe {recipe_id} to {}", kind.label());
    } else {
        if !store.delete_membership(kind, user_id, recipe_id).await? {
            return Err(ServiceError::not_found(format!(
                "Recipe {recipe_id} is not in {}",
                kind.label()
            )));
        }
        log::debug!("user {user_id} removed recipe {recipe_id} from {}", kind.label());
    }

    Ok(())
}

pub async fn toggle_favorite<S: Store>(
    user_id: Uuid,
    recipe_id: Uuid,
    add: bool,
    store: &S,
) -> Result<(), ServiceError> {
    toggle_membership(Membership::Favorite, user_id, recipe_id, add, store).await
}

pub async fn toggle_cart<S: Store>(
    user_id: Uuid,
    recipe_id: Uuid,
    add: bool,
    store: &S,
) -> Result<(), ServiceError> {
    toggle_membership(Membership::ShoppingCart, user_id, recipe_id, add, store).await
}
