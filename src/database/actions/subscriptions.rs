use crate::{
    error::ServiceError,
    pagination::PageContext,
    schema::{SubscriptionView, UserProfile, Uuid},
    store::Store,
};

pub async fn toggle_subscription<S: Store>(
    follower_id: Uuid,
    author_id: Uuid,
    add: bool,
    store: &S,
) -> Result<(), ServiceError> {
    if add && follower_id == author_id {
        return Err(ServiceError::validation("author", "cannot follow self"));
    }
    if store.get_user(author_id).await?.is_none() {
        return Err(ServiceError::not_found(format!("No user with id {author_id}")));
    }

    if add {
        if store.subscription_exists(follower_id, author_id).await?
            || !store.insert_subscription(follower_id, author_id).await?
        {
            return Err(ServiceError::conflict(format!(
                "Already subscribed to user {author_id}"
            )));
        }
        log::debug!("user {follower_id} subscribed to {author_id}");
    } else {
        if !store.delete_subscription(follower_id, author_id).await? {
            return Err(ServiceError::not_found(format!(
                "Not subscribed to user {author_id}"
            )));
        }
        log::debug!("user {follower_id} unsubscribed from {author_id}");
    }

    Ok(())
}

/// Anonymous viewers are subscribed to nobody.
pub async fn is_subscribed<S: Store>(
    viewer: Option<Uuid>,
    author_id: Uuid,
    store: &S,
) -> Result<bool, ServiceError> {
    match viewer {
        Some(follower_id) => store.subscription_exists(follower_id, author_id).await,
        None => Ok(false),
    }
}

/// Authors `follower_id` follows, each with their newest recipes. A
/// `recipes_limit` of `None` keeps every recipe.
pub async fn list_subscriptions<S: Store>(
    follower_id: Uuid,
    recipes_limit: Option<i64>,
    offset: i64,
    page_size: i64,
    store: &S,
) -> Result<PageContext<SubscriptionView>, ServiceError> {
    if let Some(limit) = recipes_limit {
        if limit < 0 {
            return Err(ServiceError::validation(
                "recipes_limit",
                "must not be negative",
            ));
        }
    }

    let offset = offset.max(0);
    let page_size = page_size.max(0);
    let (authors, total_count) = store
        .list_subscribed_authors(follower_id, page_size, offset)
        .await?;

    let mut rows = Vec::with_capacity(authors.len());
    for author in authors {
        let (recipes, recipes_count) = store
            .list_author_recipes(author.id, recipes_limit)
            .await?;
        rows.push(SubscriptionView {
            author: UserProfile::from_user(author, true),
            recipes,
            recipes_count,
        });
    }

    Ok(PageContext::from_rows(rows, total_count, page_size, offset))
}
