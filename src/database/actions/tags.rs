use crate::{
    error::ServiceError,
    schema::{NewTag, Tag, Uuid},
    store::Store,
    validation::validate_tag,
};

pub async fn create_tag<S: Store>(tag: NewTag, store: &S) -> Result<Tag, ServiceError> {
    validate_tag(&tag)?;

    let slug = tag.slug.clone();
    match store.insert_tag(tag).await? {
        Some(tag) => {
            log::debug!("created tag {} ({})", tag.id, tag.slug);
            Ok(tag)
        }
        None => Err(ServiceError::conflict(format!(
            "A tag with slug `{slug}` already exists"
        ))),
    }
}

pub async fn get_tag<S: Store>(id: Uuid, store: &S) -> Result<Tag, ServiceError> {
    store
        .get_tag(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("No tag with id {id}")))
}

pub async fn list_tags<S: Store>(store: &S) -> Result<Vec<Tag>, ServiceError> {
    store.list_tags().await
}
