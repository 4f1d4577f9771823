use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, SessionKeys},
    },
    error::ServiceError,
    pagination::PageContext,
    schema::{NewUser, RegistrationForm, User, UserProfile, Uuid},
    store::Store,
    validation::validate_registration,
};

use super::subscriptions::is_subscribed;

async fn get_user_by_id<S: Store>(id: Uuid, store: &S) -> Result<User, ServiceError> {
    store
        .get_user(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("No user with id {id}")))
}

/// Creates a user. The password is stored as an argon2 hash.
pub async fn register_user<S: Store>(
    form: RegistrationForm,
    store: &S,
) -> Result<UserProfile, ServiceError> {
    validate_registration(&form)?;

    let user = NewUser {
        password: hash_password(&form.password)?,
        email: form.email,
        username: form.username,
        first_name: form.first_name,
        last_name: form.last_name,
    };

    match store.insert_user(user).await? {
        Some(user) => {
            log::debug!("registered user {} ({})", user.id, user.username);
            Ok(UserProfile::from_user(user, false))
        }
        None => Err(ServiceError::conflict("Email or username is already taken")),
    }
}

/// Checks the credentials and returns a signed session token.
pub async fn login_user<S: Store>(
    email: &str,
    password: &str,
    keys: &SessionKeys,
    store: &S,
) -> Result<String, ServiceError> {
    let invalid = || ServiceError::Authentication(String::from("Invalid credentials"));

    let user = match store.find_user_by_email(email).await? {
        Some(user) => user,
        None => {
            log::debug!("login attempt for unknown email");
            return Err(invalid());
        }
    };

    if !verify_password(password, &user.password)? {
        log::debug!("wrong password for user {}", user.id);
        return Err(invalid());
    }

    generate_jwt_session(&user, keys)
}

pub async fn get_profile<S: Store>(
    user_id: Uuid,
    viewer: Option<Uuid>,
    store: &S,
) -> Result<UserProfile, ServiceError> {
    let user = get_user_by_id(user_id, store).await?;
    let is_subscribed = is_subscribed(viewer, user.id, store).await?;

    Ok(UserProfile::from_user(user, is_subscribed))
}

pub async fn list_users<S: Store>(
    viewer: Option<Uuid>,
    offset: i64,
    page_size: i64,
    store: &S,
) -> Result<PageContext<UserProfile>, ServiceError> {
    let offset = offset.max(0);
    let page_size = page_size.max(0);
    let (users, total_count) = store.list_users(page_size, offset).await?;

    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        let is_subscribed = is_subscribed(viewer, user.id, store).await?;
        rows.push(UserProfile::from_user(user, is_subscribed));
    }

    Ok(PageContext::from_rows(rows, total_count, page_size, offset))
}

pub async fn set_password<S: Store>(
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
    store: &S,
) -> Result<(), ServiceError> {
    let user = get_user_by_id(user_id, store).await?;

    if !verify_password(current_password, &user.password)? {
        return Err(ServiceError::validation(
            "current_password",
            "password is incorrect",
        ));
    }
    if new_password.is_empty() {
        return Err(ServiceError::validation("new_password", "must not be empty"));
    }
    if new_password == current_password {
        return Err(ServiceError::validation(
            "new_password",
            "must differ from the current password",
        ));
    }

    store
        .update_password(user_id, hash_password(new_password)?)
        .await?;
    log::debug!("user {user_id} changed their password");

    Ok(())
}
