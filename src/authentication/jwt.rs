use std::sync::Arc;

use chrono::Duration;
use chrono::Utc;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::config::Config;
use crate::database::schema::{Uuid, User};
use crate::error::ServiceError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    pub username: String,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: Uuid, username: String, lifetime: Duration) -> Self {
        let now = Utc::now();
        let iat = now.timestamp();
        let exp = (now + lifetime).timestamp();

        Self {
            user_id: id,
            username,
            iat,
            exp,
        }
    }
}

/// The authenticated principal of a request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub user_id: Uuid,
    pub username: String,
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
        }
    }
}

/// Signing key and token lifetime, shared by every filter that reads the
/// session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    secret: Arc<[u8]>,
    lifetime: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        Self {
            secret: Arc::from(secret),
            lifetime,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.session_secret.as_bytes(),
            Duration::hours(config.session_lifetime_hours),
        )
    }

    fn key(&self) -> Result<Hmac<Sha256>, ServiceError> {
        Hmac::new_from_slice(&self.secret).map_err(|_| {
            log::error!("session secret cannot be used as an HMAC key");
            ServiceError::Authentication(String::from("Invalid session key"))
        })
    }
}

pub fn generate_jwt_session(user: &User, keys: &SessionKeys) -> Result<String, ServiceError> {
    let key = keys.key()?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), keys.lifetime);

    claims
        .sign_with_key(&key)
        .map_err(|e| ServiceError::Authentication(format!("Failed to sign session: {e}")))
}

pub fn verify_jwt_session(token: &str, keys: &SessionKeys) -> Result<JwtSessionData, ServiceError> {
    let key = keys.key()?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| ServiceError::Authentication(String::from("Invalid session; Invalid token")))?;

    let now = Utc::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(ServiceError::Authentication(String::from(
            "Invalid session; Token expired",
        )));
    }

    Ok(session)
}
