use warp::{
    reject::{self, Rejection},
    Filter,
};

use crate::{constants::SESSION_COOKIE, database::schema::Uuid};

use super::jwt::{verify_jwt_session, SessionData, SessionKeys};

#[derive(Debug)]
struct Unauthorized;

impl reject::Reject for Unauthorized {}

/// Requires a valid session cookie and extracts its principal.
pub fn with_session(
    keys: SessionKeys,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::cookie::<String>(SESSION_COOKIE).and_then(move |session: String| {
        let keys = keys.clone();
        async move {
            match verify_jwt_session(&session, &keys) {
                Ok(data) => Ok(SessionData::from(data)),
                Err(e) => {
                    log::debug!("rejected session: {e}");
                    Err(reject::custom(Unauthorized))
                }
            }
        }
    })
}

/// Extracts the principal when there is one. A missing or invalid cookie is an
/// anonymous request, not a rejection.
pub fn with_possible_session(
    keys: SessionKeys,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE).map(move |session: Option<String>| {
        session.and_then(|session| {
            verify_jwt_session(&session, &keys)
                .ok()
                .map(SessionData::from)
        })
    })
}

/// Id of the principal, `None` for anonymous requests.
pub fn viewer_id(session: &Option<SessionData>) -> Option<Uuid> {
    session.as_ref().map(|session| session.user_id)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{jwt::generate_jwt_session, schema::User};

    fn keys() -> SessionKeys {
        SessionKeys::new(b"secret", Duration::hours(1))
    }

    fn token() -> String {
        let user = User {
            id: 3,
            email: String::from("a@b.c"),
            username: String::from("chef"),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
        };
        generate_jwt_session(&user, &keys()).unwrap()
    }

    #[tokio::test]
    async fn session_from_cookie() {
        let session = warp::test::request()
            .header("cookie", format!("{SESSION_COOKIE}={}", token()))
            .filter(&with_session(keys()))
            .await
            .unwrap();

        assert_eq!(session.user_id, 3);
    }

    #[tokio::test]
    async fn missing_cookie_is_rejected() {
        let result = warp::test::request().filter(&with_session(keys())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn anonymous_request() {
        let session = warp::test::request()
            .filter(&with_possible_session(keys()))
            .await
            .unwrap();
        assert_eq!(viewer_id(&session), None);

        let session = warp::test::request()
            .header("cookie", format!("{SESSION_COOKIE}=garbage"))
            .filter(&with_possible_session(keys()))
            .await
            .unwrap();
        assert_eq!(viewer_id(&session), None);
    }
}
