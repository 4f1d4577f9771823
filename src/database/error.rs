use std::fmt::{self, Display};

use potion::{Error, HtmlError};
use warp::reject::Rejection;

use super::schema::Uuid;

#[derive(Debug, Clone)]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Database(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(e),
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("Column not found: {e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for QueryError {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::new(format!("{value}"))
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        Error {
            code: 500,
            info: Some(value.info),
            redirect: None,
        }
    }
}

/// Every failure a service function reports back to its caller.
#[derive(Debug, Clone)]
pub enum ServiceError {
    /// A submitted value broke a field rule.
    Validation { field: String, message: String },
    /// Submitted ids that do not exist.
    Reference { field: String, missing: Vec<Uuid> },
    Conflict(String),
    NotFound(String),
    Authorization(String),
    Authentication(String),
    Storage(QueryError),
}

impl ServiceError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn reference(field: &str, missing: Vec<Uuid>) -> Self {
        Self::Reference {
            field: field.to_string(),
            missing,
        }
    }

    pub fn conflict(info: impl Into<String>) -> Self {
        Self::Conflict(info.into())
    }

    pub fn not_found(info: impl Into<String>) -> Self {
        Self::NotFound(info.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Offending field, when the error concerns one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } | Self::Reference { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(value: sqlx::Error) -> Self {
        if let sqlx::Error::Database(e) = &value {
            if e.is_unique_violation() {
                return Self::Conflict(format!("{e}"));
            }
            // a row removed after the existence checks ran
            if e.is_foreign_key_violation() {
                return match e.constraint() {
                    Some(c) if c.contains("ingredient_id") => Self::reference("ingredients", vec![]),
                    Some(c) if c.contains("tag_id") => Self::reference("tags", vec![]),
                    _ => Self::Conflict(format!("{e}")),
                };
            }
            if e.is_check_violation() {
                let field = e.constraint().unwrap_or("value");
                return Self::validation(field, format!("{e}"));
            }
        }
        Self::Storage(QueryError::from(value))
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        Self::Storage(value)
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation { field, message } => write!(f, "{field}: {message}"),
            ServiceError::Reference { field, missing } => {
                let ids = missing
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(f, "{field}: unknown ids [{ids}]")
            }
            ServiceError::Conflict(info) => write!(f, "Conflict: {info}"),
            ServiceError::NotFound(info) => write!(f, "Not found: {info}"),
            ServiceError::Authorization(info) => write!(f, "Unauthorized: {info}"),
            ServiceError::Authentication(info) => write!(f, "Invalid session: {info}"),
            ServiceError::Storage(e) => write!(f, "Storage: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ServiceError> for Error {
    fn from(value: ServiceError) -> Self {
        let info = value.to_string();
        match value {
            ServiceError::Validation { .. } | ServiceError::Reference { .. } => {
                HtmlError::InvalidRequest.new(&info)
            }
            ServiceError::Conflict(_) => Error {
                code: 409,
                info: Some(info),
                redirect: None,
            },
            ServiceError::NotFound(_) => Error {
                code: 404,
                info: Some(info),
                redirect: None,
            },
            ServiceError::Authorization(_) => HtmlError::Unauthorized.new(&info),
            ServiceError::Authentication(_) => HtmlError::InvalidSession.new(&info),
            ServiceError::Storage(e) => e.into(),
        }
    }
}

impl From<ServiceError> for Rejection {
    fn from(value: ServiceError) -> Self {
        let error: Error = value.into();
        error.into()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct PgFailure {
        kind: ErrorKind,
        constraint: &'static str,
    }

    impl Display for PgFailure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "violates constraint \"{}\"", self.constraint)
        }
    }

    impl std::error::Error for PgFailure {}

    impl DatabaseError for PgFailure {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            Some(self.constraint)
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn database_error(kind: ErrorKind, constraint: &'static str) -> ServiceError {
        sqlx::Error::Database(Box::new(PgFailure { kind, constraint })).into()
    }

    #[test]
    fn vanished_ingredient_is_a_reference_error() {
        let error = database_error(
            ErrorKind::ForeignKeyViolation,
            "recipe_ingredients_ingredient_id_fkey",
        );
        assert!(error.is_reference());
        assert_eq!(error.field(), Some("ingredients"));

        let error = database_error(ErrorKind::ForeignKeyViolation, "recipe_tags_tag_id_fkey");
        assert_eq!(error.field(), Some("tags"));
    }

    #[test]
    fn constraint_violations_are_not_storage_errors() {
        let error = database_error(ErrorKind::UniqueViolation, "tags_slug_key");
        assert!(error.is_conflict());

        let error = database_error(ErrorKind::CheckViolation, "recipe_ingredients_amount_check");
        assert!(error.is_validation());
        assert_eq!(error.field(), Some("recipe_ingredients_amount_check"));
    }

    #[test]
    fn reference_error_lists_missing_ids() {
        let error = ServiceError::reference("tags", vec![3, 7]);

        assert_eq!(error.field(), Some("tags"));
        assert_eq!(error.to_string(), "tags: unknown ids [3, 7]");
    }

    #[test]
    fn conversion_to_page_error_keeps_status() {
        let error: Error = ServiceError::conflict("already in favorites").into();
        assert_eq!(error.code, 409);

        let error: Error = ServiceError::not_found("recipe 4").into();
        assert_eq!(error.code, 404);
    }
}
