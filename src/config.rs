use std::{
    fmt::{self, Display},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_LIMIT, MIN_LIMIT, RECIPE_COUNT_PER_PAGE, SESSION_LIFETIME_HOURS, USER_COUNT_PER_PAGE,
};

/// Inclusive bounds for `cooking_time` and ingredient amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub min: i32,
    pub max: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min: MIN_LIMIT,
            max: MAX_LIMIT,
        }
    }
}

impl Limits {
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Postgres connection string handed to the sqlx pool.
    pub database_url: String,

    /// HMAC key used to sign session tokens.
    pub session_secret: String,

    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_hours: i64,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default)]
    pub limits: Limits,

    #[serde(default = "default_recipe_page_size")]
    pub recipe_page_size: i64,

    #[serde(default = "default_user_page_size")]
    pub user_page_size: i64,
}

fn default_session_lifetime() -> i64 {
    SESSION_LIFETIME_HOURS
}

fn default_max_connections() -> u32 {
    5
}

fn default_recipe_page_size() -> i64 {
    RECIPE_COUNT_PER_PAGE
}

fn default_user_page_size() -> i64 {
    USER_COUNT_PER_PAGE
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::ParseFailed)?;
        config.check()?;

        Ok(config)
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = tokio::fs::read_to_string(path)
            .await
            .map_err(ConfigError::ReadFailed)?;

        Self::from_toml_str(&s)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.limits.min > self.limits.max {
            log::error!(
                "configured limits are inverted ({} > {})",
                self.limits.min,
                self.limits.max
            );
            return Err(ConfigError::Invalid("limits.min is greater than limits.max"));
        }
        if self.limits.min < MIN_LIMIT {
            log::error!("configured limits.min {} is not positive", self.limits.min);
            return Err(ConfigError::Invalid("limits.min must be at least 1"));
        }
        if self.session_secret.is_empty() {
            return Err(ConfigError::Invalid("session_secret must not be empty"));
        }
        if self.recipe_page_size <= 0 || self.user_page_size <= 0 {
            return Err(ConfigError::Invalid("page sizes must be positive"));
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadFailed(std::io::Error),
    ParseFailed(toml::de::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFailed(e) => write!(f, "Failed to read config file: {e}"),
            ConfigError::ParseFailed(e) => write!(f, "Failed to parse config file: {e}"),
            ConfigError::Invalid(reason) => write!(f, "Invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = Config::from_toml_str(
            r#"
            database_url = "postgres://localhost/recipes"
            session_secret = "hunter2"
            "#,
        )
        .unwrap();

        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.session_lifetime_hours, SESSION_LIFETIME_HOURS);
        assert_eq!(config.recipe_page_size, RECIPE_COUNT_PER_PAGE);
    }

    #[test]
    fn custom_limits() {
        let config = Config::from_toml_str(
            r#"
            database_url = "postgres://localhost/recipes"
            session_secret = "hunter2"

            [limits]
            min = 2
            max = 10
            "#,
        )
        .unwrap();

        assert!(config.limits.contains(2));
        assert!(config.limits.contains(10));
        assert!(!config.limits.contains(11));
    }

    #[test]
    fn inverted_limits_are_rejected() {
        let result = Config::from_toml_str(
            r#"
            database_url = "postgres://localhost/recipes"
            session_secret = "hunter2"

            [limits]
            min = 10
            max = 2
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn min_limit_must_be_positive() {
        for min in [0, -5] {
            let result = Config::from_toml_str(&format!(
                r#"
                database_url = "postgres://localhost/recipes"
                session_secret = "hunter2"

                [limits]
                min = {min}
                max = 10
                "#
            ));

            assert!(matches!(result, Err(ConfigError::Invalid(_))), "min = {min}");
        }
    }
}
