pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const USER_COUNT_PER_PAGE: i64 = 6;

/// Inclusive bounds shared by `cooking_time` and ingredient amounts.
pub const MIN_LIMIT: i32 = 1;
pub const MAX_LIMIT: i32 = 32000;

pub const MAX_NAME_LENGTH: usize = 200;

pub const RESERVED_USERNAMES: &[&str] = &["me"];

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 24;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
