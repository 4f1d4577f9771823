use sqlx::{postgres::PgPoolOptions, Pool, Postgres, QueryBuilder, Transaction};

use crate::config::Config;

use super::{
    error::{QueryError, ServiceError},
    schema::{
        Ingredient, Membership, NewIngredient, NewTag, NewUser, Recipe, RecipeFilter, RecipeLine,
        RecipeRow, RecipeSummary, Tag, Uuid, User,
    },
    store::{Store, StoreResult},
    validation::ValidatedRecipe,
};

#[derive(sqlx::FromRow, Debug, Clone)]
struct UserRow {
    id: Uuid,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    password: String,

    count: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            password: row.password,
        }
    }
}

/// Escapes `LIKE` wildcards so user input is matched literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Inserts the ingredient lines and tag links of a recipe inside `tx`.
async fn insert_links(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    recipe: &ValidatedRecipe,
) -> Result<(), sqlx::Error> {
    if !recipe.ingredients().is_empty() {
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
        );

        query_builder.push_values(recipe.ingredients(), |mut b, line| {
            b.push_bind(recipe_id)
                .push_bind(line.ingredient_id)
                .push_bind(line.amount);
        });

        query_builder.build().execute(&mut **tx).await?;
    }

    if !recipe.tags().is_empty() {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

        query_builder.push_values(recipe.tags(), |mut b, tag_id| {
            b.push_bind(recipe_id).push_bind(*tag_id);
        });

        query_builder.build().execute(&mut **tx).await?;
    }

    Ok(())
}

/// [`Store`] backed by a Postgres pool. Run [`PgStore::migrate`] once before use.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self, ServiceError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), ServiceError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| QueryError::from(e).into())
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<Option<User>> {
        let row: Option<User> = sqlx::query_as(
            "
            INSERT INTO users (email, username, first_name, last_name, password)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING RETURNING *;
        ",
        )
        .bind(user.email)
        .bind(user.username)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update_password(&self, id: Uuid, password: String) -> StoreResult<()> {
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_users(&self, limit: i64, offset: i64) -> StoreResult<(Vec<User>, i64)> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT u.*, COUNT(*) OVER() AS count FROM users u ORDER BY u.id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_count = rows.first().map(|row| row.count).unwrap_or(0);
        Ok((rows.into_iter().map(User::from).collect(), total_count))
    }

    async fn insert_tag(&self, tag: NewTag) -> StoreResult<Option<Tag>> {
        let row: Option<Tag> = sqlx::query_as(
            "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING *",
        )
        .bind(tag.name)
        .bind(tag.color)
        .bind(tag.slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn existing_tags(&self, ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn insert_ingredient(&self, ingredient: NewIngredient) -> StoreResult<Ingredient> {
        let row: Ingredient = sqlx::query_as(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING *",
        )
        .bind(ingredient.name)
        .bind(ingredient.measurement_unit)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn get_ingredient(&self, id: Uuid) -> StoreResult<Option<Ingredient>> {
        let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn search_ingredients(&self, query: &str) -> StoreResult<Vec<Ingredient>> {
        let rows: Vec<Ingredient> =
            sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name, id")
                .bind(like_pattern(query))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }

    async fn existing_ingredients(&self, ids: &[Uuid]) -> StoreResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.0).collect())
    }

    async fn insert_recipe(&self, author_id: Uuid, recipe: &ValidatedRecipe) -> StoreResult<Recipe> {
        let mut tx = self.pool.begin().await?;

        let row: Recipe = sqlx::query_as(
            "
            INSERT INTO recipes (author_id, name, text, image, cooking_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
        ",
        )
        .bind(author_id)
        .bind(&recipe.name)
        .bind(&recipe.text)
        .bind(&recipe.image)
        .bind(recipe.cooking_time)
        .fetch_one(&mut *tx)
        .await?;

        insert_links(&mut tx, row.id, recipe).await?;
        tx.commit().await?;

        Ok(row)
    }

    async fn replace_recipe(&self, id: Uuid, recipe: &ValidatedRecipe) -> StoreResult<Option<Recipe>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<Recipe> = sqlx::query_as(
            "
            UPDATE recipes SET name = $1, text = $2, image = $3, cooking_time = $4
            WHERE id = $5
            RETURNING *
        ",
        )
        .bind(&recipe.name)
        .bind(&recipe.text)
        .bind(&recipe.image)
        .bind(recipe.cooking_time)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_links(&mut tx, id, recipe).await?;
        tx.commit().await?;

        Ok(Some(row))
    }

    async fn delete_recipe(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_recipe_lines(&self, recipe_id: Uuid) -> StoreResult<Vec<RecipeLine>> {
        let rows: Vec<RecipeLine> = sqlx::query_as(
            "
            SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name,
                i.measurement_unit AS measurement_unit, ri.amount AS amount
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = $1
            ORDER BY ri.id
        ",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_recipe_tags(&self, recipe_id: Uuid) -> StoreResult<Vec<Tag>> {
        let rows: Vec<Tag> = sqlx::query_as(
            "
            SELECT t.* FROM recipe_tags rt
            INNER JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = $1
            ORDER BY t.name, t.id
        ",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<Recipe>, i64)> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

        if let Some(author) = filter.author {
            query_builder.push(" AND r.author_id = ").push_bind(author);
        }

        if !filter.tags.is_empty() {
            query_builder
                .push(
                    " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(",
                )
                .push_bind(filter.tags.to_owned())
                .push("))");
        }

        if let Some(user_id) = filter.favorited_by {
            query_builder
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }

        if let Some(user_id) = filter.in_cart_of {
            query_builder
                .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
                .push_bind(user_id)
                .push(")");
        }

        query_builder
            .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<RecipeRow> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let total_count = rows.first().map(|row| row.count).unwrap_or(0);
        Ok((rows.into_iter().map(Recipe::from).collect(), total_count))
    }

    async fn list_author_recipes(
        &self,
        author_id: Uuid,
        limit: Option<i64>,
    ) -> StoreResult<(Vec<RecipeSummary>, i64)> {
        // LIMIT NULL means no limit
        let rows: Vec<RecipeSummary> = sqlx::query_as(
            "
            SELECT id, name, image, cooking_time FROM recipes
            WHERE author_id = $1
            ORDER BY pub_date DESC, id DESC
            LIMIT $2
        ",
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, count.0))
    }

    async fn membership_exists(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as(&format!(
            "SELECT recipe_id FROM {} WHERE user_id = $1 AND recipe_id = $2",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn insert_membership(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<bool> {
        let result = sqlx::query(&format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_membership(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
            kind.table()
        ))
        .bind(user_id)
        .bind(recipe_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_cart_lines(&self, user_id: Uuid) -> StoreResult<Vec<RecipeLine>> {
        let rows: Vec<RecipeLine> = sqlx::query_as(
            "
            SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name,
                i.measurement_unit AS measurement_unit, ri.amount AS amount
            FROM shopping_cart c
            INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE c.user_id = $1
            ORDER BY ri.recipe_id, ri.id
        ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn subscription_exists(&self, follower_id: Uuid, author_id: Uuid) -> StoreResult<bool> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT author_id FROM subscriptions WHERE follower_id = $1 AND author_id = $2",
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn insert_subscription(&self, follower_id: Uuid, author_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO subscriptions (follower_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_subscription(&self, follower_id: Uuid, author_id: Uuid) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM subscriptions WHERE follower_id = $1 AND author_id = $2")
                .bind(follower_id)
                .bind(author_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_subscribed_authors(
        &self,
        follower_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<User>, i64)> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "
            SELECT u.*, COUNT(*) OVER() AS count
            FROM subscriptions s
            INNER JOIN users u ON u.id = s.author_id
            WHERE s.follower_id = $1
            ORDER BY s.created_at DESC, u.id
            LIMIT $2 OFFSET $3
        ",
        )
        .bind(follower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_count = rows.first().map(|row| row.count).unwrap_or(0);
        Ok((rows.into_iter().map(User::from).collect(), total_count))
    }
}
