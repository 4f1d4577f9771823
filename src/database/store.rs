// Insert and replace of a recipe must be all-or-nothing.

use std::future::Future;

use super::{
    error::ServiceError,
    schema::{
        Ingredient, Membership, NewIngredient, NewTag, NewUser, Recipe, RecipeFilter, RecipeLine,
        RecipeSummary, Tag, Uuid, User,
    },
    validation::ValidatedRecipe,
};

pub type StoreResult<T> = Result<T, ServiceError>;

pub trait Store: Send + Sync {
    // users

    fn insert_user(&self, user: NewUser) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    fn get_user(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    fn update_password(
        &self,
        id: Uuid,
        password: String,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn list_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<User>, i64)>> + Send;

    // tags

    fn insert_tag(&self, tag: NewTag) -> impl Future<Output = StoreResult<Option<Tag>>> + Send;

    fn get_tag(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Tag>>> + Send;

    fn list_tags(&self) -> impl Future<Output = StoreResult<Vec<Tag>>> + Send;

    fn existing_tags(&self, ids: &[Uuid]) -> impl Future<Output = StoreResult<Vec<Uuid>>> + Send;

    // ingredients

    fn insert_ingredient(
        &self,
        ingredient: NewIngredient,
    ) -> impl Future<Output = StoreResult<Ingredient>> + Send;

    fn get_ingredient(
        &self,
        id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Ingredient>>> + Send;

    fn search_ingredients(
        &self,
        query: &str,
    ) -> impl Future<Output = StoreResult<Vec<Ingredient>>> + Send;

    fn existing_ingredients(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = StoreResult<Vec<Uuid>>> + Send;

    // recipes

    /// Writes the recipe row, its lines and its tag links in one transaction.
    fn insert_recipe(
        &self,
        author_id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> impl Future<Output = StoreResult<Recipe>> + Send;

    /// `None` when the recipe is gone.
    fn replace_recipe(
        &self,
        id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> impl Future<Output = StoreResult<Option<Recipe>>> + Send;

    fn delete_recipe(&self, id: Uuid) -> impl Future<Output = StoreResult<bool>> + Send;

    fn get_recipe(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Recipe>>> + Send;

    fn list_recipe_lines(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<RecipeLine>>> + Send;

    fn list_recipe_tags(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<Tag>>> + Send;

    fn list_recipes(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<Recipe>, i64)>> + Send;

    fn list_author_recipes(
        &self,
        author_id: Uuid,
        limit: Option<i64>,
    ) -> impl Future<Output = StoreResult<(Vec<RecipeSummary>, i64)>> + Send;

    // favorites and shopping cart

    fn membership_exists(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// `false` when the pair already exists.
    fn insert_membership(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn delete_membership(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn list_cart_lines(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<RecipeLine>>> + Send;

    // subscriptions

    fn subscription_exists(
        &self,
        follower_id: Uuid,
        author_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// `false` when the pair already exists.
    fn insert_subscription(
        &self,
        follower_id: Uuid,
        author_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn delete_subscription(
        &self,
        follower_id: Uuid,
        author_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    fn list_subscribed_authors(
        &self,
        follower_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<User>, i64)>> + Send;
}
