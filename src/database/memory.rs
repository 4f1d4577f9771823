use std::{
    collections::BTreeSet,
    future::{ready, Future},
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;

use super::{
    schema::{
        Ingredient, IngredientAmount, Membership, NewIngredient, NewTag, NewUser, Recipe,
        RecipeFilter, RecipeLine, RecipeSummary, Subscription, Tag, Uuid, User,
    },
    store::{Store, StoreResult},
    validation::ValidatedRecipe,
};

#[derive(Default)]
struct MemoryState {
    next_id: Uuid,

    users: Vec<User>,
    tags: Vec<Tag>,
    ingredients: Vec<Ingredient>,
    recipes: Vec<Recipe>,

    /// (recipe id, line) in submission order.
    lines: Vec<(Uuid, IngredientAmount)>,
    /// (recipe id, tag id)
    recipe_tags: Vec<(Uuid, Uuid)>,
    memberships: BTreeSet<(Membership, Uuid, Uuid)>,
    subscriptions: Vec<Subscription>,
}

impl MemoryState {
    fn next_id(&mut self) -> Uuid {
        self.next_id += 1;
        self.next_id
    }

    fn recipe_lines(&self, recipe_id: Uuid) -> Vec<RecipeLine> {
        self.lines
            .iter()
            .filter(|(id, _)| *id == recipe_id)
            .filter_map(|(id, line)| {
                self.ingredients
                    .iter()
                    .find(|ingredient| ingredient.id == line.ingredient_id)
                    .map(|ingredient| RecipeLine {
                        recipe_id: *id,
                        ingredient_id: ingredient.id,
                        name: ingredient.name.to_owned(),
                        measurement_unit: ingredient.measurement_unit.to_owned(),
                        amount: line.amount,
                    })
            })
            .collect()
    }

    fn link_recipe(&mut self, recipe_id: Uuid, recipe: &ValidatedRecipe) {
        self.lines.extend(
            recipe
                .ingredients()
                .iter()
                .map(|line| (recipe_id, line.to_owned())),
        );
        self.recipe_tags
            .extend(recipe.tags().iter().map(|tag_id| (recipe_id, *tag_id)));
    }

    fn unlink_recipe(&mut self, recipe_id: Uuid) {
        self.lines.retain(|(id, _)| *id != recipe_id);
        self.recipe_tags.retain(|(id, _)| *id != recipe_id);
    }

    fn matches(&self, recipe: &Recipe, filter: &RecipeFilter) -> bool {
        if filter.author.is_some_and(|author| author != recipe.author_id) {
            return false;
        }

        if !filter.tags.is_empty() {
            let tagged = self
                .recipe_tags
                .iter()
                .filter(|(recipe_id, _)| *recipe_id == recipe.id)
                .filter_map(|(_, tag_id)| self.tags.iter().find(|tag| tag.id == *tag_id))
                .any(|tag| filter.tags.contains(&tag.slug));
            if !tagged {
                return false;
            }
        }

        let in_list = |kind: Membership, user: Option<Uuid>| match user {
            Some(user_id) => self.memberships.contains(&(kind, user_id, recipe.id)),
            None => true,
        };

        in_list(Membership::Favorite, filter.favorited_by)
            && in_list(Membership::ShoppingCart, filter.in_cart_of)
    }

    fn newest_first(&self) -> Vec<&Recipe> {
        let mut recipes: Vec<&Recipe> = self.recipes.iter().collect();
        recipes.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        recipes
    }
}

fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

/// A [`Store`] that keeps every table in memory behind a single mutex.
///
/// Each call takes the lock once, so multi-row writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with<T>(
        &self,
        f: impl FnOnce(&mut MemoryState) -> T,
    ) -> impl Future<Output = StoreResult<T>> + Send
    where
        T: Send,
    {
        let result = f(&mut *self.lock());
        ready(Ok(result))
    }
}

impl Store for MemoryStore {
    fn insert_user(&self, user: NewUser) -> impl Future<Output = StoreResult<Option<User>>> + Send {
        self.with(|state| {
            let taken = state
                .users
                .iter()
                .any(|u| u.email == user.email || u.username == user.username);
            if taken {
                return None;
            }

            let user = User {
                id: state.next_id(),
                email: user.email,
                username: user.username,
                first_name: user.first_name,
                last_name: user.last_name,
                password: user.password,
            };
            state.users.push(user.to_owned());
            Some(user)
        })
    }

    fn get_user(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<User>>> + Send {
        self.with(|state| state.users.iter().find(|u| u.id == id).cloned())
    }

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = StoreResult<Option<User>>> + Send {
        self.with(|state| state.users.iter().find(|u| u.email == email).cloned())
    }

    fn update_password(
        &self,
        id: Uuid,
        password: String,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        self.with(|state| {
            if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
                user.password = password;
            }
        })
    }

    fn list_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<User>, i64)>> + Send {
        self.with(|state| {
            let mut users = state.users.to_owned();
            users.sort_by_key(|u| u.id);
            (page(&users, limit, offset), users.len() as i64)
        })
    }

    fn insert_tag(&self, tag: NewTag) -> impl Future<Output = StoreResult<Option<Tag>>> + Send {
        self.with(|state| {
            if state.tags.iter().any(|t| t.slug == tag.slug) {
                return None;
            }

            let tag = Tag {
                id: state.next_id(),
                name: tag.name,
                color: tag.color,
                slug: tag.slug,
            };
            state.tags.push(tag.to_owned());
            Some(tag)
        })
    }

    fn get_tag(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Tag>>> + Send {
        self.with(|state| state.tags.iter().find(|t| t.id == id).cloned())
    }

    fn list_tags(&self) -> impl Future<Output = StoreResult<Vec<Tag>>> + Send {
        self.with(|state| {
            let mut tags = state.tags.to_owned();
            tags.sort_by(|a, b| a.name.cmp(&b.name));
            tags
        })
    }

    fn existing_tags(&self, ids: &[Uuid]) -> impl Future<Output = StoreResult<Vec<Uuid>>> + Send {
        self.with(|state| {
            ids.iter()
                .copied()
                .filter(|id| state.tags.iter().any(|t| t.id == *id))
                .collect()
        })
    }

    fn insert_ingredient(
        &self,
        ingredient: NewIngredient,
    ) -> impl Future<Output = StoreResult<Ingredient>> + Send {
        self.with(|state| {
            let ingredient = Ingredient {
                id: state.next_id(),
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
            };
            state.ingredients.push(ingredient.to_owned());
            ingredient
        })
    }

    fn get_ingredient(
        &self,
        id: Uuid,
    ) -> impl Future<Output = StoreResult<Option<Ingredient>>> + Send {
        self.with(|state| state.ingredients.iter().find(|i| i.id == id).cloned())
    }

    fn search_ingredients(
        &self,
        query: &str,
    ) -> impl Future<Output = StoreResult<Vec<Ingredient>>> + Send {
        let query = query.to_lowercase();
        self.with(move |state| {
            let mut found: Vec<Ingredient> = state
                .ingredients
                .iter()
                .filter(|i| i.name.to_lowercase().contains(&query))
                .cloned()
                .collect();
            found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            found
        })
    }

    fn existing_ingredients(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = StoreResult<Vec<Uuid>>> + Send {
        self.with(|state| {
            ids.iter()
                .copied()
                .filter(|id| state.ingredients.iter().any(|i| i.id == *id))
                .collect()
        })
    }

    fn insert_recipe(
        &self,
        author_id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> impl Future<Output = StoreResult<Recipe>> + Send {
        self.with(|state| {
            let row = Recipe {
                id: state.next_id(),
                author_id,
                name: recipe.name.to_owned(),
                text: recipe.text.to_owned(),
                image: recipe.image.to_owned(),
                cooking_time: recipe.cooking_time,
                pub_date: Utc::now(),
            };
            state.recipes.push(row.to_owned());
            state.link_recipe(row.id, recipe);
            row
        })
    }

    fn replace_recipe(
        &self,
        id: Uuid,
        recipe: &ValidatedRecipe,
    ) -> impl Future<Output = StoreResult<Option<Recipe>>> + Send {
        self.with(|state| {
            let row = state.recipes.iter_mut().find(|r| r.id == id)?;
            row.name = recipe.name.to_owned();
            row.text = recipe.text.to_owned();
            row.image = recipe.image.to_owned();
            row.cooking_time = recipe.cooking_time;
            let row = row.to_owned();

            state.unlink_recipe(id);
            state.link_recipe(id, recipe);
            Some(row)
        })
    }

    fn delete_recipe(&self, id: Uuid) -> impl Future<Output = StoreResult<bool>> + Send {
        self.with(|state| {
            let before = state.recipes.len();
            state.recipes.retain(|r| r.id != id);
            if state.recipes.len() == before {
                return false;
            }

            state.unlink_recipe(id);
            state.memberships.retain(|(_, _, recipe_id)| *recipe_id != id);
            true
        })
    }

    fn get_recipe(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Recipe>>> + Send {
        self.with(|state| state.recipes.iter().find(|r| r.id == id).cloned())
    }

    fn list_recipe_lines(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<RecipeLine>>> + Send {
        self.with(|state| state.recipe_lines(recipe_id))
    }

    fn list_recipe_tags(
        &self,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<Tag>>> + Send {
        self.with(|state| {
            let mut tags: Vec<Tag> = state
                .recipe_tags
                .iter()
                .filter(|(id, _)| *id == recipe_id)
                .filter_map(|(_, tag_id)| state.tags.iter().find(|t| t.id == *tag_id).cloned())
                .collect();
            tags.sort_by(|a, b| a.name.cmp(&b.name));
            tags
        })
    }

    fn list_recipes(
        &self,
        filter: &RecipeFilter,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<Recipe>, i64)>> + Send {
        self.with(|state| {
            let matching: Vec<Recipe> = state
                .newest_first()
                .into_iter()
                .filter(|recipe| state.matches(recipe, filter))
                .cloned()
                .collect();
            (page(&matching, limit, offset), matching.len() as i64)
        })
    }

    fn list_author_recipes(
        &self,
        author_id: Uuid,
        limit: Option<i64>,
    ) -> impl Future<Output = StoreResult<(Vec<RecipeSummary>, i64)>> + Send {
        self.with(|state| {
            let recipes: Vec<RecipeSummary> = state
                .newest_first()
                .into_iter()
                .filter(|recipe| recipe.author_id == author_id)
                .map(RecipeSummary::from)
                .collect();
            let total = recipes.len() as i64;
            let shown = page(&recipes, limit.unwrap_or(total), 0);
            (shown, total)
        })
    }

    fn membership_exists(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        self.with(|state| state.memberships.contains(&(kind, user_id, recipe_id)))
    }

    fn insert_membership(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        self.with(|state| state.memberships.insert((kind, user_id, recipe_id)))
    }

    fn delete_membership(
        &self,
        kind: Membership,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        self.with(|state| state.memberships.remove(&(kind, user_id, recipe_id)))
    }

    fn list_cart_lines(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = StoreResult<Vec<RecipeLine>>> + Send {
        self.with(|state| {
            state
                .memberships
                .iter()
                .filter(|(kind, user, _)| *kind == Membership::ShoppingCart && *user == user_id)
                .flat_map(|(_, _, recipe_id)| state.recipe_lines(*recipe_id))
                .collect()
        })
    }

    fn subscription_exists(
        &self,
        follower_id: Uuid,
        author_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        self.with(|state| {
            state
                .subscriptions
                .iter()
                .any(|s| s.follower_id == follower_id && s.author_id == author_id)
        })
    }

    fn insert_subscription(
        &self,
        follower_id: Uuid,
        author_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        self.with(|state| {
            let exists = state
                .subscriptions
                .iter()
                .any(|s| s.follower_id == follower_id && s.author_id == author_id);
            if exists {
                return false;
            }

            state.subscriptions.push(Subscription {
                follower_id,
                author_id,
                created_at: Utc::now(),
            });
            true
        })
    }

    fn delete_subscription(
        &self,
        follower_id: Uuid,
        author_id: Uuid,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        self.with(|state| {
            let before = state.subscriptions.len();
            state
                .subscriptions
                .retain(|s| !(s.follower_id == follower_id && s.author_id == author_id));
            state.subscriptions.len() != before
        })
    }

    fn list_subscribed_authors(
        &self,
        follower_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<User>, i64)>> + Send {
        self.with(|state| {
            // pushed in subscription order, so reversing gives newest first
            let authors: Vec<User> = state
                .subscriptions
                .iter()
                .rev()
                .filter(|s| s.follower_id == follower_id)
                .filter_map(|s| state.users.iter().find(|u| u.id == s.author_id).cloned())
                .collect();
            (page(&authors, limit, offset), authors.len() as i64)
        })
    }
}
