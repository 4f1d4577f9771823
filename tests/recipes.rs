//! Creating, replacing, deleting and listing recipes.

mod common;

#[cfg(test)]
mod tests {
    use recipe_share_sdk::{
        actions,
        error::ServiceError,
        schema::{RecipeDetail, RecipeFilter},
        MAX_LIMIT, MIN_LIMIT,
    };

    use crate::common::{form, ingredient, limits, recipe, store, tag, user};

    fn lines(detail: &RecipeDetail) -> Vec<(i32, i32)> {
        detail
            .ingredients
            .iter()
            .map(|line| (line.id, line.amount))
            .collect()
    }

    /// A read returns exactly the submitted lines, in submission order.
    #[tokio::test]
    async fn create_keeps_line_order() {
        let store = store();
        let author = user(&store, "chef").await;
        let flour = ingredient(&store, "flour", "g").await;
        let milk = ingredient(&store, "milk", "ml").await;
        let eggs = ingredient(&store, "eggs", "pcs").await;
        let breakfast = tag(&store, "breakfast").await;

        let created = actions::create_recipe(
            author,
            form("Pancakes", &[breakfast.id, breakfast.id], &[(milk, 300), (flour, 200), (eggs, 2)]),
            &limits(),
            &store,
        )
        .await
        .unwrap();

        let read = actions::get_recipe(created.id, None, &store).await.unwrap();
        assert_eq!(lines(&read), vec![(milk, 300), (flour, 200), (eggs, 2)]);
        assert_eq!(read.ingredients[1].name, "flour");
        assert_eq!(read.ingredients[1].measurement_unit, "g");
        // duplicate tag ids collapse
        assert_eq!(read.tags, vec![breakfast]);
        assert_eq!(read.author.id, author);
        assert!(!read.is_favorited);
        assert!(!read.is_in_shopping_cart);
    }

    /// The same ingredient twice is rejected and nothing is written.
    #[tokio::test]
    async fn duplicate_ingredient_is_rejected() {
        let store = store();
        let author = user(&store, "chef").await;
        let salt = ingredient(&store, "salt", "g").await;

        let err = actions::create_recipe(
            author,
            form("Salty", &[], &[(salt, 1), (salt, 2)]),
            &limits(),
            &store,
        )
        .await
        .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(err.field(), Some("ingredients[1].id"));
        assert!(err.to_string().contains("duplicate ingredient"));

        let page = actions::list_recipes(RecipeFilter::default(), None, 0, 10, &store)
            .await
            .unwrap();
        assert_eq!(page.total_rows, 0);
    }

    #[tokio::test]
    async fn empty_ingredient_list_is_rejected() {
        let store = store();
        let author = user(&store, "chef").await;

        let err = actions::create_recipe(author, form("Air", &[], &[]), &limits(), &store)
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("ingredients"));
    }

    #[tokio::test]
    async fn amount_bounds_are_inclusive() {
        let store = store();
        let author = user(&store, "chef").await;
        let salt = ingredient(&store, "salt", "g").await;

        for amount in [MIN_LIMIT - 1, MAX_LIMIT + 1] {
            let err = actions::create_recipe(
                author,
                form("Salty", &[], &[(salt, amount)]),
                &limits(),
                &store,
            )
            .await
            .unwrap_err();
            assert!(err.is_validation());
            assert_eq!(err.field(), Some("ingredients[0].amount"));
        }

        for amount in [MIN_LIMIT, MAX_LIMIT] {
            let created = actions::create_recipe(
                author,
                form("Salty", &[], &[(salt, amount)]),
                &limits(),
                &store,
            )
            .await
            .unwrap();
            assert_eq!(lines(&created), vec![(salt, amount)]);
        }
    }

    #[tokio::test]
    async fn name_and_cooking_time_are_checked() {
        let store = store();
        let author = user(&store, "chef").await;
        let salt = ingredient(&store, "salt", "g").await;

        let err = actions::create_recipe(author, form("", &[], &[(salt, 1)]), &limits(), &store)
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("name"));

        let mut slow = form("Slow", &[], &[(salt, 1)]);
        slow.cooking_time = 0;
        let err = actions::create_recipe(author, slow, &limits(), &store)
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("cooking_time"));
    }

    /// Unknown ids are reported together and nothing is written.
    #[tokio::test]
    async fn unknown_references_are_listed() {
        let store = store();
        let author = user(&store, "chef").await;
        let salt = ingredient(&store, "salt", "g").await;

        let err = actions::create_recipe(
            author,
            form("Ghost", &[], &[(salt, 1), (900, 1), (901, 1)]),
            &limits(),
            &store,
        )
        .await
        .unwrap_err();
        match err {
            ServiceError::Reference { field, missing } => {
                assert_eq!(field, "ingredients");
                assert_eq!(missing, vec![900, 901]);
            }
            other => panic!("expected a reference error, got {other:?}"),
        }

        let err = actions::create_recipe(
            author,
            form("Ghost", &[777], &[(salt, 1)]),
            &limits(),
            &store,
        )
        .await
        .unwrap_err();
        assert!(err.is_reference());
        assert_eq!(err.field(), Some("tags"));

        let page = actions::list_recipes(RecipeFilter::default(), None, 0, 10, &store)
            .await
            .unwrap();
        assert_eq!(page.total_rows, 0);
    }

    /// Replacing {A:2, B:3} with {A:5} leaves exactly {A:5}.
    #[tokio::test]
    async fn update_replaces_every_line() {
        let store = store();
        let author = user(&store, "chef").await;
        let a = ingredient(&store, "apple", "pcs").await;
        let b = ingredient(&store, "butter", "g").await;
        let sweet = tag(&store, "sweet").await;

        let created = actions::create_recipe(
            author,
            form("Pie", &[sweet.id], &[(a, 2), (b, 3)]),
            &limits(),
            &store,
        )
        .await
        .unwrap();

        let updated = actions::update_recipe(
            created.id,
            author,
            form("Apple pie", &[], &[(a, 5)]),
            &limits(),
            &store,
        )
        .await
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Apple pie");
        assert_eq!(updated.pub_date, created.pub_date);
        assert_eq!(lines(&updated), vec![(a, 5)]);
        assert!(updated.tags.is_empty());

        let read = actions::get_recipe(created.id, None, &store).await.unwrap();
        assert_eq!(lines(&read), vec![(a, 5)]);
    }

    /// A rejected update leaves the stored recipe untouched.
    #[tokio::test]
    async fn failed_update_changes_nothing() {
        let store = store();
        let author = user(&store, "chef").await;
        let a = ingredient(&store, "apple", "pcs").await;

        let created = recipe(&store, author, "Pie", &[(a, 2)]).await;

        let err = actions::update_recipe(
            created.id,
            author,
            form("Pie", &[], &[(a, 1), (404, 1)]),
            &limits(),
            &store,
        )
        .await
        .unwrap_err();
        assert!(err.is_reference());

        let read = actions::get_recipe(created.id, None, &store).await.unwrap();
        assert_eq!(lines(&read), vec![(a, 2)]);
    }

    #[tokio::test]
    async fn only_the_author_may_write() {
        let store = store();
        let author = user(&store, "chef").await;
        let other = user(&store, "guest").await;
        let a = ingredient(&store, "apple", "pcs").await;

        let created = recipe(&store, author, "Pie", &[(a, 2)]).await;

        let err = actions::update_recipe(
            created.id,
            other,
            form("Mine now", &[], &[(a, 1)]),
            &limits(),
            &store,
        )
        .await
        .unwrap_err();
        assert!(err.is_authorization());

        let err = actions::delete_recipe(created.id, other, &store)
            .await
            .unwrap_err();
        assert!(err.is_authorization());

        actions::delete_recipe(created.id, author, &store)
            .await
            .unwrap();
        let err = actions::get_recipe(created.id, None, &store)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn missing_recipe_is_not_found() {
        let store = store();
        let author = user(&store, "chef").await;
        let a = ingredient(&store, "apple", "pcs").await;

        let err = actions::update_recipe(404, author, form("Pie", &[], &[(a, 1)]), &limits(), &store)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = actions::delete_recipe(404, author, &store).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_or_replace_dispatches_on_id() {
        let store = store();
        let author = user(&store, "chef").await;
        let a = ingredient(&store, "apple", "pcs").await;

        let created =
            actions::create_or_replace_recipe(author, None, form("Pie", &[], &[(a, 1)]), &limits(), &store)
                .await
                .unwrap();
        let replaced = actions::create_or_replace_recipe(
            author,
            Some(created.id),
            form("Tart", &[], &[(a, 3)]),
            &limits(),
            &store,
        )
        .await
        .unwrap();

        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.name, "Tart");
    }

    #[tokio::test]
    async fn list_filters_and_flags() {
        let store = store();
        let chef = user(&store, "chef").await;
        let baker = user(&store, "baker").await;
        let a = ingredient(&store, "apple", "pcs").await;
        let sweet = tag(&store, "sweet").await;

        let pie = actions::create_recipe(chef, form("Pie", &[sweet.id], &[(a, 2)]), &limits(), &store)
            .await
            .unwrap();
        let stew = recipe(&store, chef, "Stew", &[(a, 1)]).await;
        let bread = recipe(&store, baker, "Bread", &[(a, 1)]).await;

        actions::toggle_favorite(baker, pie.id, true, &store)
            .await
            .unwrap();

        let all = actions::list_recipes(RecipeFilter::default(), Some(baker), 0, 10, &store)
            .await
            .unwrap();
        let ids: Vec<i32> = all.rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![bread.id, stew.id, pie.id]);
        assert!(all.rows[2].is_favorited);
        assert!(!all.rows[0].is_favorited);

        let by_chef = RecipeFilter {
            author: Some(chef),
            ..Default::default()
        };
        let page = actions::list_recipes(by_chef, None, 0, 10, &store).await.unwrap();
        assert_eq!(page.total_rows, 2);

        let tagged = RecipeFilter {
            tags: vec![String::from("sweet"), String::from("sour")],
            ..Default::default()
        };
        let page = actions::list_recipes(tagged, None, 0, 10, &store).await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].id, pie.id);

        let favorites = RecipeFilter {
            favorited_by: Some(baker),
            ..Default::default()
        };
        let page = actions::list_recipes(favorites.clone(), Some(baker), 0, 10, &store)
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 1);

        // someone else's favorites are not visible
        let page = actions::list_recipes(favorites, Some(chef), 0, 10, &store)
            .await
            .unwrap();
        assert!(page.rows.is_empty());
    }

    #[tokio::test]
    async fn list_paginates() {
        let store = store();
        let chef = user(&store, "chef").await;
        let a = ingredient(&store, "apple", "pcs").await;
        for name in ["one", "two", "three"] {
            recipe(&store, chef, name, &[(a, 1)]).await;
        }

        let first = actions::list_recipes(RecipeFilter::default(), None, 0, 2, &store)
            .await
            .unwrap();
        assert_eq!(first.rows.len(), 2);
        assert_eq!(first.total_rows, 3);
        assert_eq!(first.next_offset, Some(2));

        let second = actions::list_recipes(RecipeFilter::default(), None, 2, 2, &store)
            .await
            .unwrap();
        assert_eq!(second.rows.len(), 1);
        assert_eq!(second.rows[0].name, "one");
        assert_eq!(second.next_offset, None);
    }

    /// A negative page size reads as an empty page.
    #[tokio::test]
    async fn negative_page_size_is_clamped() {
        let store = store();
        let chef = user(&store, "chef").await;
        let a = ingredient(&store, "apple", "pcs").await;
        recipe(&store, chef, "Pie", &[(a, 1)]).await;

        let page = actions::list_recipes(RecipeFilter::default(), None, 0, -1, &store)
            .await
            .unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.next_offset, None);

        let users = actions::list_users(None, 0, -3, &store).await.unwrap();
        assert!(users.rows.is_empty());

        let subscriptions = actions::list_subscriptions(chef, None, 0, -1, &store)
            .await
            .unwrap();
        assert!(subscriptions.rows.is_empty());
    }
}
