//! Tags and ingredients.

mod common;

#[cfg(test)]
mod tests {
    use recipe_share_sdk::{actions, schema::NewTag};

    use crate::common::{ingredient, store, tag};

    fn new_tag(slug: &str, color: Option<&str>) -> NewTag {
        NewTag {
            name: String::from("Dinner"),
            color: color.map(String::from),
            slug: slug.to_string(),
        }
    }

    #[tokio::test]
    async fn tag_rules() {
        let store = store();
        let dinner = tag(&store, "dinner").await;
        assert_eq!(actions::get_tag(dinner.id, &store).await.unwrap(), dinner);

        let err = actions::create_tag(new_tag("dinner", None), &store)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let err = actions::create_tag(new_tag("late dinner", None), &store)
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("slug"));

        for color in ["red", "#12345", "#12345g", "#1234567"] {
            let err = actions::create_tag(new_tag("supper", Some(color)), &store)
                .await
                .unwrap_err();
            assert_eq!(err.field(), Some("color"), "{color}");
        }

        assert!(actions::create_tag(new_tag("supper", Some("#A0b1C2")), &store)
            .await
            .is_ok());
        assert!(actions::get_tag(404, &store).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn tags_are_listed_by_name() {
        let store = store();
        tag(&store, "lunch").await;
        tag(&store, "breakfast").await;

        let slugs: Vec<String> = actions::list_tags(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.slug)
            .collect();
        assert_eq!(slugs, vec!["breakfast", "lunch"]);
    }

    #[tokio::test]
    async fn ingredient_search() {
        let store = store();
        let sugar = ingredient(&store, "Sugar", "g").await;
        ingredient(&store, "Brown sugar", "g").await;
        ingredient(&store, "Salt", "g").await;

        let found: Vec<String> = actions::search_ingredients("SUG", &store)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(found, vec!["Brown sugar", "Sugar"]);

        assert_eq!(actions::search_ingredients("", &store).await.unwrap().len(), 3);
        assert_eq!(
            actions::get_ingredient(sugar, &store).await.unwrap().measurement_unit,
            "g"
        );
        assert!(actions::get_ingredient(404, &store)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
