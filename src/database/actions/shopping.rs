use std::collections::BTreeMap;

use crate::{
    error::ServiceError,
    schema::{RecipeLine, ShoppingListItem, Uuid},
    store::Store,
};

/// Sums amounts per (ingredient name, measurement unit). The same name in two
/// units stays two items. Output is sorted by name, then unit.
pub fn aggregate_lines(lines: impl IntoIterator<Item = RecipeLine>) -> Vec<ShoppingListItem> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for line in lines {
        *totals.entry((line.name, line.measurement_unit)).or_default() += i64::from(line.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

/// Totals over every recipe in the user's shopping cart. An empty cart gives
/// an empty list.
pub async fn build_shopping_list<S: Store>(
    user_id: Uuid,
    store: &S,
) -> Result<Vec<ShoppingListItem>, ServiceError> {
    let lines = store.list_cart_lines(user_id).await?;
    log::debug!("aggregating {} cart lines for user {user_id}", lines.len());

    Ok(aggregate_lines(lines))
}

/// One `"{name} - {amount}{unit}."` line per item.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "{} - {}{}.",
                item.name, item.total_amount, item.measurement_unit
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
