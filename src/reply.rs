use warp::{
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    reply::{self, Reply, Response},
};

use crate::{
    actions::shopping::render_shopping_list, constants::SHOPPING_LIST_FILENAME,
    schema::ShoppingListItem,
};

/// The rendered shopping list as a plain text file download.
pub fn shopping_list_reply(items: &[ShoppingListItem]) -> Response {
    let body = render_shopping_list(items);

    let reply = reply::with_header(body, CONTENT_TYPE, "text/plain; charset=utf-8");
    reply::with_header(
        reply,
        CONTENT_DISPOSITION,
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    )
    .into_response()
}
