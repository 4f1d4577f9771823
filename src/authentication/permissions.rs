use crate::{
    error::ServiceError,
    schema::{Recipe, Uuid},
};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ActionType {
    UpdateRecipe,
    DeleteRecipe,
}

impl ActionType {
    fn verb(&self) -> &'static str {
        match self {
            ActionType::UpdateRecipe => "update",
            ActionType::DeleteRecipe => "delete",
        }
    }

    /// Recipes are read-only for everyone but their author.
    pub fn authorize(self, recipe: &Recipe, user_id: Uuid) -> Result<(), ServiceError> {
        if recipe.author_id != user_id {
            log::debug!(
                "user {user_id} tried to {} recipe {} owned by {}",
                self.verb(),
                recipe.id,
                recipe.author_id
            );
            return Err(ServiceError::Authorization(format!(
                "Only the author may {} this recipe",
                self.verb()
            )));
        }
        Ok(())
    }
}
