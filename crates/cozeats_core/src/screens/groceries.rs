use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use super::{GroupScreen, LoadState};
use crate::{
    CoreError, Result,
    context::AppContext,
    coordinator::GroupFocus,
    id::{GroceryId, GroupId},
    models::{DeletedAll, Grocery},
    validation::require_text,
};

/// Shared grocery list of the selected group
pub struct GroceryScreen {
    ctx: AppContext,
    focus: GroupFocus,
    items: Vec<Grocery>,
    state: LoadState,
}

impl GroceryScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            focus: ctx.group_focus(),
            ctx,
            items: Vec::new(),
            state: LoadState::Idle,
        }
    }

    pub fn items(&self) -> &[Grocery] {
        &self.items
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn group(&self) -> Option<&GroupId> {
        self.focus.local()
    }

    pub fn remaining_count(&self) -> usize {
        self.items.iter().filter(|i| !i.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.items.len() - self.remaining_count()
    }

    pub async fn add_item(&mut self, item: &str) -> Result<Grocery> {
        let item = require_text("Item", item)?;
        let group = self.focus.local().cloned().ok_or(CoreError::NoGroupSelected)?;

        let created = self
            .ctx
            .backend()
            .create_grocery(&group, &item)
            .await
            .map_err(|e| {
                error!("Failed to create grocery item: {}", e);
                e
            })?;
        debug!(grocery = %created.id, "added grocery item");

        self.load(group).await?;
        Ok(created)
    }

    /// Mark an item complete, showing it checked immediately
    ///
    /// Returns `false` without a request when the item is unknown or already
    /// complete. On failure the list is reverted to the server's version.
    pub async fn mark_complete(&mut self, grocery_id: &GroceryId) -> Result<bool> {
        let user = self.ctx.session().require()?;
        let group = self.focus.local().cloned().ok_or(CoreError::NoGroupSelected)?;

        let Some(index) = self
            .items
            .iter()
            .position(|i| &i.id == grocery_id && !i.completed)
        else {
            return Ok(false);
        };

        let snapshot = self.items.clone();
        {
            let item = &mut self.items[index];
            item.completed = true;
            item.completed_by = Some(user.display_name().to_string());
            item.updated_at = Utc::now();
        }

        match self
            .ctx
            .backend()
            .complete_grocery(grocery_id, &user.id)
            .await
        {
            Ok(confirmed) => {
                if let Some(slot) = self.items.iter_mut().find(|i| i.id == confirmed.id) {
                    *slot = confirmed;
                }
                Ok(true)
            }
            Err(e) => {
                error!(grocery = %grocery_id, "Failed to update grocery item: {}", e);
                self.revert(group, snapshot).await;
                self.state = LoadState::from_error(&e);
                Err(e)
            }
        }
    }

    /// Delete one item, hiding it immediately; reverted on failure
    pub async fn delete_item(&mut self, grocery_id: &GroceryId) -> Result<()> {
        let group = self.focus.local().cloned().ok_or(CoreError::NoGroupSelected)?;
        let snapshot = self.items.clone();
        self.items.retain(|i| &i.id != grocery_id);

        match self.ctx.backend().delete_grocery(grocery_id).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!(grocery = %grocery_id, "Failed to delete grocery item: {}", e);
                self.revert(group, snapshot).await;
                self.state = LoadState::from_error(&e);
                Err(e)
            }
        }
    }

    /// Delete every item of the group, returning the server's report
    pub async fn clear_all(&mut self) -> Result<DeletedAll> {
        let group = self.focus.local().cloned().ok_or(CoreError::NoGroupSelected)?;

        let report = self
            .ctx
            .backend()
            .delete_all_groceries(&group)
            .await
            .map_err(|e| {
                error!(group = %group, "Failed to delete all groceries: {}", e);
                self.state = LoadState::from_error(&e);
                e
            })?;

        info!(group = %group, deleted = report.deleted_count, "cleared grocery list");
        self.items.clear();
        self.state = LoadState::Ready;
        Ok(report)
    }

    /// Show the server-confirmed list again, or `snapshot` if it can't be fetched
    async fn revert(&mut self, group: GroupId, snapshot: Vec<Grocery>) {
        if self.load(group).await.is_err() {
            self.items = snapshot;
        }
    }
}

#[async_trait]
impl GroupScreen for GroceryScreen {
    fn group_focus(&mut self) -> &mut GroupFocus {
        &mut self.focus
    }

    async fn load(&mut self, group: GroupId) -> Result<()> {
        match self.ctx.backend().groceries(&group).await {
            Ok(items) => {
                debug!(group = %group, count = items.len(), "loaded groceries");
                self.items = items;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                error!(group = %group, "Failed to fetch groceries: {}", e);
                self.reset(LoadState::from_error(&e));
                Err(e)
            }
        }
    }

    fn reset(&mut self, state: LoadState) {
        self.items.clear();
        self.state = state;
    }
}
