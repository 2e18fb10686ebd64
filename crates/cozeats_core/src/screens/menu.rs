use async_trait::async_trait;
use tracing::{debug, error, info};

use super::{GroupScreen, LoadState};
use crate::{
    CoreError, Result,
    context::AppContext,
    coordinator::GroupFocus,
    id::GroupId,
    models::{CreatedGroup, Group, JoinedGroup},
    validation::{normalize_invite_code, require_text},
};

/// Side menu listing the user's groups; the only place the selection is switched
pub struct MenuScreen {
    ctx: AppContext,
    focus: GroupFocus,
    open: bool,
    groups: Vec<Group>,
    state: LoadState,
}

impl MenuScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            focus: ctx.group_focus(),
            ctx,
            open: false,
            groups: Vec::new(),
            state: LoadState::Idle,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// The group highlighted as selected
    pub fn selected(&self) -> Option<&GroupId> {
        self.focus.local()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Open the menu and fetch the user's groups
    ///
    /// A user without any group still gets an open, empty menu so they can
    /// create or join one.
    pub async fn open(&mut self) -> Result<()> {
        self.open = true;
        match self.on_focus().await {
            Err(CoreError::NoGroupMemberships { .. }) => {
                self.groups.clear();
                self.state = LoadState::Ready;
                Ok(())
            }
            other => other,
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.on_blur();
    }

    /// Persist `group` as the selection and close the menu
    ///
    /// Every focused screen observes the new value and refetches.
    pub async fn select_group(&mut self, group: GroupId) -> Result<()> {
        if self.focus.local() == Some(&group) {
            self.close();
            return Ok(());
        }
        self.focus.switch_to(group.clone()).await.map_err(|e| {
            error!(group = %group, "Failed to save selected group: {}", e);
            e
        })?;
        info!(group = %group, "switched group");
        self.close();
        Ok(())
    }

    pub async fn create_group(&mut self, name: &str) -> Result<CreatedGroup> {
        let name = require_text("Group name", name)?;
        let user = self.ctx.session().require()?;

        let created = self
            .ctx
            .backend()
            .create_group(&user.id, &name)
            .await
            .map_err(|e| {
                error!("Failed to create group: {}", e);
                e
            })?;
        info!(group = %created.id, name = %created.name, "created group");

        self.refresh_groups().await?;
        Ok(created)
    }

    /// Redeem an invite code. Malformed codes never reach the network.
    pub async fn join_group(&mut self, code: &str) -> Result<JoinedGroup> {
        let code = normalize_invite_code(code)?;
        let user = self.ctx.session().require()?;

        let joined = self
            .ctx
            .backend()
            .join_group(&code, &user.id)
            .await
            .map_err(|e| {
                error!("Failed to join group: {}", e);
                e
            })?;
        info!(group = %joined.group_id, name = %joined.group_name, "joined group");

        self.refresh_groups().await?;
        Ok(joined)
    }

    async fn refresh_groups(&mut self) -> Result<()> {
        let user = self.ctx.session().require()?;
        match self.ctx.backend().user_groups(&user.id).await {
            Ok(groups) => {
                debug!(count = groups.len(), "loaded groups");
                self.groups = groups;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching groups: {}", e);
                self.reset(LoadState::from_error(&e));
                Err(e)
            }
        }
    }
}

#[async_trait]
impl GroupScreen for MenuScreen {
    fn group_focus(&mut self) -> &mut GroupFocus {
        &mut self.focus
    }

    // The list is the same whichever group is selected; only the highlight moves.
    async fn load(&mut self, _group: GroupId) -> Result<()> {
        self.refresh_groups().await
    }

    fn reset(&mut self, state: LoadState) {
        self.groups.clear();
        self.state = state;
    }
}
