use async_trait::async_trait;
use tracing::{debug, error, info};

use super::{GroupScreen, LoadState};
use crate::{
    CoreError, Result,
    context::AppContext,
    coordinator::GroupFocus,
    id::GroupId,
    models::{GroupDetail, Invite, MemberRole},
};

/// Members and counts of the selected group, plus invite creation
pub struct GroupInfoScreen {
    ctx: AppContext,
    focus: GroupFocus,
    detail: Option<GroupDetail>,
    invite: Option<Invite>,
    state: LoadState,
}

impl GroupInfoScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            focus: ctx.group_focus(),
            ctx,
            detail: None,
            invite: None,
            state: LoadState::Idle,
        }
    }

    pub fn detail(&self) -> Option<&GroupDetail> {
        self.detail.as_ref()
    }

    /// The most recent invite created from this screen for the shown group
    pub fn invite(&self) -> Option<&Invite> {
        self.invite.as_ref()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn group(&self) -> Option<&GroupId> {
        self.focus.local()
    }

    /// Whether the signed-in user is an admin of the shown group
    pub fn is_admin(&self) -> bool {
        let (Some(detail), Some(user)) = (&self.detail, self.ctx.session().current()) else {
            return false;
        };
        detail.role_of(&user.email) == Some(MemberRole::Admin)
    }

    /// Generate an invite code for the shown group
    pub async fn create_invite(&mut self) -> Result<Invite> {
        let user = self.ctx.session().require()?;
        let group = self.focus.local().cloned().ok_or(CoreError::NoGroupSelected)?;

        let invite = self
            .ctx
            .backend()
            .create_invite(&group, &user.id)
            .await
            .map_err(|e| {
                error!(group = %group, "Failed to create invite code: {}", e);
                e
            })?;

        info!(group = %group, expires = %invite.expires_at, "created invite code");
        self.invite = Some(invite.clone());
        Ok(invite)
    }
}

#[async_trait]
impl GroupScreen for GroupInfoScreen {
    fn group_focus(&mut self) -> &mut GroupFocus {
        &mut self.focus
    }

    async fn load(&mut self, group: GroupId) -> Result<()> {
        if self.detail.as_ref().is_some_and(|d| d.group_id != group) {
            self.invite = None;
        }
        match self.ctx.backend().group_detail(&group).await {
            Ok(detail) => {
                debug!(group = %group, members = detail.members.len(), "loaded group detail");
                self.detail = Some(detail);
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                error!(group = %group, "Failed to fetch group details: {}", e);
                self.reset(LoadState::from_error(&e));
                Err(e)
            }
        }
    }

    fn reset(&mut self, state: LoadState) {
        self.detail = None;
        self.invite = None;
        self.state = state;
    }
}
