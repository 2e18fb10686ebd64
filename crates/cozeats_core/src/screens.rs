//! Headless screen models
//!
//! Each screen owns its fetched list and replaces it wholesale whenever its
//! group changes. The focus, blur and change-following lifecycle is shared
//! through [`GroupScreen`].

pub mod account;
pub mod groceries;
pub mod group_info;
pub mod meals;
pub mod menu;

use async_trait::async_trait;

use crate::{
    CoreError, Result,
    coordinator::{GroupFocus, SelectionChange},
    id::GroupId,
};

pub use account::AccountScreen;
pub use groceries::GroceryScreen;
pub use group_info::GroupInfoScreen;
pub use meals::MealsScreen;
pub use menu::MenuScreen;

/// What a screen is currently showing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Never focused
    #[default]
    Idle,
    /// Showing data fetched for the local group
    Ready,
    /// Showing an error message in place of (or above) the data
    Error(String),
}

impl LoadState {
    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }

    pub(crate) fn from_error(err: &CoreError) -> Self {
        LoadState::Error(err.user_message())
    }
}

/// A screen whose data belongs to the selected group
#[async_trait]
pub trait GroupScreen: Send {
    fn group_focus(&mut self) -> &mut GroupFocus;

    /// Fetch this screen's data for `group`, replacing what is shown
    async fn load(&mut self, group: GroupId) -> Result<()>;

    /// Drop all shown data and show `state` instead
    fn reset(&mut self, state: LoadState);

    /// Screen gained focus: settle the group and fetch
    async fn on_focus(&mut self) -> Result<()> {
        match self.group_focus().focus().await {
            Ok(group) => self.load(group).await,
            Err(e) => {
                self.reset(LoadState::from_error(&e));
                Err(e)
            }
        }
    }

    /// Screen lost focus: stop following the selection
    fn on_blur(&mut self) {
        self.group_focus().blur();
    }

    /// Apply a selection change that already arrived. Returns whether one did.
    async fn sync(&mut self) -> Result<bool> {
        match self.group_focus().poll_change() {
            Some(change) => self.apply_change(change).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// Wait for the next selection change without applying it
    ///
    /// Cancel safe: a change is only taken when this returns, so dropping the
    /// future leaves it pending. Pass the result to
    /// [`apply_change`](Self::apply_change). Returns `None` when the screen is
    /// not focused.
    async fn next_change(&mut self) -> Option<SelectionChange> {
        self.group_focus().next_change().await
    }

    /// Wait for the next selection change and apply it
    ///
    /// Not cancel safe: the change is adopted before the refetch, so dropping
    /// this mid-fetch leaves the screen on the new group with the old data.
    /// Racing several screens in `select!` should use
    /// [`next_change`](Self::next_change) instead.
    ///
    /// Returns `None` when the screen is not focused.
    async fn wait_for_change(&mut self) -> Option<Result<()>> {
        let change = self.next_change().await?;
        Some(self.apply_change(change).await)
    }

    /// User-initiated retry
    async fn refresh(&mut self) -> Result<()> {
        match self.group_focus().local().cloned() {
            Some(group) if self.group_focus().is_focused() => self.load(group).await,
            _ => self.on_focus().await,
        }
    }

    async fn apply_change(&mut self, change: SelectionChange) -> Result<()> {
        match change {
            SelectionChange::Switched(group) => self.load(group).await,
            SelectionChange::Cleared => {
                self.reset(LoadState::from_error(&CoreError::NoGroupSelected));
                Ok(())
            }
        }
    }
}
