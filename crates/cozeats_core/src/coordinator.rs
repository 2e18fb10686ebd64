//! Per-screen group selection coordination
//!
//! Every screen that shows group data owns a [`GroupFocus`]. On focus it
//! settles which group to show (persisted selection, else the user's first
//! group), then observes the shared selection until blur. The persisted value
//! is authoritative; the focus only holds a local copy of it.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::{
    CoreError, Result,
    backend::Backend,
    id::GroupId,
    selection::{PollTask, SelectionSubscription, SharedSelection},
    session::Session,
};

/// A change in the selected group observed while focused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    /// Another group became the selection
    Switched(GroupId),
    /// The selection was removed, e.g. on logout
    Cleared,
}

/// Resources held only while a screen is focused
struct FocusScope {
    subscription: SelectionSubscription,
    _poller: Option<PollTask>,
}

pub struct GroupFocus {
    selection: SharedSelection,
    session: Session,
    backend: Arc<dyn Backend>,
    poll_interval: Option<Duration>,
    local: Option<GroupId>,
    scope: Option<FocusScope>,
}

impl std::fmt::Debug for GroupFocus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupFocus")
            .field("local", &self.local)
            .field("focused", &self.scope.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl GroupFocus {
    pub fn new(
        selection: SharedSelection,
        session: Session,
        backend: Arc<dyn Backend>,
        poll_interval: Option<Duration>,
    ) -> Self {
        Self {
            selection,
            session,
            backend,
            poll_interval,
            local: None,
            scope: None,
        }
    }

    /// The group this screen currently believes is selected
    pub fn local(&self) -> Option<&GroupId> {
        self.local.as_ref()
    }

    pub fn is_focused(&self) -> bool {
        self.scope.is_some()
    }

    /// Enter focus and settle on a group
    ///
    /// Reads the persisted selection. When nothing is persisted, the signed-in
    /// user's first group (in API order) is adopted and persisted. A user with
    /// no groups gets [`CoreError::NoGroupMemberships`]. Any failure leaves the
    /// screen unfocused; nothing is retried.
    pub async fn focus(&mut self) -> Result<GroupId> {
        // A refocus starts from nothing.
        self.scope = None;

        // Subscribe before reading so a write racing the read is not lost.
        let mut subscription = self.selection.subscribe();

        let id = match self.settle().await {
            Ok(id) => id,
            Err(e) => {
                self.local = None;
                return Err(e);
            }
        };
        subscription.mark_seen();

        let poller = self
            .poll_interval
            .map(|interval| self.selection.spawn_poller(interval));
        self.scope = Some(FocusScope {
            subscription,
            _poller: poller,
        });

        debug!(group = %id, "focused");
        self.local = Some(id.clone());
        Ok(id)
    }

    /// Leave focus, dropping the subscription and stopping any poller
    ///
    /// The local copy is kept but goes stale; the next [`focus`](Self::focus)
    /// re-reads the persisted value.
    pub fn blur(&mut self) {
        if self.scope.take().is_some() {
            debug!(group = ?self.local, "blurred");
        }
    }

    /// Adopt a change that has already arrived, without waiting
    ///
    /// Returns `None` when unfocused or when nothing differs from the local copy.
    pub fn poll_change(&mut self) -> Option<SelectionChange> {
        let scope = self.scope.as_mut()?;
        let value = scope.subscription.take_change()?;
        self.adopt(value)
    }

    /// Wait until the selection differs from the local copy and adopt it
    ///
    /// Returns `None` immediately when unfocused.
    pub async fn next_change(&mut self) -> Option<SelectionChange> {
        loop {
            let scope = self.scope.as_mut()?;
            let value = scope.subscription.changed().await?;
            if let Some(change) = self.adopt(value) {
                return Some(change);
            }
        }
    }

    /// Switch the shared selection to `id`; other focused screens follow
    pub async fn switch_to(&mut self, id: GroupId) -> Result<()> {
        self.selection.select(id.clone()).await?;
        if let Some(scope) = self.scope.as_mut() {
            scope.subscription.mark_seen();
        }
        self.local = Some(id);
        Ok(())
    }

    fn adopt(&mut self, value: Option<GroupId>) -> Option<SelectionChange> {
        if value == self.local {
            return None;
        }
        self.local = value.clone();
        match value {
            Some(id) => {
                debug!(group = %id, "adopted selection change");
                Some(SelectionChange::Switched(id))
            }
            None => {
                debug!("selection cleared");
                Some(SelectionChange::Cleared)
            }
        }
    }

    async fn settle(&self) -> Result<GroupId> {
        match self.selection.read().await? {
            Some(id) => Ok(id),
            None => self.default_group().await,
        }
    }

    async fn default_group(&self) -> Result<GroupId> {
        let user = self.session.require()?;
        let groups = self.backend.user_groups(&user.id).await.map_err(|e| {
            error!(user = %user.id, "Error fetching groups: {}", e);
            e
        })?;

        let Some(first) = groups.into_iter().next() else {
            info!(user = %user.id, "user has no groups");
            return Err(CoreError::NoGroupMemberships {
                user_id: user.id.to_string(),
            });
        };

        self.selection.select(first.group_id.clone()).await?;
        info!(group = %first.group_id, name = %first.name, "defaulted to first group");
        Ok(first.group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::models::Group;
    use crate::store::{KeyValueStore, MemoryStore, keys};
    use crate::test_helpers::{CountingStore, gid, signed_in_session, user};
    use pretty_assertions::assert_eq;

    fn groups(ids: &[&str]) -> Vec<Group> {
        ids.iter()
            .map(|id| Group {
                group_id: gid(id),
                name: format!("Group {id}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_focus_adopts_persisted_selection() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::SELECTED_GROUP, "g2").await.unwrap();
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;

        let mut backend = MockBackend::new();
        backend.expect_user_groups().never();

        let mut focus = GroupFocus::new(selection, session, Arc::new(backend), None);
        assert_eq!(focus.focus().await.unwrap(), gid("g2"));
        assert_eq!(focus.local(), Some(&gid("g2")));
        assert!(focus.is_focused());
    }

    #[tokio::test]
    async fn test_focus_defaults_to_first_group_and_persists_it() {
        let store = Arc::new(MemoryStore::new());
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;

        let mut backend = MockBackend::new();
        backend
            .expect_user_groups()
            .times(1)
            .returning(|_| Ok(groups(&["g7", "g3"])));

        let mut focus = GroupFocus::new(selection.clone(), session, Arc::new(backend), None);
        assert_eq!(focus.focus().await.unwrap(), gid("g7"));
        assert_eq!(
            store.get(keys::SELECTED_GROUP).await.unwrap().as_deref(),
            Some("g7")
        );
        assert_eq!(selection.current(), Some(gid("g7")));
    }

    #[tokio::test]
    async fn test_focus_without_groups_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;

        let mut backend = MockBackend::new();
        backend
            .expect_user_groups()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let mut focus = GroupFocus::new(selection, session, Arc::new(backend), None);
        let err = focus.focus().await.unwrap_err();
        assert!(matches!(err, CoreError::NoGroupMemberships { .. }));
        assert!(!focus.is_focused());
        assert_eq!(store.get(keys::SELECTED_GROUP).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_focus_signed_out_without_selection() {
        let store = Arc::new(MemoryStore::new());
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = Session::restore(store).await;

        let mut backend = MockBackend::new();
        backend.expect_user_groups().never();

        let mut focus = GroupFocus::new(selection, session, Arc::new(backend), None);
        assert!(matches!(
            focus.focus().await,
            Err(CoreError::NotSignedIn)
        ));
    }

    #[tokio::test]
    async fn test_focused_screen_follows_switches() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::SELECTED_GROUP, "g1").await.unwrap();
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;
        let backend: Arc<dyn Backend> = Arc::new(MockBackend::new());

        let mut meals = GroupFocus::new(selection.clone(), session.clone(), backend.clone(), None);
        let mut menu = GroupFocus::new(selection.clone(), session, backend, None);
        meals.focus().await.unwrap();
        menu.focus().await.unwrap();

        menu.switch_to(gid("g2")).await.unwrap();
        assert_eq!(menu.poll_change(), None);
        assert_eq!(
            meals.poll_change(),
            Some(SelectionChange::Switched(gid("g2")))
        );
        assert_eq!(meals.poll_change(), None);

        selection.clear().await.unwrap();
        let change = tokio::time::timeout(Duration::from_secs(1), meals.next_change())
            .await
            .unwrap();
        assert_eq!(change, Some(SelectionChange::Cleared));
        assert_eq!(meals.local(), None);
    }

    #[tokio::test]
    async fn test_blurred_screen_ignores_switches_until_refocus() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::SELECTED_GROUP, "g1").await.unwrap();
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;

        let mut focus = GroupFocus::new(
            selection.clone(),
            session,
            Arc::new(MockBackend::new()),
            None,
        );
        focus.focus().await.unwrap();
        focus.blur();
        assert_eq!(selection.subscriber_count(), 0);

        selection.select(gid("g5")).await.unwrap();
        assert_eq!(focus.poll_change(), None);
        assert_eq!(focus.next_change().await, None);
        assert_eq!(focus.local(), Some(&gid("g1")));

        assert_eq!(focus.focus().await.unwrap(), gid("g5"));
    }

    #[tokio::test]
    async fn test_polling_focus_sees_external_write_within_an_interval() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::SELECTED_GROUP, "g1").await.unwrap();
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;

        let interval = Duration::from_millis(25);
        let mut focus = GroupFocus::new(
            selection,
            session,
            Arc::new(MockBackend::new()),
            Some(interval),
        );
        focus.focus().await.unwrap();

        store.set(keys::SELECTED_GROUP, "g4").await.unwrap();
        let change = tokio::time::timeout(interval * 20, focus.next_change())
            .await
            .expect("change within the poll interval");
        assert_eq!(change, Some(SelectionChange::Switched(gid("g4"))));
    }

    #[tokio::test]
    async fn test_blur_stops_polling_reads() {
        let store = Arc::new(CountingStore::new());
        store.set(keys::SELECTED_GROUP, "g1").await.unwrap();
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;

        let mut focus = GroupFocus::new(
            selection,
            session,
            Arc::new(MockBackend::new()),
            Some(Duration::from_millis(10)),
        );
        focus.focus().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        focus.blur();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let reads_at_blur = store.reads();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.reads(), reads_at_blur);

        focus.focus().await.unwrap();
        assert!(store.reads() > reads_at_blur);
    }

    #[tokio::test]
    async fn test_failed_refocus_releases_subscription_and_poller() {
        let store = Arc::new(CountingStore::new());
        store.set(keys::SELECTED_GROUP, "g1").await.unwrap();
        let selection = SharedSelection::load(store.clone(), keys::SELECTED_GROUP)
            .await
            .unwrap();
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;

        let mut focus = GroupFocus::new(
            selection.clone(),
            session,
            Arc::new(MockBackend::new()),
            Some(Duration::from_millis(10)),
        );
        focus.focus().await.unwrap();
        assert_eq!(selection.subscriber_count(), 1);

        store.fail_reads(true);
        assert!(focus.focus().await.is_err());
        assert!(!focus.is_focused());
        assert_eq!(focus.local(), None);
        assert_eq!(selection.subscriber_count(), 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let reads_after_failure = store.reads();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.reads(), reads_after_failure);
    }

    #[tokio::test]
    async fn test_store_failure_on_focus_is_surfaced() {
        let store = Arc::new(CountingStore::new());
        let selection = SharedSelection::detached(store.clone(), keys::SELECTED_GROUP);
        let session = signed_in_session(store.clone(), user("u1", "Jane")).await;
        store.fail_reads(true);

        let mut backend = MockBackend::new();
        backend.expect_user_groups().never();

        let mut focus = GroupFocus::new(selection, session, Arc::new(backend), None);
        let err = focus.focus().await.unwrap_err();
        assert!(matches!(err, CoreError::StorageFailed { .. }));
        assert!(!focus.is_focused());
    }
}
