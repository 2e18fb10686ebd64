//! Cached, persisted session user
//!
//! There is no token: the session is the user record the backend returned at
//! signin, kept under [`keys::USER`] until logout.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{
    CoreError, Result,
    models::User,
    store::{SharedStore, keys},
};

#[derive(Clone)]
pub struct Session {
    store: SharedStore,
    user: Arc<RwLock<Option<User>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user.read().as_ref().map(|u| u.id.clone()))
            .finish()
    }
}

impl Session {
    /// Load the persisted user, if any
    ///
    /// A missing or unreadable record leaves the session signed out; only the
    /// failure is logged.
    pub async fn restore(store: SharedStore) -> Self {
        let user = match store.get(keys::USER).await {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Failed to parse stored user: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!("Failed to load user: {}", e);
                None
            }
        };

        if let Some(user) = &user {
            debug!(user = %user.id, "restored session");
        }

        Self {
            store,
            user: Arc::new(RwLock::new(user)),
        }
    }

    pub fn current(&self) -> Option<User> {
        self.user.read().clone()
    }

    /// The signed-in user, or [`CoreError::NotSignedIn`]
    pub fn require(&self) -> Result<User> {
        self.current().ok_or(CoreError::NotSignedIn)
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.read().is_some()
    }

    /// Persist `user` as the session after a signin or signup
    pub async fn login(&self, user: User) -> Result<()> {
        self.persist(user).await.map_err(|e| {
            error!("Failed to save user: {}", e);
            e
        })
    }

    /// Replace the session record after a profile change
    pub async fn update_user(&self, user: User) -> Result<()> {
        self.persist(user).await.map_err(|e| {
            error!("Failed to update user: {}", e);
            e
        })
    }

    /// Forget the session user. Clearing the selected group is the caller's job.
    pub async fn logout(&self) -> Result<()> {
        self.store.remove(keys::USER).await.map_err(|e| {
            error!("Failed to logout: {}", e);
            e
        })?;
        *self.user.write() = None;
        Ok(())
    }

    async fn persist(&self, user: User) -> Result<()> {
        let raw = serde_json::to_string(&user).map_err(|e| CoreError::serialization("user", e))?;
        self.store.set(keys::USER, &raw).await?;
        debug!(user = %user.id, "stored session user");
        *self.user.write() = Some(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::test_helpers::{CountingStore, user};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_login_persists_and_restores() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::restore(store.clone()).await;
        assert!(!session.is_signed_in());
        assert!(matches!(session.require(), Err(CoreError::NotSignedIn)));

        session.login(user("u1", "Jane")).await.unwrap();

        let restored = Session::restore(store).await;
        assert_eq!(restored.current(), Some(user("u1", "Jane")));
    }

    #[tokio::test]
    async fn test_logout_clears_record() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::restore(store.clone()).await;
        session.login(user("u1", "Jane")).await.unwrap();

        session.logout().await.unwrap();
        assert_eq!(session.current(), None);
        assert_eq!(store.get(keys::USER).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_record_restores_signed_out() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::USER, "{not json").await.unwrap();

        let session = Session::restore(store).await;
        assert!(!session.is_signed_in());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_user() {
        let store = Arc::new(CountingStore::new());
        let session = Session::restore(store.clone()).await;
        session.login(user("u1", "Jane")).await.unwrap();

        store.fail_writes(true);
        let err = session.update_user(user("u1", "Janet")).await.unwrap_err();
        assert!(matches!(err, CoreError::StorageFailed { .. }));
        assert_eq!(session.current(), Some(user("u1", "Jane")));
    }
}
