//! Shared group selection
//!
//! The selected group is persisted under one storage key and mirrored into a
//! `tokio::sync::watch` channel. Writers persist first and then publish, so
//! every subscriber sees the change without polling. Writers outside this
//! process (another client sharing the same storage file) are picked up by an
//! optional [`PollTask`] that re-reads the key on an interval.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, warn};

use crate::{Result, id::GroupId, store::SharedStore};

/// Observable, persisted "which group is active" register
///
/// Cloning is cheap; every clone shares the same channel. Last write wins.
#[derive(Clone)]
pub struct SharedSelection {
    inner: Arc<Inner>,
}

struct Inner {
    key: String,
    store: SharedStore,
    tx: watch::Sender<Option<GroupId>>,
}

impl std::fmt::Debug for SharedSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSelection")
            .field("key", &self.inner.key)
            .field("current", &*self.inner.tx.borrow())
            .finish()
    }
}

impl SharedSelection {
    /// Create a selection over `key`, seeded with whatever is persisted there
    pub async fn load(store: SharedStore, key: impl Into<String>) -> Result<Self> {
        let selection = Self::detached(store, key);
        selection.read().await?;
        Ok(selection)
    }

    /// Create a selection without touching the store; the first
    /// [`read`](Self::read) seeds it
    pub fn detached(store: SharedStore, key: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                key: key.into(),
                store,
                tx,
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// The last value seen or written by this process
    pub fn current(&self) -> Option<GroupId> {
        self.inner.tx.borrow().clone()
    }

    /// Read the persisted value, publishing it if it differs from the current one
    ///
    /// The persisted value is authoritative. An unparseable value is treated as
    /// absent.
    pub async fn read(&self) -> Result<Option<GroupId>> {
        let raw = self.inner.store.get(&self.inner.key).await.map_err(|e| {
            error!(key = %self.inner.key, "failed to read selected group: {}", e);
            e
        })?;

        let value = match raw {
            Some(raw) => match GroupId::parse(&raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(key = %self.inner.key, "ignoring unreadable selected group: {}", e);
                    None
                }
            },
            None => None,
        };

        self.publish(value.clone());
        Ok(value)
    }

    /// Persist `id` as the selected group and notify subscribers
    pub async fn select(&self, id: GroupId) -> Result<()> {
        self.inner
            .store
            .set(&self.inner.key, id.as_str())
            .await
            .map_err(|e| {
                error!(key = %self.inner.key, group = %id, "failed to persist selected group: {}", e);
                e
            })?;
        debug!(key = %self.inner.key, group = %id, "selected group");
        self.publish(Some(id));
        Ok(())
    }

    /// Remove the persisted selection and notify subscribers
    pub async fn clear(&self) -> Result<()> {
        self.inner.store.remove(&self.inner.key).await.map_err(|e| {
            error!(key = %self.inner.key, "failed to clear selected group: {}", e);
            e
        })?;
        debug!(key = %self.inner.key, "cleared selected group");
        self.publish(None);
        Ok(())
    }

    pub fn subscribe(&self) -> SelectionSubscription {
        SelectionSubscription {
            rx: self.inner.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }

    /// Re-read the persisted value every `interval` until the task is dropped
    pub fn spawn_poller(&self, interval: Duration) -> PollTask {
        let selection = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            // The first tick completes immediately; the caller has just read.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                // Failures are already logged by read(); the next tick tries again.
                let _ = selection.read().await;
            }
        });
        debug!(key = %self.inner.key, ?interval, "started selection poller");
        PollTask { handle }
    }

    fn publish(&self, value: Option<GroupId>) {
        self.inner.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}

/// Receiving end of a [`SharedSelection`]
///
/// Dropping the subscription is the whole unsubscribe step.
#[derive(Debug)]
pub struct SelectionSubscription {
    rx: watch::Receiver<Option<GroupId>>,
}

impl SelectionSubscription {
    /// The value as of the last observed change
    pub fn current(&self) -> Option<GroupId> {
        self.rx.borrow().clone()
    }

    /// Mark the current value as seen
    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }

    /// Take an unseen change without waiting
    pub fn take_change(&mut self) -> Option<Option<GroupId>> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Wait for the next change
    ///
    /// Returns `None` once every [`SharedSelection`] handle has been dropped.
    pub async fn changed(&mut self) -> Option<Option<GroupId>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn into_stream(self) -> WatchStream<Option<GroupId>> {
        WatchStream::new(self.rx)
    }
}

/// A running selection poller; aborted when dropped
#[derive(Debug)]
pub struct PollTask {
    handle: JoinHandle<()>,
}

impl PollTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
