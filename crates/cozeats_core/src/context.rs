//! Application-wide state shared by every screen

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    Result,
    backend::Backend,
    config::CozeatsConfig,
    coordinator::GroupFocus,
    models::User,
    screens::{AccountScreen, GroceryScreen, GroupInfoScreen, MealsScreen, MenuScreen},
    selection::SharedSelection,
    session::Session,
    store::{SharedStore, keys},
    theme::{ThemeOption, ThemePreference},
};

#[derive(Clone)]
pub struct AppContext {
    backend: Arc<dyn Backend>,
    session: Session,
    selection: SharedSelection,
    theme: ThemePreference,
    poll_interval: Option<Duration>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("session", &self.session)
            .field("selection", &self.selection)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl AppContext {
    /// Restore session, selection and theme from `store`
    pub async fn init(
        store: SharedStore,
        backend: Arc<dyn Backend>,
        config: &CozeatsConfig,
    ) -> Result<Self> {
        Self::with_options(
            store,
            backend,
            config.sync.poll_interval(),
            config.theme.default,
        )
        .await
    }

    pub async fn with_options(
        store: SharedStore,
        backend: Arc<dyn Backend>,
        poll_interval: Option<Duration>,
        default_theme: ThemeOption,
    ) -> Result<Self> {
        let session = Session::restore(store.clone()).await;
        // An unreadable selection starts out empty; focused screens read again.
        let selection = SharedSelection::detached(store.clone(), keys::SELECTED_GROUP);
        if let Err(e) = selection.read().await {
            warn!("starting without a selected group: {}", e);
        }
        let theme = ThemePreference::load(store, default_theme).await;

        Ok(Self {
            backend,
            session,
            selection,
            theme,
            poll_interval,
        })
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn selection(&self) -> &SharedSelection {
        &self.selection
    }

    pub fn theme(&self) -> &ThemePreference {
        &self.theme
    }

    pub fn group_focus(&self) -> GroupFocus {
        GroupFocus::new(
            self.selection.clone(),
            self.session.clone(),
            self.backend.clone(),
            self.poll_interval,
        )
    }

    pub fn account(&self) -> AccountScreen {
        AccountScreen::new(self.clone())
    }

    pub fn menu(&self) -> MenuScreen {
        MenuScreen::new(self.clone())
    }

    pub fn meals(&self, date: NaiveDate) -> MealsScreen {
        MealsScreen::new(self.clone(), date)
    }

    pub fn groceries(&self) -> GroceryScreen {
        GroceryScreen::new(self.clone())
    }

    pub fn group_info(&self) -> GroupInfoScreen {
        GroupInfoScreen::new(self.clone())
    }

    /// Persist `user` as the session and make sure a group is selected
    ///
    /// A failed group lookup is logged and does not fail the sign-in; the
    /// first focused screen will try again.
    pub async fn sign_in(&self, user: User) -> Result<()> {
        self.session.login(user.clone()).await?;
        info!(user = %user.id, "signed in");

        if self.selection.read().await?.is_some() {
            return Ok(());
        }

        match self.backend.user_groups(&user.id).await {
            Ok(groups) => {
                if let Some(first) = groups.into_iter().next() {
                    self.selection.select(first.group_id).await?;
                }
            }
            Err(e) => warn!(user = %user.id, "could not pick a default group: {}", e),
        }
        Ok(())
    }

    /// Clear the session user and the selected group together
    pub async fn logout(&self) -> Result<()> {
        self.session.logout().await?;
        self.selection.clear().await?;
        info!("logged out");
        Ok(())
    }
}
