//! Signup, login and profile management
//!
//! Form errors are kept on the screen as an inline message as well as being
//! returned, so a UI can render them beneath the form.

use tracing::{error, info};

use crate::{
    CoreError, Result,
    context::AppContext,
    models::User,
    theme::ThemeOption,
    validation::{validate_login, validate_password_change, validate_rename, validate_signup},
};

pub struct AccountScreen {
    ctx: AppContext,
    error: Option<String>,
}

impl AccountScreen {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx, error: None }
    }

    pub fn user(&self) -> Option<User> {
        self.ctx.session().current()
    }

    /// Inline message from the last failed action
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> Result<User> {
        let outcome = self.try_signup(name, email, password).await;
        self.record(outcome)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let outcome = self.try_login(email, password).await;
        self.record(outcome)
    }

    pub async fn rename(&mut self, name: &str) -> Result<User> {
        let outcome = self.try_rename(name).await;
        self.record(outcome)
    }

    pub async fn change_password(
        &mut self,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<User> {
        let outcome = self.try_change_password(current, new, confirm).await;
        self.record(outcome)
    }

    pub async fn set_theme(&mut self, option: ThemeOption) -> Result<()> {
        let outcome = self.ctx.theme().set(option).await;
        self.record(outcome)
    }

    /// Clear the session and the selected group
    pub async fn logout(&mut self) -> Result<()> {
        let outcome = self.ctx.logout().await;
        self.record(outcome)
    }

    async fn try_signup(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let (name, email) = validate_signup(name, email, password)?;
        let user = self
            .ctx
            .backend()
            .signup(&name, &email, password)
            .await
            .map_err(|e| {
                error!("Failed to create account: {}", e);
                e
            })?;
        info!(user = %user.id, "account created");
        self.ctx.sign_in(user.clone()).await?;
        Ok(user)
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<User> {
        let email = validate_login(email, password)?;
        let user = self
            .ctx
            .backend()
            .signin(&email, password)
            .await
            .map_err(|e| {
                error!("Failed to sign in: {}", e);
                e
            })?;
        self.ctx.sign_in(user.clone()).await?;
        Ok(user)
    }

    async fn try_rename(&self, name: &str) -> Result<User> {
        let user = self.ctx.session().require()?;
        let name = validate_rename(name, user.name.as_deref())?;
        let updated = self
            .ctx
            .backend()
            .update_user_name(&user.id, &name)
            .await
            .map_err(|e| {
                error!(user = %user.id, "Failed to update user name: {}", e);
                e
            })?;
        self.ctx.session().update_user(updated.clone()).await?;
        info!(user = %updated.id, "profile updated");
        Ok(updated)
    }

    async fn try_change_password(&self, current: &str, new: &str, confirm: &str) -> Result<User> {
        validate_password_change(current, new, confirm)?;
        let user = self.ctx.session().require()?;
        let updated = self
            .ctx
            .backend()
            .change_password(&user.id, current, new)
            .await
            .map_err(|e| {
                error!(user = %user.id, "Failed to change password: {}", e);
                e
            })?;
        self.ctx.session().update_user(updated.clone()).await?;
        info!(user = %updated.id, "password changed");
        Ok(updated)
    }

    fn record<T>(&mut self, outcome: Result<T>) -> Result<T> {
        match &outcome {
            Ok(_) => self.error = None,
            Err(e) => self.error = Some(e.user_message()),
        }
        outcome
    }
}

impl std::fmt::Debug for AccountScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountScreen")
            .field("user", &self.user().map(|u| u.id))
            .field("error", &self.error)
            .finish()
    }
}

/// True when `err` came from form validation rather than the server or storage
pub fn is_form_error(err: &CoreError) -> bool {
    matches!(err, CoreError::Validation(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, keys};
    use crate::test_helpers::{FakeBackend, fake_context, gid};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_login_defaults_selection_and_persists_user() {
        let backend = FakeBackend::with_groups("u1", &["g3", "g1"]);
        let (ctx, store) = fake_context(backend.clone(), None).await;
        ctx.logout().await.unwrap();

        let mut account = ctx.account();
        let user = account.login(" u1@example.com ", "password").await.unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(account.error(), None);
        assert_eq!(ctx.selection().current(), Some(gid("g3")));
        assert!(store.get(keys::USER).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_validation_errors_are_inline_and_skip_network() {
        let backend = FakeBackend::with_groups("u1", &["g1"]);
        let (ctx, _store) = fake_context(backend.clone(), Some("g1")).await;
        let mut account = ctx.account();

        let err = account.signup("Jane", "not-an-email", "secret1").await.unwrap_err();
        assert!(is_form_error(&err));
        assert_eq!(account.error(), Some("Please enter a valid email address"));

        account
            .change_password("password", "short", "short")
            .await
            .unwrap_err();
        assert_eq!(
            account.error(),
            Some("New password must be at least 6 characters")
        );

        account.rename("Jane").await.unwrap_err();
        assert_eq!(account.error(), Some("No changes made"));

        assert_eq!(backend.calls("signup"), 0);
        assert_eq!(backend.calls("change_password"), 0);
        assert_eq!(backend.calls("update_user_name"), 0);
    }

    #[tokio::test]
    async fn test_rename_updates_persisted_session() {
        let backend = FakeBackend::with_groups("u1", &["g1"]);
        let (ctx, store) = fake_context(backend.clone(), Some("g1")).await;
        let mut account = ctx.account();

        let updated = account.rename("  Janet ").await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Janet"));
        assert_eq!(ctx.session().current().unwrap().name.as_deref(), Some("Janet"));

        let raw = store.get(keys::USER).await.unwrap().unwrap();
        assert!(raw.contains("Janet"));
    }

    #[tokio::test]
    async fn test_server_rejection_is_shown_verbatim() {
        let backend = FakeBackend::with_groups("u1", &["g1"]);
        let (ctx, _store) = fake_context(backend.clone(), Some("g1")).await;
        let mut account = ctx.account();

        account
            .change_password("wrong-password", "newpass1", "newpass1")
            .await
            .unwrap_err();
        assert_eq!(account.error(), Some("Original password is incorrect"));

        account
            .change_password("password", "newpass1", "newpass1")
            .await
            .unwrap();
        assert_eq!(account.error(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_selection() {
        let backend = FakeBackend::with_groups("u1", &["g1"]);
        let (ctx, store) = fake_context(backend.clone(), Some("g1")).await;
        let mut account = ctx.account();

        account.logout().await.unwrap();
        assert_eq!(account.user(), None);
        assert_eq!(ctx.selection().current(), None);
        assert!(store.is_empty());
    }
}
