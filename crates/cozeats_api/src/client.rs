//! [`Backend`] over HTTP

use async_trait::async_trait;
use chrono::NaiveDate;
use cozeats_core::{
    Backend, CreatedGroup, Deleted, DeletedAll, GroceryId, Grocery, Group, GroupDetail, GroupId,
    Invite, JoinedGroup, Meal, MealId, MealUpdate, NewMeal, User, UserId,
    models::calendar_date,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::requests::{
    ChangePasswordRequest, CompleteGroceryRequest, CreateGroceryRequest, CreateGroupRequest,
    CreateInviteRequest, CreateUserRequest, GroceriesQuery, JoinGroupRequest, MealsQuery,
    SigninRequest, UpdateNameRequest,
};

/// Client for the CozEats REST backend
///
/// Requests are plain JSON with no authentication header; the backend trusts
/// the user identifiers sent in bodies and paths.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a client for `base_url`; `None` leaves requests without a timeout
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("cozeats/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::ClientBuild)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send `request`, mapping any failure to an error carrying `fallback`
    /// unless the server supplied its own message
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &'static str,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|cause| {
            warn!("{}: {}", fallback, cause);
            ApiError::Transport { fallback, cause }
        })?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "response");

        if !status.is_success() {
            // An unreadable error body still yields the fallback message.
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_body(status.as_u16(), &body, fallback);
            warn!(status = status.as_u16(), "{}: {}", fallback, err);
            return Err(err);
        }

        response.json::<T>().await.map_err(|cause| {
            warn!("{}: unexpected response body: {}", fallback, cause);
            ApiError::Decode { fallback, cause }
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn signup(&self, name: &str, email: &str, password: &str) -> cozeats_core::Result<User> {
        let body = CreateUserRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        let request = self.request(Method::POST, "/users").json(&body);
        Ok(self.send(request, "Failed to create account").await?)
    }

    async fn signin(&self, email: &str, password: &str) -> cozeats_core::Result<User> {
        let body = SigninRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.request(Method::POST, "/users/signin").json(&body);
        Ok(self.send(request, "Invalid email or password").await?)
    }

    async fn update_user_name(&self, user_id: &UserId, name: &str) -> cozeats_core::Result<User> {
        let body = UpdateNameRequest {
            name: name.to_string(),
        };
        let request = self
            .request(Method::PUT, &format!("/users/{user_id}/name"))
            .json(&body);
        Ok(self.send(request, "Failed to update user name").await?)
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        original_password: &str,
        new_password: &str,
    ) -> cozeats_core::Result<User> {
        let body = ChangePasswordRequest {
            original_password: original_password.to_string(),
            new_password: new_password.to_string(),
        };
        let request = self
            .request(Method::PUT, &format!("/users/{user_id}/password"))
            .json(&body);
        Ok(self.send(request, "Failed to change password").await?)
    }

    async fn user_groups(&self, user_id: &UserId) -> cozeats_core::Result<Vec<Group>> {
        let request = self.request(Method::GET, &format!("/users/{user_id}/groups"));
        Ok(self.send(request, "Failed to fetch user groups").await?)
    }

    async fn create_group(
        &self,
        user_id: &UserId,
        group_name: &str,
    ) -> cozeats_core::Result<CreatedGroup> {
        let body = CreateGroupRequest {
            user_id: user_id.to_string(),
            group_name: group_name.to_string(),
        };
        let request = self.request(Method::POST, "/groups/").json(&body);
        Ok(self.send(request, "Failed to create group").await?)
    }

    async fn group_detail(&self, group_id: &GroupId) -> cozeats_core::Result<GroupDetail> {
        let request = self.request(Method::GET, &format!("/groups/{group_id}"));
        Ok(self.send(request, "Failed to fetch group details").await?)
    }

    async fn create_invite(
        &self,
        group_id: &GroupId,
        created_by: &UserId,
    ) -> cozeats_core::Result<Invite> {
        let body = CreateInviteRequest {
            group_id: group_id.to_string(),
            created_by_id: created_by.to_string(),
        };
        let request = self
            .request(Method::POST, &format!("/groups/{group_id}/invite"))
            .json(&body);
        Ok(self.send(request, "Failed to create invite code").await?)
    }

    async fn join_group(&self, code: &str, user_id: &UserId) -> cozeats_core::Result<JoinedGroup> {
        let body = JoinGroupRequest {
            code: code.to_string(),
            user_id: user_id.to_string(),
        };
        let request = self
            .request(Method::POST, "/groups/invites/join")
            .json(&body);
        Ok(self.send(request, "Failed to join group").await?)
    }

    async fn meals(
        &self,
        group_id: &GroupId,
        date: Option<NaiveDate>,
    ) -> cozeats_core::Result<Vec<Meal>> {
        let query = MealsQuery {
            group_id: group_id.to_string(),
            date: date.map(|d| d.format(calendar_date::FORMAT).to_string()),
        };
        let request = self.request(Method::GET, "/meals").query(&query);
        Ok(self.send(request, "Failed to fetch meals").await?)
    }

    async fn create_meal(&self, meal: &NewMeal) -> cozeats_core::Result<Meal> {
        let request = self.request(Method::POST, "/meals").json(meal);
        Ok(self.send(request, "Failed to create meal").await?)
    }

    async fn update_meal(&self, meal_id: &MealId, update: &MealUpdate) -> cozeats_core::Result<Meal> {
        let request = self
            .request(Method::PUT, &format!("/meals/{meal_id}"))
            .json(update);
        Ok(self.send(request, "Failed to update meal").await?)
    }

    async fn delete_meal(&self, meal_id: &MealId) -> cozeats_core::Result<Deleted> {
        let request = self.request(Method::DELETE, &format!("/meals/{meal_id}"));
        Ok(self.send(request, "Failed to delete meal").await?)
    }

    async fn groceries(&self, group_id: &GroupId) -> cozeats_core::Result<Vec<Grocery>> {
        let query = GroceriesQuery {
            group_id: group_id.to_string(),
        };
        let request = self.request(Method::GET, "/groceries").query(&query);
        Ok(self.send(request, "Failed to fetch groceries").await?)
    }

    async fn create_grocery(&self, group_id: &GroupId, item: &str) -> cozeats_core::Result<Grocery> {
        let body = CreateGroceryRequest {
            item: item.to_string(),
            group_id: group_id.to_string(),
        };
        let request = self.request(Method::POST, "/groceries").json(&body);
        Ok(self.send(request, "Failed to create grocery item").await?)
    }

    async fn complete_grocery(
        &self,
        grocery_id: &GroceryId,
        user_id: &UserId,
    ) -> cozeats_core::Result<Grocery> {
        let body = CompleteGroceryRequest {
            user_id: user_id.to_string(),
        };
        let request = self
            .request(Method::PUT, &format!("/groceries/{grocery_id}"))
            .json(&body);
        Ok(self.send(request, "Failed to update grocery item").await?)
    }

    async fn delete_grocery(&self, grocery_id: &GroceryId) -> cozeats_core::Result<Deleted> {
        let request = self.request(Method::DELETE, &format!("/groceries/{grocery_id}"));
        Ok(self.send(request, "Failed to delete grocery item").await?)
    }

    async fn delete_all_groceries(&self, group_id: &GroupId) -> cozeats_core::Result<DeletedAll> {
        let request = self.request(Method::DELETE, &format!("/groceries/group/{group_id}"));
        Ok(self.send(request, "Failed to delete all groceries").await?)
    }
}
