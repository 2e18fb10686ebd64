//! Request bodies and query strings sent to the backend
//!
//! Meal bodies reuse [`cozeats_core::NewMeal`] and [`cozeats_core::MealUpdate`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `POST /users`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// `POST /users/signin`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// `PUT /users/{id}/name`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UpdateNameRequest {
    pub name: String,
}

/// `PUT /users/{id}/password`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub original_password: String,
    pub new_password: String,
}

/// `POST /groups/`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub user_id: String,
    pub group_name: String,
}

/// `POST /groups/{id}/invite`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub group_id: String,
    pub created_by_id: String,
}

/// `POST /groups/invites/join`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    pub code: String,
    pub user_id: String,
}

/// `POST /groceries`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroceryRequest {
    pub item: String,
    pub group_id: String,
}

/// `PUT /groceries/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteGroceryRequest {
    pub user_id: String,
}

/// Query for `GET /meals`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MealsQuery {
    pub group_id: String,
    /// Calendar day as `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Query for `GET /groceries`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroceriesQuery {
    pub group_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bodies_use_backend_field_names() {
        let body = ChangePasswordRequest {
            original_password: "old-secret".to_string(),
            new_password: "new-secret".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"originalPassword": "old-secret", "newPassword": "new-secret"})
        );

        let invite = CreateInviteRequest {
            group_id: "g1".to_string(),
            created_by_id: "u1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&invite).unwrap(),
            serde_json::json!({"groupId": "g1", "createdById": "u1"})
        );
    }

    #[test]
    fn test_schema_lists_required_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(JoinGroupRequest)).unwrap();
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("code")));
        assert!(required.contains(&serde_json::json!("userId")));
    }
}
