//! The remote CozEats backend as seen by the screen models
//!
//! `cozeats-api` provides the HTTP implementation. Every method maps to a
//! single endpoint; none of them retry.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    id::{GroceryId, GroupId, MealId, UserId},
    models::{
        CreatedGroup, Deleted, DeletedAll, Grocery, Group, GroupDetail, Invite, JoinedGroup, Meal,
        MealType, User,
    },
};

/// A meal to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeal {
    pub name: String,
    pub meal_type: MealType,
    #[serde(with = "crate::models::calendar_date")]
    pub date: NaiveDate,
    pub created_by: UserId,
    pub group_id: GroupId,
}

/// Partial meal update; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_date"
    )]
    pub date: Option<NaiveDate>,
}

impl MealUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.meal_type.is_none() && self.date.is_none()
    }
}

mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::models::calendar_date;

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => calendar_date::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|raw| {
            calendar_date::parse(&raw)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
        })
        .transpose()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /users`
    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User>;

    /// `POST /users/signin`
    async fn signin(&self, email: &str, password: &str) -> Result<User>;

    /// `PUT /users/{id}/name`
    async fn update_user_name(&self, user_id: &UserId, name: &str) -> Result<User>;

    /// `PUT /users/{id}/password`
    async fn change_password(
        &self,
        user_id: &UserId,
        original_password: &str,
        new_password: &str,
    ) -> Result<User>;

    /// `GET /users/{id}/groups`, in the order the server returns them
    async fn user_groups(&self, user_id: &UserId) -> Result<Vec<Group>>;

    /// `POST /groups`, with the creator as admin
    async fn create_group(&self, user_id: &UserId, group_name: &str) -> Result<CreatedGroup>;

    /// `GET /groups/{id}`
    async fn group_detail(&self, group_id: &GroupId) -> Result<GroupDetail>;

    /// `POST /groups/{id}/invite`
    async fn create_invite(&self, group_id: &GroupId, created_by: &UserId) -> Result<Invite>;

    /// `POST /groups/invites/join`
    async fn join_group(&self, code: &str, user_id: &UserId) -> Result<JoinedGroup>;

    /// `GET /meals?groupId=..&date=YYYY-MM-DD`
    async fn meals(&self, group_id: &GroupId, date: Option<NaiveDate>) -> Result<Vec<Meal>>;

    /// `POST /meals`
    async fn create_meal(&self, meal: &NewMeal) -> Result<Meal>;

    /// `PUT /meals/{id}`
    async fn update_meal(&self, meal_id: &MealId, update: &MealUpdate) -> Result<Meal>;

    /// `DELETE /meals/{id}`
    async fn delete_meal(&self, meal_id: &MealId) -> Result<Deleted>;

    /// `GET /groceries?groupId=..`
    async fn groceries(&self, group_id: &GroupId) -> Result<Vec<Grocery>>;

    /// `POST /groceries`
    async fn create_grocery(&self, group_id: &GroupId, item: &str) -> Result<Grocery>;

    /// `PUT /groceries/{id}`: marks the item complete on behalf of `user_id`
    async fn complete_grocery(&self, grocery_id: &GroceryId, user_id: &UserId)
    -> Result<Grocery>;

    /// `DELETE /groceries/{id}`
    async fn delete_grocery(&self, grocery_id: &GroceryId) -> Result<Deleted>;

    /// `DELETE /groceries/group/{id}`
    async fn delete_all_groceries(&self, group_id: &GroupId) -> Result<DeletedAll>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_meal_update_skips_unset_fields() {
        let update = MealUpdate {
            name: Some("Tacos".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 12, 19),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Tacos", "date": "2025-12-19"})
        );
        assert!(MealUpdate::default().is_empty());
    }

    #[test]
    fn test_new_meal_wire_shape() {
        let meal = NewMeal {
            name: "Soup".to_string(),
            meal_type: MealType::Dinner,
            date: NaiveDate::from_ymd_opt(2025, 12, 18).unwrap(),
            created_by: UserId::parse("u1").unwrap(),
            group_id: GroupId::parse("g1").unwrap(),
        };
        assert_eq!(
            serde_json::to_value(&meal).unwrap(),
            serde_json::json!({
                "name": "Soup",
                "mealType": "dinner",
                "date": "2025-12-18",
                "createdBy": "u1",
                "groupId": "g1"
            })
        );
    }
}
