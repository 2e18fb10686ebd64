//! CozEats Core - session, group selection and screen models
//!
//! This crate holds everything the CozEats client does that does not depend
//! on a particular UI: the persisted session, the shared selected group that
//! keeps every screen pointed at the same household, and the headless screen
//! models for meals, groceries, groups and the account.

pub mod backend;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod id;
pub mod models;
pub mod screens;
pub mod selection;
pub mod session;
pub mod store;
pub mod theme;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers;

pub use backend::{Backend, MealUpdate, NewMeal};
pub use config::CozeatsConfig;
pub use context::AppContext;
pub use coordinator::{GroupFocus, SelectionChange};
pub use error::{ConfigError, CoreError, Result};
pub use id::{GroceryId, GroupId, Id, IdType, InviteId, MealId, UserId};
pub use models::{
    CreatedGroup, Deleted, DeletedAll, Grocery, Group, GroupDetail, GroupMember, Invite,
    JoinedGroup, Meal, MealType, MemberRole, User,
};
pub use selection::SharedSelection;
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore, SharedStore};
pub use theme::{Theme, ThemeOption, ThemePreference};
pub use validation::ValidationError;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::screens::{
        AccountScreen, GroceryScreen, GroupInfoScreen, GroupScreen, LoadState, MealsScreen,
        MenuScreen,
    };
    pub use crate::{
        AppContext, Backend, CoreError, CozeatsConfig, GroupId, KeyValueStore, MealType, Result,
        SelectionChange, SharedSelection, Theme, ThemeOption, User,
    };
}
