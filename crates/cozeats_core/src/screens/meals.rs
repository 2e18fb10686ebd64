use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, error};

use super::{GroupScreen, LoadState};
use crate::{
    CoreError, Result,
    backend::{MealUpdate, NewMeal},
    context::AppContext,
    coordinator::GroupFocus,
    id::{GroupId, MealId},
    models::{Meal, MealType},
    validation::require_text,
};

/// Meal calendar for the selected group, one day at a time
pub struct MealsScreen {
    ctx: AppContext,
    focus: GroupFocus,
    date: NaiveDate,
    meals: Vec<Meal>,
    state: LoadState,
}

impl MealsScreen {
    pub fn new(ctx: AppContext, date: NaiveDate) -> Self {
        Self {
            focus: ctx.group_focus(),
            ctx,
            date,
            meals: Vec::new(),
            state: LoadState::Idle,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn group(&self) -> Option<&GroupId> {
        self.focus.local()
    }

    /// Meals for the day, grouped breakfast, lunch, dinner
    pub fn by_type(&self) -> BTreeMap<MealType, Vec<&Meal>> {
        let mut grouped: BTreeMap<MealType, Vec<&Meal>> = BTreeMap::new();
        for meal in &self.meals {
            grouped.entry(meal.meal_type).or_default().push(meal);
        }
        grouped
    }

    /// Pick another calendar day, refetching if a group is settled
    pub async fn set_date(&mut self, date: NaiveDate) -> Result<()> {
        if date == self.date {
            return Ok(());
        }
        self.date = date;
        match self.focus.local().cloned() {
            Some(group) => self.load(group).await,
            None => Ok(()),
        }
    }

    pub async fn add_meal(
        &mut self,
        name: &str,
        meal_type: MealType,
        date: NaiveDate,
    ) -> Result<Meal> {
        let name = require_text("Meal name", name)?;
        let user = self.ctx.session().require()?;
        let group = self.focus.local().cloned().ok_or(CoreError::NoGroupSelected)?;

        let meal = NewMeal {
            name,
            meal_type,
            date,
            created_by: user.id,
            group_id: group.clone(),
        };
        let created = self.ctx.backend().create_meal(&meal).await.map_err(|e| {
            error!("Failed to create meal: {}", e);
            e
        })?;
        debug!(meal = %created.id, "created meal");

        self.load(group).await?;
        Ok(created)
    }

    pub async fn update_meal(&mut self, meal_id: &MealId, mut update: MealUpdate) -> Result<Meal> {
        if let Some(name) = update.name.as_deref() {
            update.name = Some(require_text("Meal name", name)?);
        }
        let group = self.focus.local().cloned().ok_or(CoreError::NoGroupSelected)?;

        let updated = self
            .ctx
            .backend()
            .update_meal(meal_id, &update)
            .await
            .map_err(|e| {
                error!(meal = %meal_id, "Failed to update meal: {}", e);
                e
            })?;

        self.load(group).await?;
        Ok(updated)
    }

    /// Delete a meal, hiding it immediately
    ///
    /// On failure the server-confirmed list is fetched again; if that fails
    /// too, the list from before the delete is restored.
    pub async fn delete_meal(&mut self, meal_id: &MealId) -> Result<()> {
        let group = self.focus.local().cloned().ok_or(CoreError::NoGroupSelected)?;
        let snapshot = self.meals.clone();
        self.meals.retain(|m| &m.id != meal_id);

        match self.ctx.backend().delete_meal(meal_id).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!(meal = %meal_id, "Failed to delete meal: {}", e);
                if self.load(group).await.is_err() {
                    self.meals = snapshot;
                }
                self.state = LoadState::from_error(&e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl GroupScreen for MealsScreen {
    fn group_focus(&mut self) -> &mut GroupFocus {
        &mut self.focus
    }

    async fn load(&mut self, group: GroupId) -> Result<()> {
        match self.ctx.backend().meals(&group, Some(self.date)).await {
            Ok(meals) => {
                debug!(group = %group, date = %self.date, count = meals.len(), "loaded meals");
                self.meals = meals;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                error!(group = %group, "Failed to fetch meals: {}", e);
                self.reset(LoadState::from_error(&e));
                Err(e)
            }
        }
    }

    fn reset(&mut self, state: LoadState) {
        self.meals.clear();
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FakeBackend, fake_context, gid};
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    #[tokio::test]
    async fn test_focus_loads_meals_for_selected_day() {
        let backend = FakeBackend::with_groups("u1", &["g1"]);
        backend.add_meal("g1", "Pancakes", MealType::Breakfast, day(18));
        backend.add_meal("g1", "Soup", MealType::Dinner, day(18));
        backend.add_meal("g1", "Tacos", MealType::Dinner, day(19));
        let (ctx, _store) = fake_context(backend.clone(), Some("g1")).await;

        let mut screen = ctx.meals(day(18));
        screen.on_focus().await.unwrap();

        assert!(screen.state().is_ready());
        assert_eq!(screen.meals().len(), 2);
        let grouped = screen.by_type();
        assert_eq!(grouped[&MealType::Breakfast][0].name, "Pancakes");
        assert_eq!(grouped[&MealType::Dinner][0].name, "Soup");
        assert!(!grouped.contains_key(&MealType::Lunch));

        screen.set_date(day(19)).await.unwrap();
        assert_eq!(screen.meals()[0].name, "Tacos");
    }

    #[tokio::test]
    async fn test_group_switch_refetches_wholesale() {
        let backend = FakeBackend::with_groups("u1", &["g1", "g2"]);
        backend.add_meal("g1", "Pancakes", MealType::Breakfast, day(18));
        backend.add_meal("g2", "Ramen", MealType::Lunch, day(18));
        let (ctx, _store) = fake_context(backend.clone(), Some("g1")).await;

        let mut screen = ctx.meals(day(18));
        screen.on_focus().await.unwrap();
        assert_eq!(screen.meals()[0].name, "Pancakes");

        ctx.selection().select(gid("g2")).await.unwrap();
        assert!(screen.sync().await.unwrap());
        assert_eq!(screen.group(), Some(&gid("g2")));
        assert_eq!(screen.meals().len(), 1);
        assert_eq!(screen.meals()[0].name, "Ramen");
        assert!(!screen.sync().await.unwrap());
    }

    #[tokio::test]
    async fn test_add_meal_validates_before_network() {
        let backend = FakeBackend::with_groups("u1", &["g1"]);
        let (ctx, _store) = fake_context(backend.clone(), Some("g1")).await;
        let mut screen = ctx.meals(day(18));
        screen.on_focus().await.unwrap();

        let err = screen
            .add_meal("   ", MealType::Lunch, day(18))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(backend.calls("create_meal"), 0);

        let created = screen
            .add_meal(" Salad ", MealType::Lunch, day(18))
            .await
            .unwrap();
        assert_eq!(created.name, "Salad");
        assert_eq!(screen.meals().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_list() {
        let backend = FakeBackend::with_groups("u1", &["g1"]);
        backend.add_meal("g1", "Pancakes", MealType::Breakfast, day(18));
        let (ctx, _store) = fake_context(backend.clone(), Some("g1")).await;
        let mut screen = ctx.meals(day(18));
        screen.on_focus().await.unwrap();

        backend.fail("meals", "Failed to fetch meals");
        assert!(screen.set_date(day(19)).await.is_err());
        assert!(screen.meals().is_empty());
        assert_eq!(screen.state().error(), Some("Failed to fetch meals"));
    }

    #[tokio::test]
    async fn test_failed_delete_restores_server_list() {
        let backend = FakeBackend::with_groups("u1", &["g1"]);
        let pancakes = backend.add_meal("g1", "Pancakes", MealType::Breakfast, day(18));
        let (ctx, _store) = fake_context(backend.clone(), Some("g1")).await;
        let mut screen = ctx.meals(day(18));
        screen.on_focus().await.unwrap();

        backend.fail("delete_meal", "Failed to delete meal");
        assert!(screen.delete_meal(&pancakes).await.is_err());
        assert_eq!(screen.meals().len(), 1);
        assert_eq!(screen.state().error(), Some("Failed to delete meal"));

        backend.succeed("delete_meal");
        screen.delete_meal(&pancakes).await.unwrap();
        assert!(screen.meals().is_empty());
    }
}
