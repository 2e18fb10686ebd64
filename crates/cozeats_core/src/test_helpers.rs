//! Shared fixtures for unit tests, also available to other crates' tests
//! through the `test-utils` feature

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::{
    CoreError, Result,
    backend::{Backend, MealUpdate, NewMeal},
    context::AppContext,
    id::{GroceryId, GroupId, InviteId, MealId, UserId},
    models::{
        CreatedGroup, Deleted, DeletedAll, Grocery, Group, GroupDetail, GroupMember, Invite,
        JoinedGroup, Meal, MealType, MemberRole, User,
    },
    session::Session,
    store::{KeyValueStore, MemoryStore, SharedStore, keys},
    theme::ThemeOption,
};

pub fn gid(id: &str) -> GroupId {
    GroupId::parse(id).unwrap()
}

fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 1, 10, 0, 0).unwrap()
}

pub fn user(id: &str, name: &str) -> User {
    User {
        id: UserId::parse(id).unwrap(),
        email: format!("{id}@example.com"),
        name: Some(name.to_string()),
        created_at: created(),
        updated_at: created(),
    }
}

pub async fn signed_in_session(store: SharedStore, user: User) -> Session {
    let session = Session::restore(store).await;
    session.login(user).await.unwrap();
    session
}

/// Memory store that counts reads and can be told to fail
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool, operation: &'static str, key: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(CoreError::storage(
                operation,
                key,
                std::io::Error::other("injected failure"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_reads, "read", key)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check(&self.fail_writes, "write", key)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check(&self.fail_writes, "remove", key)?;
        self.inner.remove(key).await
    }
}

#[derive(Default)]
struct FakeState {
    user: Option<User>,
    memberships: Vec<Group>,
    group_names: HashMap<GroupId, String>,
    meals: Vec<(GroupId, Meal)>,
    groceries: Vec<Grocery>,
    invites: HashMap<String, GroupId>,
    passwords: HashMap<UserId, String>,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, String>,
    delays: HashMap<&'static str, Duration>,
    next_id: u64,
}

impl FakeState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn user(&self) -> Result<User> {
        self.user
            .clone()
            .ok_or_else(|| CoreError::remote(Some(404), "User not found"))
    }
}

/// In-memory backend with per-operation failure injection
///
/// Clones share state, so a test can keep a handle while the context owns
/// another.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    /// A backend whose only user (`Jane`) belongs to `groups`, in order
    pub fn with_groups(user_id: &str, groups: &[&str]) -> Self {
        let backend = Self::default();
        {
            let mut state = backend.state.lock();
            let jane = user(user_id, "Jane");
            state.passwords.insert(jane.id.clone(), "password".to_string());
            state.user = Some(jane);
            for id in groups {
                let name = format!("Group {id}");
                state.group_names.insert(gid(id), name.clone());
                state.memberships.push(Group {
                    group_id: gid(id),
                    name,
                });
            }
        }
        backend
    }

    pub fn current_user(&self) -> User {
        self.state.lock().user.clone().unwrap()
    }

    pub fn add_meal(&self, group: &str, name: &str, meal_type: MealType, date: NaiveDate) -> MealId {
        let mut state = self.state.lock();
        let id = MealId::parse(&state.next("m")).unwrap();
        state.meals.push((
            gid(group),
            Meal {
                id: id.clone(),
                name: name.to_string(),
                meal_type,
                date,
                creator_name: Some("Jane".to_string()),
                created_at: created(),
            },
        ));
        id
    }

    pub fn add_grocery(&self, group: &str, item: &str) -> GroceryId {
        let mut state = self.state.lock();
        let id = GroceryId::parse(&state.next("i")).unwrap();
        state.groceries.push(Grocery {
            id: id.clone(),
            item: item.to_string(),
            completed: false,
            group_id: gid(group),
            completed_by: None,
            created_at: created(),
            updated_at: created(),
        });
        id
    }

    pub fn complete(&self, grocery: &GroceryId) {
        let mut state = self.state.lock();
        if let Some(item) = state.groceries.iter_mut().find(|g| &g.id == grocery) {
            item.completed = true;
            item.completed_by = Some("Mike".to_string());
        }
    }

    /// Register a group the user is not yet a member of, joinable with `code`
    pub fn add_invite(&self, code: &str, group: &str, name: &str) {
        let mut state = self.state.lock();
        state.group_names.insert(gid(group), name.to_string());
        state.invites.insert(code.to_string(), gid(group));
    }

    pub fn calls(&self, op: &str) -> usize {
        self.state.lock().calls.get(op).copied().unwrap_or(0)
    }

    pub fn fail(&self, op: &'static str, detail: &str) {
        self.state.lock().failures.insert(op, detail.to_string());
    }

    pub fn succeed(&self, op: &'static str) {
        self.state.lock().failures.remove(op);
    }

    /// Make every later `op` call take at least `delay`
    pub fn delay(&self, op: &'static str, delay: Duration) {
        self.state.lock().delays.insert(op, delay);
    }

    async fn pause(&self, op: &'static str) {
        let delay = self.state.lock().delays.get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn enter(&self, op: &'static str) -> Result<parking_lot::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock();
        *state.calls.entry(op).or_default() += 1;
        if let Some(detail) = state.failures.get(op) {
            return Err(CoreError::remote(Some(500), detail.clone()));
        }
        Ok(state)
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let mut state = self.enter("signup")?;
        let id = UserId::parse(&state.next("u")).unwrap();
        let user = User {
            id: id.clone(),
            email: email.to_string(),
            name: Some(name.to_string()),
            created_at: created(),
            updated_at: created(),
        };
        state.passwords.insert(id, password.to_string());
        state.user = Some(user.clone());
        state.memberships.clear();
        Ok(user)
    }

    async fn signin(&self, email: &str, password: &str) -> Result<User> {
        let state = self.enter("signin")?;
        let user = state.user()?;
        if user.email != email || state.passwords.get(&user.id).map(String::as_str) != Some(password)
        {
            return Err(CoreError::remote(Some(401), "Invalid email or password"));
        }
        Ok(user)
    }

    async fn update_user_name(&self, _user_id: &UserId, name: &str) -> Result<User> {
        let mut state = self.enter("update_user_name")?;
        let mut user = state.user()?;
        user.name = Some(name.to_string());
        state.user = Some(user.clone());
        Ok(user)
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        original_password: &str,
        new_password: &str,
    ) -> Result<User> {
        let mut state = self.enter("change_password")?;
        if state.passwords.get(user_id).map(String::as_str) != Some(original_password) {
            return Err(CoreError::remote(Some(400), "Original password is incorrect"));
        }
        state
            .passwords
            .insert(user_id.clone(), new_password.to_string());
        state.user()
    }

    async fn user_groups(&self, _user_id: &UserId) -> Result<Vec<Group>> {
        let state = self.enter("user_groups")?;
        Ok(state.memberships.clone())
    }

    async fn create_group(&self, _user_id: &UserId, group_name: &str) -> Result<CreatedGroup> {
        let mut state = self.enter("create_group")?;
        let id = gid(&state.next("g"));
        state.group_names.insert(id.clone(), group_name.to_string());
        state.memberships.push(Group {
            group_id: id.clone(),
            name: group_name.to_string(),
        });
        Ok(CreatedGroup {
            id,
            name: group_name.to_string(),
            created_at: created(),
            updated_at: created(),
        })
    }

    async fn group_detail(&self, group_id: &GroupId) -> Result<GroupDetail> {
        let state = self.enter("group_detail")?;
        let Some(group_name) = state.group_names.get(group_id).cloned() else {
            return Err(CoreError::remote(Some(404), "Group not found"));
        };
        let user = state.user()?;
        let members = vec![
            GroupMember {
                user_name: user.name.clone(),
                user_email: user.email.clone(),
                role: MemberRole::Admin,
            },
            GroupMember {
                user_name: Some("Mike".to_string()),
                user_email: "mike@example.com".to_string(),
                role: MemberRole::Member,
            },
        ];
        Ok(GroupDetail {
            group_id: group_id.clone(),
            group_name,
            members,
            meal_count: state.meals.iter().filter(|(g, _)| g == group_id).count() as u64,
            grocery_count: state
                .groceries
                .iter()
                .filter(|i| &i.group_id == group_id)
                .count() as u64,
        })
    }

    async fn create_invite(&self, group_id: &GroupId, created_by: &UserId) -> Result<Invite> {
        let mut state = self.enter("create_invite")?;
        state.next_id += 1;
        let code = format!("INV{:03}", state.next_id);
        state.invites.insert(code.clone(), group_id.clone());
        Ok(Invite {
            id: InviteId::parse(&format!("inv{}", state.next_id)).unwrap(),
            code,
            group_id: group_id.clone(),
            created_by_id: created_by.clone(),
            expires_at: created() + chrono::Duration::days(7),
            used_by: None,
            created_at: created(),
        })
    }

    async fn join_group(&self, code: &str, _user_id: &UserId) -> Result<JoinedGroup> {
        let mut state = self.enter("join_group")?;
        let Some(group_id) = state.invites.remove(code) else {
            return Err(CoreError::remote(Some(400), "Invalid or expired invite code"));
        };
        let group_name = state
            .group_names
            .get(&group_id)
            .cloned()
            .unwrap_or_default();
        state.memberships.push(Group {
            group_id: group_id.clone(),
            name: group_name.clone(),
        });
        Ok(JoinedGroup {
            message: "Successfully joined group".to_string(),
            group_id,
            group_name,
        })
    }

    async fn meals(&self, group_id: &GroupId, date: Option<NaiveDate>) -> Result<Vec<Meal>> {
        self.pause("meals").await;
        let state = self.enter("meals")?;
        Ok(state
            .meals
            .iter()
            .filter(|(g, m)| g == group_id && date.is_none_or(|d| m.date == d))
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn create_meal(&self, meal: &NewMeal) -> Result<Meal> {
        let mut state = self.enter("create_meal")?;
        let created_meal = Meal {
            id: MealId::parse(&state.next("m")).unwrap(),
            name: meal.name.clone(),
            meal_type: meal.meal_type,
            date: meal.date,
            creator_name: state.user.as_ref().and_then(|u| u.name.clone()),
            created_at: created(),
        };
        state
            .meals
            .push((meal.group_id.clone(), created_meal.clone()));
        Ok(created_meal)
    }

    async fn update_meal(&self, meal_id: &MealId, update: &MealUpdate) -> Result<Meal> {
        let mut state = self.enter("update_meal")?;
        let Some((_, meal)) = state.meals.iter_mut().find(|(_, m)| &m.id == meal_id) else {
            return Err(CoreError::remote(Some(404), "Meal not found"));
        };
        if let Some(name) = &update.name {
            meal.name = name.clone();
        }
        if let Some(meal_type) = update.meal_type {
            meal.meal_type = meal_type;
        }
        if let Some(date) = update.date {
            meal.date = date;
        }
        Ok(meal.clone())
    }

    async fn delete_meal(&self, meal_id: &MealId) -> Result<Deleted> {
        let mut state = self.enter("delete_meal")?;
        state.meals.retain(|(_, m)| &m.id != meal_id);
        Ok(Deleted {
            message: "Meal deleted successfully".to_string(),
        })
    }

    async fn groceries(&self, group_id: &GroupId) -> Result<Vec<Grocery>> {
        self.pause("groceries").await;
        let state = self.enter("groceries")?;
        Ok(state
            .groceries
            .iter()
            .filter(|i| &i.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn create_grocery(&self, group_id: &GroupId, item: &str) -> Result<Grocery> {
        let mut state = self.enter("create_grocery")?;
        let grocery = Grocery {
            id: GroceryId::parse(&state.next("i")).unwrap(),
            item: item.to_string(),
            completed: false,
            group_id: group_id.clone(),
            completed_by: None,
            created_at: created(),
            updated_at: created(),
        };
        state.groceries.push(grocery.clone());
        Ok(grocery)
    }

    async fn complete_grocery(&self, grocery_id: &GroceryId, _user_id: &UserId) -> Result<Grocery> {
        let mut state = self.enter("complete_grocery")?;
        let name = state.user.as_ref().and_then(|u| u.name.clone());
        let Some(item) = state.groceries.iter_mut().find(|i| &i.id == grocery_id) else {
            return Err(CoreError::remote(Some(404), "Grocery item not found"));
        };
        item.completed = true;
        item.completed_by = name;
        Ok(item.clone())
    }

    async fn delete_grocery(&self, grocery_id: &GroceryId) -> Result<Deleted> {
        let mut state = self.enter("delete_grocery")?;
        state.groceries.retain(|i| &i.id != grocery_id);
        Ok(Deleted {
            message: "Grocery item deleted successfully".to_string(),
        })
    }

    async fn delete_all_groceries(&self, group_id: &GroupId) -> Result<DeletedAll> {
        let mut state = self.enter("delete_all_groceries")?;
        let before = state.groceries.len();
        state.groceries.retain(|i| &i.group_id != group_id);
        let deleted_count = (before - state.groceries.len()) as u64;
        Ok(DeletedAll {
            message: format!("Deleted {deleted_count} grocery items"),
            deleted_count,
        })
    }
}

/// A context signed in as the backend's user, with `selected` persisted
pub async fn fake_context(
    backend: FakeBackend,
    selected: Option<&str>,
) -> (AppContext, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    if let Some(group) = selected {
        store.set(keys::SELECTED_GROUP, group).await.unwrap();
    }
    let user = backend.current_user();
    let ctx = AppContext::with_options(store.clone(), Arc::new(backend), None, ThemeOption::System)
        .await
        .unwrap();
    ctx.session().login(user).await.unwrap();
    (ctx, store)
}
