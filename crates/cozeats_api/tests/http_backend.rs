use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use cozeats_api::HttpBackend;
use cozeats_core::{
    AppContext, Backend, CoreError, GroceryId, GroupId, MemoryStore, ThemeOption, UserId,
    prelude::GroupScreen,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn serve(router: Router) -> HttpBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    HttpBackend::new(format!("http://{addr}/"), Some(Duration::from_secs(5))).unwrap()
}

fn user_json(id: &str) -> Value {
    json!({
        "id": id,
        "email": "jane@example.com",
        "name": "Jane",
        "createdAt": "2025-12-01T10:00:00Z",
        "updatedAt": "2025-12-01T10:00:00Z"
    })
}

fn grocery_json(id: &str, item: &str, completed: bool) -> Value {
    json!({
        "id": id,
        "item": item,
        "completed": completed,
        "groupId": "g1",
        "completedBy": if completed { json!("Jane") } else { Value::Null },
        "createdAt": "2025-12-01T10:00:00Z",
        "updatedAt": "2025-12-01T10:00:00Z"
    })
}

fn uid(id: &str) -> UserId {
    UserId::parse(id).unwrap()
}

fn gid(id: &str) -> GroupId {
    GroupId::parse(id).unwrap()
}

#[tokio::test]
async fn signin_sends_credentials_and_decodes_user() {
    let seen = Arc::new(Mutex::new(None));
    let router = Router::new().route(
        "/users/signin",
        post({
            let seen = seen.clone();
            move |Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(user_json("u1"))
                }
            }
        }),
    );
    let backend = serve(router).await;

    let user = backend.signin("jane@example.com", "secret1").await.unwrap();
    assert_eq!(user.id, uid("u1"));
    assert_eq!(user.display_name(), "Jane");
    assert_eq!(
        seen.lock().unwrap().clone().unwrap(),
        json!({"email": "jane@example.com", "password": "secret1"})
    );
}

#[tokio::test]
async fn server_detail_is_surfaced_verbatim() {
    let router = Router::new().route(
        "/users/signin",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Incorrect email or password"})),
            )
        }),
    );
    let backend = serve(router).await;

    let err = backend.signin("jane@example.com", "nope123").await.unwrap_err();
    match err {
        CoreError::Remote { status, detail } => {
            assert_eq!(status, Some(401));
            assert_eq!(detail, "Incorrect email or password");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_uses_fallback_message() {
    let router = Router::new().route(
        "/groceries",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream timed out") }),
    );
    let backend = serve(router).await;

    let err = backend.groceries(&gid("g1")).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch groceries");
}

#[tokio::test]
async fn meals_query_carries_group_and_day() {
    let seen = Arc::new(Mutex::new(HashMap::new()));
    let router = Router::new().route(
        "/meals",
        get({
            let seen = seen.clone();
            move |Query(query): Query<HashMap<String, String>>| {
                let seen = seen.clone();
                async move {
                    *seen.lock().unwrap() = query;
                    Json(json!([{
                        "id": "m1",
                        "name": "Pancakes",
                        "mealType": "breakfast",
                        "date": "2025-12-18",
                        "creatorName": "Jane",
                        "createdAt": "2025-12-01T10:00:00Z"
                    }]))
                }
            }
        }),
    );
    let backend = serve(router).await;

    let day = NaiveDate::from_ymd_opt(2025, 12, 18).unwrap();
    let meals = backend.meals(&gid("g1"), Some(day)).await.unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].date, day);

    let query = seen.lock().unwrap().clone();
    assert_eq!(query.get("groupId").map(String::as_str), Some("g1"));
    assert_eq!(query.get("date").map(String::as_str), Some("2025-12-18"));
}

#[tokio::test]
async fn join_group_posts_code_and_user() {
    let seen = Arc::new(Mutex::new(None));
    let router = Router::new().route(
        "/groups/invites/join",
        post({
            let seen = seen.clone();
            move |Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({
                        "message": "Successfully joined group",
                        "groupId": "g9",
                        "groupName": "The Foodie Family"
                    }))
                }
            }
        }),
    );
    let backend = serve(router).await;

    let joined = backend.join_group("ABC123", &uid("u1")).await.unwrap();
    assert_eq!(joined.group_id, gid("g9"));
    assert_eq!(
        seen.lock().unwrap().clone().unwrap(),
        json!({"code": "ABC123", "userId": "u1"})
    );
}

#[tokio::test]
async fn delete_all_groceries_reports_count() {
    let router = Router::new().route(
        "/groceries/group/:id",
        delete(|Path(id): Path<String>| async move {
            assert_eq!(id, "g1");
            Json(json!({"message": "Deleted 3 grocery items", "deletedCount": 3}))
        }),
    );
    let backend = serve(router).await;

    let report = backend.delete_all_groceries(&gid("g1")).await.unwrap();
    assert_eq!(report.deleted_count, 3);
}

#[tokio::test]
async fn unreachable_server_uses_fallback_message() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend =
        HttpBackend::new(format!("http://{addr}"), Some(Duration::from_secs(2))).unwrap();
    let err = backend.user_groups(&uid("u1")).await.unwrap_err();
    assert!(matches!(err, CoreError::Remote { status: None, .. }));
    assert_eq!(err.to_string(), "Failed to fetch user groups");
}

#[tokio::test]
async fn failed_completion_reverts_grocery_screen() {
    let router = Router::new()
        .route(
            "/users/:id/groups",
            get(|| async { Json(json!([{"groupId": "g1", "name": "Home"}])) }),
        )
        .route(
            "/groceries",
            get(|| async {
                Json(json!([
                    grocery_json("i1", "Tomatoes", false),
                    grocery_json("i2", "Olive Oil", true)
                ]))
            }),
        )
        .route(
            "/groceries/:id",
            put(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "Database unavailable"})),
                )
            }),
        );
    let backend = serve(router).await;

    let store = Arc::new(MemoryStore::new());
    let ctx = AppContext::with_options(store, Arc::new(backend), None, ThemeOption::System)
        .await
        .unwrap();
    ctx.sign_in(serde_json::from_value(user_json("u1")).unwrap())
        .await
        .unwrap();
    assert_eq!(ctx.selection().current(), Some(gid("g1")));

    let mut screen = ctx.groceries();
    screen.on_focus().await.unwrap();
    assert_eq!(screen.remaining_count(), 1);

    let tomatoes = GroceryId::parse("i1").unwrap();
    let err = screen.mark_complete(&tomatoes).await.unwrap_err();
    assert_eq!(err.to_string(), "Database unavailable");
    assert!(!screen.items()[0].completed);
    assert_eq!(screen.state().error(), Some("Database unavailable"));
}
