mod support;

use axum::extract::{Path, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use support::signed_in_session;
use userdesk::api::{HttpRecordApi, RecordApi};
use userdesk::models::RecordDraft;
use userdesk::sync::{AssumeYes, RecordSynchronizer};
use userdesk::UserdeskError;

const GOOD_TOKEN: &str = "tok-good";

#[derive(Default)]
struct UserTable {
    users: Vec<Value>,
    next_id: u64,
    omit_users: bool,
}

type Shared = Arc<Mutex<UserTable>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
        == Some(&format!("Bearer {}", GOOD_TOKEN)[..])
}

fn id_of(user: &Value) -> String {
    match &user["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn list_users(State(table): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }
    let table = table.lock().unwrap();
    if table.omit_users {
        return Json(json!({})).into_response();
    }
    Json(json!({ "users": table.users })).into_response()
}

async fn create_user(
    State(table): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }
    let mut table = table.lock().unwrap();
    table.next_id += 1;
    let user = json!({
        "id": table.next_id,
        "name": body["name"],
        "email": body["email"],
    });
    table.users.push(user.clone());
    (StatusCode::CREATED, Json(json!({ "user": user }))).into_response()
}

async fn update_user(
    State(table): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }
    let mut table = table.lock().unwrap();
    match table.users.iter_mut().find(|u| id_of(u) == id) {
        Some(user) => {
            user["name"] = body["name"].clone();
            user["email"] = body["email"].clone();
            (StatusCode::OK, "updated").into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such user").into_response(),
    }
}

async fn delete_user(
    State(table): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }
    let mut table = table.lock().unwrap();
    let before = table.users.len();
    table.users.retain(|u| id_of(u) != id);
    if table.users.len() == before {
        return (StatusCode::NOT_FOUND, "no such user").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

struct TestServer {
    base_url: String,
    table: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(users: Vec<Value>) -> Self {
        let table: Shared = Arc::new(Mutex::new(UserTable {
            next_id: users.len() as u64,
            users,
            omit_users: false,
        }));
        let app = Router::new()
            .route("/users", get(list_users).post(create_user))
            .route("/users/{id}", put(update_user).delete(delete_user))
            .with_state(table.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            table,
            handle,
        }
    }

    fn api(&self) -> HttpRecordApi {
        HttpRecordApi::new(&self.base_url).unwrap()
    }

    fn remote_names(&self) -> Vec<String> {
        self.table
            .lock()
            .unwrap()
            .users
            .iter()
            .map(|u| u["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn seed() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Ada", "email": "ada@x.com"}),
        json!({"id": 2, "name": "A", "email": "a@x.com"}),
    ]
}

#[tokio::test]
async fn test_crud_round_trip_through_synchronizer() {
    let server = TestServer::spawn(seed()).await;
    let mut sync = RecordSynchronizer::new(signed_in_session(GOOD_TOKEN), server.api());

    sync.list().await.unwrap();
    let ids: Vec<_> = sync.records().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec!["1", "2"]);

    let created = sync.create("Grace", "grace@x.com").await.unwrap();
    assert_eq!(created.id, "3");
    assert_eq!(sync.records().last().unwrap().name, "Grace");

    sync.update("2", "B", "b@x.com").await.unwrap();
    assert_eq!(sync.records()[1].name, "B");
    assert_eq!(sync.records()[1].email, "b@x.com");

    assert!(sync.delete("1", &AssumeYes).await.unwrap());
    let ids: Vec<_> = sync.records().iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec!["2", "3"]);

    assert_eq!(server.remote_names(), vec!["B", "Grace"]);
}

#[tokio::test]
async fn test_missing_users_field_is_empty_list() {
    let server = TestServer::spawn(seed()).await;
    server.table.lock().unwrap().omit_users = true;

    let records = server.api().list(GOOD_TOKEN).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_rejected_token_is_api_error() {
    let server = TestServer::spawn(seed()).await;

    let err = server.api().list("tok-stale").await.unwrap_err();
    match err {
        UserdeskError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid token");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_delete_keeps_local_record() {
    let server = TestServer::spawn(seed()).await;
    let mut sync = RecordSynchronizer::new(signed_in_session(GOOD_TOKEN), server.api());
    sync.list().await.unwrap();
    server.table.lock().unwrap().users.clear();

    let err = sync.delete("1", &AssumeYes).await.unwrap_err();

    assert!(err.is_network());
    assert_eq!(sync.records().len(), 2);
    assert_eq!(sync.status().unwrap().text, "Error deleting user.");
}

#[tokio::test]
async fn test_ids_are_percent_encoded() {
    let server = TestServer::spawn(vec![json!({"id": "a b/c", "name": "Odd", "email": "o@x.com"})]).await;
    let api = server.api();
    let draft = RecordDraft::new("Even", "e@x.com").unwrap();

    api.update(GOOD_TOKEN, "a b/c", &draft).await.unwrap();

    assert_eq!(server.remote_names(), vec!["Even"]);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let api = HttpRecordApi::new(&base_url).unwrap();
    let err = api.list(GOOD_TOKEN).await.unwrap_err();

    assert!(matches!(err, UserdeskError::Network(_)));
    assert!(err.is_network());
}

#[tokio::test]
async fn test_stale_token_status_asks_for_login() {
    let server = TestServer::spawn(seed()).await;
    let mut sync = RecordSynchronizer::new(signed_in_session("tok-stale"), server.api());

    assert!(sync.list().await.is_err());

    assert!(sync.is_empty());
    assert_eq!(
        sync.status().unwrap().text,
        "Error fetching users. Please log in again."
    );
}
