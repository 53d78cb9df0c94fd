//! In-process fake of the REST API used by the client and action tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub struct TestServer {
    pub url: String,
    pub role_requests: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn role_requests(&self) -> usize {
        self.role_requests.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct AppState {
    role_requests: Arc<AtomicUsize>,
}

pub async fn spawn_server() -> TestServer {
    let role_requests = Arc::new(AtomicUsize::new(0));
    let state = AppState {
        role_requests: Arc::clone(&role_requests),
    };

    let api = Router::new()
        .route("/users/login", post(login))
        .route("/users/logout", post(|| async { Json(json!({"status": "OK"})) }))
        .route("/users/me", get(me))
        .route("/users/me/teams", get(my_teams))
        .route("/users/me/teams/members", get(my_team_members))
        .route("/users/me/teams/:team_id/channels", get(my_channels))
        .route("/users/me/teams/:team_id/channels/members", get(my_channel_members))
        .route("/users/:user_id/posts/flagged", get(flagged_posts))
        .route("/echo_headers", get(echo_headers))
        .route("/system/ping", get(|| async { "pong, but not json" }))
        .route("/files", post(upload))
        .route("/channels/members/me/view", post(|| async { Json(json!({"status": "OK"})) }))
        .route("/channels/:channel_id/posts", get(channel_posts))
        .route("/posts", post(create_post))
        .route("/posts/:post_id/thread", get(post_thread))
        .route("/teams/:team_id/posts/search", post(search_posts))
        .route("/roles/names", post(roles_by_names))
        .route("/jobs", post(create_job))
        .route("/jobs/type/:job_type", get(jobs_by_type))
        .route("/jobs/:job_id/cancel", post(|| async { Json(json!({"status": "OK"})) }))
        .route("/emoji/name/:name", get(emoji_by_name))
        .with_state(state);

    let app = Router::new().nest("/api/v4", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        url: format!("http://{addr}"),
        role_requests,
    }
}

fn error(status: StatusCode, id: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"id": id, "message": message, "status_code": status.as_u16()})),
    )
        .into_response()
}

fn user_me() -> Value {
    json!({"id": "me", "username": "alice", "roles": "system_user"})
}

async fn login() -> impl IntoResponse {
    ([("Token", "tok"), ("X-Version-Id", "1.0")], Json(user_me()))
}

async fn me(headers: HeaderMap) -> Response {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some("BEARER tok") => ([("X-Version-Id", "2.0")], Json(user_me())).into_response(),
        _ => error(
            StatusCode::UNAUTHORIZED,
            "api.context.session_expired.app_error",
            "Invalid or expired session",
        ),
    }
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let mut echoed = serde_json::Map::new();
    for name in ["x-requested-with", "authorization", "user-agent", "accept-language"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            echoed.insert(name.to_string(), Value::String(value.to_string()));
        }
    }
    Json(Value::Object(echoed))
}

async fn my_teams() -> Json<Value> {
    Json(json!([{"id": "t1", "name": "team", "display_name": "Team"}]))
}

async fn my_team_members() -> Json<Value> {
    Json(json!([{"team_id": "t1", "user_id": "me", "msg_count": 2, "mention_count": 1}]))
}

async fn my_channels(Path(team_id): Path<String>) -> Json<Value> {
    Json(json!([
        {"id": "c1", "team_id": team_id, "type": "O", "total_msg_count": 10},
        {"id": "c2", "team_id": team_id, "type": "O", "total_msg_count": 5},
    ]))
}

async fn my_channel_members(Path(_team_id): Path<String>) -> Json<Value> {
    Json(json!([
        {"channel_id": "c1", "user_id": "me", "msg_count": 8, "mention_count": 1},
        {"channel_id": "c2", "user_id": "me", "msg_count": 5, "mention_count": 0},
    ]))
}

fn post_json(id: &str, channel_id: &str, root_id: &str, create_at: i64) -> Value {
    json!({
        "id": id,
        "channel_id": channel_id,
        "user_id": "me",
        "root_id": root_id,
        "create_at": create_at,
        "update_at": create_at,
        "message": format!("message {id}"),
    })
}

fn post_list(posts: &[Value]) -> Json<Value> {
    let order: Vec<&Value> = posts.iter().map(|p| &p["id"]).collect();
    let map: serde_json::Map<String, Value> = posts
        .iter()
        .map(|p| (p["id"].as_str().unwrap_or_default().to_string(), p.clone()))
        .collect();
    Json(json!({"order": order, "posts": map}))
}

async fn channel_posts(Path(channel_id): Path<String>) -> Json<Value> {
    post_list(&[
        post_json("p2", &channel_id, "", 2),
        post_json("p1", &channel_id, "", 1),
    ])
}

async fn post_thread(Path(post_id): Path<String>) -> Json<Value> {
    post_list(&[
        post_json(&post_id, "c1", "", 1),
        post_json("reply", "c1", &post_id, 3),
    ])
}

async fn search_posts(Path(_team_id): Path<String>) -> Json<Value> {
    post_list(&[post_json("s1", "c1", "", 5), post_json("s2", "c2", "", 6)])
}

async fn flagged_posts(Path(_user_id): Path<String>) -> Json<Value> {
    post_list(&[post_json("f1", "c2", "", 7)])
}

async fn create_post(Json(mut post): Json<Value>) -> Response {
    if post["message"] == "fail" {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "api.post.create_post.app_error",
            "Unable to save the post",
        );
    }
    post["id"] = json!("server-id");
    post["create_at"] = json!(100);
    post["update_at"] = json!(100);
    (StatusCode::CREATED, Json(post)).into_response()
}

async fn upload(body: Bytes) -> Json<Value> {
    if String::from_utf8_lossy(&body).contains("slow") {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    Json(json!({
        "file_infos": [{"id": "f1", "user_id": "me", "name": "test.png", "extension": "png",
                        "size": 4, "mime_type": "image/png"}],
        "client_ids": ["cid"],
    }))
}

async fn roles_by_names(State(state): State<AppState>, Json(names): Json<Vec<String>>) -> Json<Value> {
    state.role_requests.fetch_add(1, Ordering::SeqCst);
    let roles: Vec<Value> = names
        .iter()
        .map(|name| json!({"id": format!("id-{name}"), "name": name, "permissions": [format!("perm_{name}")]}))
        .collect();
    Json(Value::Array(roles))
}

async fn create_job(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({"id": "j1", "type": body["type"], "status": "pending", "data": body["data"]})),
    )
}

async fn jobs_by_type(Path(job_type): Path<String>) -> Json<Value> {
    Json(json!([
        {"id": "j1", "type": job_type, "status": "success"},
        {"id": "j2", "type": job_type, "status": "in_progress", "progress": 40},
    ]))
}

async fn emoji_by_name(Path(name): Path<String>) -> Response {
    if name == "missing" {
        return error(StatusCode::NOT_FOUND, "api.emoji.get_by_name.app_error", "Emoji not found");
    }
    Json(json!({"id": format!("e-{name}"), "name": name, "creator_id": "me"})).into_response()
}
