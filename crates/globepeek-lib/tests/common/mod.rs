//! In-process fake of every upstream API, served by axum on 127.0.0.1:0.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use globepeek_lib::{ApiClients, ApiConfig, Session, User};
use serde_json::{json, Value};

pub const PASSWORD: &str = "correct-horse";
pub const ANON_KEY: &str = "test-anon-key";

#[derive(Default)]
struct Tables {
    favorites: Vec<(String, String)>,
    profiles: HashMap<String, Value>,
    newsletter: Vec<String>,
    uploads: Vec<(String, Option<String>, usize)>,
}

#[derive(Clone, Default)]
pub struct Upstream {
    tables: Arc<Mutex<Tables>>,
    requests: Arc<Mutex<Vec<String>>>,
}

pub struct Running {
    pub base: String,
    pub upstream: Upstream,
}

impl Running {
    pub fn config(&self) -> ApiConfig {
        ApiConfig::with_single_upstream(&self.base)
    }

    pub fn clients(&self) -> ApiClients {
        ApiClients::new(&self.config()).expect("clients build")
    }

    pub fn requests(&self) -> Vec<String> {
        self.upstream.requests.lock().unwrap().clone()
    }

    pub fn favorites(&self) -> Vec<(String, String)> {
        self.upstream.tables.lock().unwrap().favorites.clone()
    }

    pub fn uploads(&self) -> Vec<(String, Option<String>, usize)> {
        self.upstream.tables.lock().unwrap().uploads.clone()
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        created_at: None,
    }
}

pub fn session(id: &str) -> Session {
    Session {
        access_token: format!("token-{id}"),
        refresh_token: Some("refresh".to_string()),
        token_type: "bearer".to_string(),
        expires_in: Some(3600),
        user: user(id),
    }
}

fn country(code: &str, name: &str, capital: &str, borders: &[&str], latlng: [f64; 2]) -> Value {
    json!({
        "name": {"common": name, "official": format!("Republic of {name}")},
        "cca3": code,
        "capital": [capital],
        "region": "Europe",
        "population": 1000,
        "languages": {"xx": "Testish"},
        "borders": borders,
        "latlng": latlng,
    })
}

fn countries() -> Vec<Value> {
    vec![
        country("FRA", "France", "Paris", &["ESP", "BEL", "ZZZ"], [46.0, 2.0]),
        country("ESP", "Spain", "Madrid", &["FRA"], [40.0, -4.0]),
        country("BEL", "Belgium", "Brussels", &["FRA"], [50.8, 4.0]),
        country("IND", "India", "New Delhi", &[], [20.0, 77.0]),
        country("IOT", "British Indian Ocean Territory", "Diego Garcia", &[], [-6.0, 71.5]),
    ]
}

fn common_name(record: &Value) -> String {
    record["name"]["common"].as_str().unwrap_or_default().to_lowercase()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"status": 404, "message": "Not Found"})),
    )
        .into_response()
}

fn bearer_user(headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    token.strip_prefix("token-").map(str::to_string)
}

fn eq_filter(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.strip_prefix("eq."))
        .map(str::to_string)
}

async fn record(upstream: &Upstream, what: String) {
    upstream.requests.lock().unwrap().push(what);
}

async fn all() -> Json<Vec<Value>> {
    Json(countries())
}

async fn by_name(State(up): State<Upstream>, Path(name): Path<String>) -> Response {
    record(&up, format!("name:{name}")).await;
    let needle = name.to_lowercase();
    let matches: Vec<_> = countries()
        .into_iter()
        .filter(|c| common_name(c).contains(&needle))
        .collect();
    if matches.is_empty() {
        return not_found();
    }
    Json(matches).into_response()
}

async fn by_region(State(up): State<Upstream>, Path(region): Path<String>) -> Response {
    record(&up, format!("region:{region}")).await;
    let matches: Vec<_> = countries()
        .into_iter()
        .filter(|c| {
            c["region"]
                .as_str()
                .is_some_and(|r| r.eq_ignore_ascii_case(&region))
        })
        .collect();
    if matches.is_empty() {
        return not_found();
    }
    Json(matches).into_response()
}

async fn by_code(Path(code): Path<String>) -> Response {
    match countries()
        .into_iter()
        .find(|c| c["cca3"].as_str() == Some(code.to_uppercase().as_str()))
    {
        Some(found) => Json(vec![found]).into_response(),
        None => not_found(),
    }
}

async fn weather(State(up): State<Upstream>, Query(q): Query<HashMap<String, String>>) -> Response {
    record(&up, format!("weather:{}", q.get("q").cloned().unwrap_or_default())).await;
    if q.get("appid").map(String::as_str) != Some("test-weather-key") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"cod": 401, "message": "Invalid API key"})),
        )
            .into_response();
    }
    if q.get("units").map(String::as_str) != Some("metric") || q.get("q").map(String::as_str) != Some("Paris") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"cod": "404", "message": "city not found"})),
        )
            .into_response();
    }
    Json(json!({
        "weather": [{"description": "few clouds", "icon": "02d"}],
        "main": {"temp": 12.5, "feels_like": 11.0, "humidity": 81},
        "wind": {"speed": 5.1}
    }))
    .into_response()
}

async fn photos(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let query = q.get("query").cloned().unwrap_or_default();
    record(&up, format!("photos:{query}")).await;
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Client-ID test-unsplash-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"errors": ["OAuth error"]}))).into_response();
    }
    let per_page: usize = q.get("per_page").and_then(|p| p.parse().ok()).unwrap_or(10);
    let results: Vec<_> = (0..per_page)
        .map(|i| {
            json!({
                "id": format!("{query}-{i}"),
                "alt_description": "a view",
                "urls": {"regular": format!("https://img.test/{i}/r"), "full": format!("https://img.test/{i}/f")}
            })
        })
        .collect();
    Json(json!({"total": per_page, "results": results})).into_response()
}

async fn youtube(State(up): State<Upstream>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    let query = q.get("q").cloned().unwrap_or_default();
    record(&up, format!("youtube:{query}")).await;
    if query.contains("Nowhere") || q.get("maxResults").map(String::as_str) != Some("1") {
        return Json(json!({"items": []}));
    }
    Json(json!({
        "items": [{
            "id": {"videoId": "vid-1"},
            "snippet": {"title": query, "channelTitle": "Travel", "thumbnails": {"high": {"url": "https://yt.test/h.jpg"}}}
        }]
    }))
}

async fn places(State(up): State<Upstream>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    record(
        &up,
        format!(
            "places:{}:{},{}",
            q.get("categories").cloned().unwrap_or_default(),
            q.get("lat").cloned().unwrap_or_default(),
            q.get("lon").cloned().unwrap_or_default()
        ),
    )
    .await;
    Json(json!({
        "type": "FeatureCollection",
        "features": [
            {"properties": {"name": "Old Town", "formatted": "1 Main St"}},
            {"properties": {"name": null}},
            {"properties": {"name": "Old Town"}},
            {"properties": {"name": "Harbour"}}
        ]
    }))
}

async fn signup(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"id": "new-user", "email": body["email"]}))
}

async fn token(Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>) -> Response {
    if q.get("grant_type").map(String::as_str) != Some("password") || body["password"] != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        )
            .into_response();
    }
    Json(json!({
        "access_token": "token-u1",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "r1",
        "user": {"id": "u1", "email": body["email"]}
    }))
    .into_response()
}

async fn get_user(headers: HeaderMap) -> Response {
    match bearer_user(&headers) {
        Some(id) => Json(json!({"id": id, "email": format!("{id}@example.com")})).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({"msg": "invalid JWT"}))).into_response(),
    }
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn list_favorites(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(ANON_KEY) || bearer_user(&headers).is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let user = eq_filter(&q, "user_id");
    let name = eq_filter(&q, "country_name");
    let tables = up.tables.lock().unwrap();
    let rows: Vec<_> = tables
        .favorites
        .iter()
        .filter(|(u, n)| Some(u) == user.as_ref() && name.as_ref().is_none_or(|want| want == n))
        .map(|(u, n)| json!({"user_id": u, "country_name": n}))
        .collect();
    Json(rows).into_response()
}

async fn insert_favorite(State(up): State<Upstream>, Json(body): Json<Value>) -> StatusCode {
    let user = body["user_id"].as_str().unwrap_or_default().to_string();
    let name = body["country_name"].as_str().unwrap_or_default().to_string();
    up.tables.lock().unwrap().favorites.push((user, name));
    StatusCode::CREATED
}

async fn delete_favorite(State(up): State<Upstream>, Query(q): Query<HashMap<String, String>>) -> StatusCode {
    let user = eq_filter(&q, "user_id");
    let name = eq_filter(&q, "country_name");
    up.tables
        .lock()
        .unwrap()
        .favorites
        .retain(|(u, n)| !(Some(u) == user.as_ref() && Some(n) == name.as_ref()));
    StatusCode::NO_CONTENT
}

async fn get_profiles(State(up): State<Upstream>, Query(q): Query<HashMap<String, String>>) -> Json<Vec<Value>> {
    let id = eq_filter(&q, "id").unwrap_or_default();
    let tables = up.tables.lock().unwrap();
    Json(tables.profiles.get(&id).cloned().into_iter().collect())
}

async fn upsert_profile(State(up): State<Upstream>, Json(body): Json<Value>) -> (StatusCode, Json<Vec<Value>>) {
    let id = body["id"].as_str().unwrap_or_default().to_string();
    up.tables.lock().unwrap().profiles.insert(id, body.clone());
    (StatusCode::CREATED, Json(vec![body]))
}

async fn newsletter(State(up): State<Upstream>, Json(body): Json<Value>) -> Response {
    let email = body[0]["email"].as_str().unwrap_or_default().to_string();
    let mut tables = up.tables.lock().unwrap();
    if tables.newsletter.contains(&email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"code": "23505", "message": "duplicate key value"})),
        )
            .into_response();
    }
    tables.newsletter.push(email);
    StatusCode::CREATED.into_response()
}

async fn upload(
    State(up): State<Upstream>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Json<Value> {
    let upsert = headers
        .get("x-upsert")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    up.tables
        .lock()
        .unwrap()
        .uploads
        .push((path.clone(), upsert, body.len()));
    Json(json!({"Key": format!("avatars/{path}")}))
}

/// Start the fake upstream and return its base URL.
pub async fn spawn_upstream() -> Running {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/v3.1/all", get(all))
        .route("/v3.1/name/{name}", get(by_name))
        .route("/v3.1/alpha/{code}", get(by_code))
        .route("/v3.1/region/{region}", get(by_region))
        .route("/data/2.5/weather", get(weather))
        .route("/search/photos", get(photos))
        .route("/youtube/v3/search", get(youtube))
        .route("/v2/places", get(places))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(get_user).put(get_user))
        .route("/auth/v1/logout", post(logout))
        .route(
            "/rest/v1/favorites",
            get(list_favorites).post(insert_favorite).delete(delete_favorite),
        )
        .route("/rest/v1/profiles", get(get_profiles).post(upsert_profile))
        .route("/rest/v1/newsletter", post(newsletter))
        .route("/storage/v1/object/avatars/{path}", post(upload))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream runs");
    });

    Running {
        base: format!("http://{addr}"),
        upstream,
    }
}
