//! Test utilities for handler and CLI testing.
//!
//! [`FakeUpstream`] serves every upstream API the library talks to from one
//! in-process axum server on `127.0.0.1:0`, with the path layout expected by
//! [`ApiConfig::with_single_upstream`]. Supabase rows live in memory so tests
//! can inspect what was written.
//!
//! Fixture data: France (borders Spain, Belgium and an unknown `ZZZ`),
//! Spain, Belgium, India and British Indian Ocean Territory. Weather is only
//! known for Paris. Any password other than [`PASSWORD`] is rejected, and a
//! bearer token `token-{id}` authenticates user `{id}`. The token
//! [`OUTAGE_TOKEN`] makes the user lookup answer 503.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use globepeek_lib::ApiConfig;

use crate::state::AppState;

/// The only password the fake auth endpoint accepts.
pub const PASSWORD: &str = "correct-horse";

/// Anon key sent by clients built from [`FakeUpstream::config`].
pub const ANON_KEY: &str = "test-anon-key";

type Params = Query<HashMap<String, String>>;

#[derive(Default)]
struct Store {
    requests: Vec<String>,
    favorites: Vec<(String, String)>,
    profiles: HashMap<String, Value>,
    newsletter: Vec<String>,
    avatars: Vec<(String, usize)>,
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<Store>>);

impl Shared {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.0.lock().expect("fake upstream store poisoned")
    }

    fn log(&self, entry: String) {
        self.store().requests.push(entry);
    }
}

/// A running fake upstream. The server lives until the test runtime stops.
pub struct FakeUpstream {
    base: String,
    shared: Shared,
}

impl FakeUpstream {
    /// Bind to an ephemeral port and start serving.
    pub async fn spawn() -> Self {
        let shared = Shared::default();
        let app = router(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("fake upstream address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake upstream serves");
        });
        Self {
            base: format!("http://{addr}"),
            shared,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Configuration pointing every client at this server with test keys.
    pub fn config(&self) -> ApiConfig {
        ApiConfig::with_single_upstream(&self.base)
    }

    /// Service state wired to this server.
    pub fn state(&self) -> AppState {
        AppState::from_config(self.config()).expect("test state")
    }

    /// `GLOBEPEEK_*` variables equivalent to [`FakeUpstream::config`], for
    /// running the CLI binary against this server.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        let config = self.config();
        let mut vars = vec![
            ("GLOBEPEEK_REST_COUNTRIES_URL", config.rest_countries_url),
            ("GLOBEPEEK_OPENWEATHER_URL", config.openweather_url),
            ("GLOBEPEEK_UNSPLASH_URL", config.unsplash_url),
            ("GLOBEPEEK_YOUTUBE_URL", config.youtube_url),
            ("GLOBEPEEK_GEOAPIFY_URL", config.geoapify_url),
        ];
        let keys = [
            ("GLOBEPEEK_OPENWEATHER_API_KEY", config.openweather_key),
            ("GLOBEPEEK_UNSPLASH_ACCESS_KEY", config.unsplash_key),
            ("GLOBEPEEK_YOUTUBE_API_KEY", config.youtube_key),
            ("GLOBEPEEK_GEOAPIFY_API_KEY", config.geoapify_key),
            ("GLOBEPEEK_SUPABASE_URL", config.supabase_url),
            ("GLOBEPEEK_SUPABASE_ANON_KEY", config.supabase_anon_key),
        ];
        vars.extend(keys.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))));
        vars
    }

    /// Requests seen so far, as `kind:detail` strings.
    pub fn requests(&self) -> Vec<String> {
        self.shared.store().requests.clone()
    }

    /// Stored favorites rows as `(user_id, country_name)`.
    pub fn favorites(&self) -> Vec<(String, String)> {
        self.shared.store().favorites.clone()
    }

    pub fn seed_favorite(&self, user_id: &str, country_name: &str) {
        self.shared
            .store()
            .favorites
            .push((user_id.to_string(), country_name.to_string()));
    }

    pub fn newsletter(&self) -> Vec<String> {
        self.shared.store().newsletter.clone()
    }

    /// Uploaded avatars as `(object_path, byte_len)`.
    pub fn avatars(&self) -> Vec<(String, usize)> {
        self.shared.store().avatars.clone()
    }
}

/// `Authorization` header value that authenticates `user_id`.
pub fn bearer(user_id: &str) -> String {
    format!("Bearer token-{user_id}")
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> String {
    format!("test-{}", crate::RequestId::generate())
}

fn router(shared: Shared) -> Router {
    Router::new()
        .route("/v3.1/all", get(all_countries))
        .route("/v3.1/name/{name}", get(countries_by_name))
        .route("/v3.1/alpha/{code}", get(country_by_code))
        .route("/data/2.5/weather", get(weather))
        .route("/search/photos", get(photos))
        .route("/youtube/v3/search", get(videos))
        .route("/v2/places", get(places))
        .route("/auth/v1/signup", post(sign_up))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/user", get(current_user).put(current_user))
        .route("/auth/v1/logout", post(logout))
        .route(
            "/rest/v1/favorites",
            get(select_favorites).post(insert_favorite).delete(delete_favorites),
        )
        .route("/rest/v1/profiles", get(select_profile).post(upsert_profile))
        .route("/rest/v1/newsletter", post(subscribe))
        .route("/storage/v1/object/avatars/{path}", post(store_avatar))
        .with_state(shared)
}

fn record(code: &str, name: &str, capital: &str, borders: &[&str], latlng: [f64; 2]) -> Value {
    json!({
        "name": {"common": name, "official": format!("Republic of {name}")},
        "cca3": code,
        "capital": [capital],
        "region": if code == "IND" || code == "IOT" { "Asia" } else { "Europe" },
        "population": 1_000_000,
        "languages": if code == "ESP" { json!({"spa": "Spanish"}) } else { json!({"eng": "English"}) },
        "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
        "flags": {"png": format!("https://flags.test/{code}.png"), "svg": format!("https://flags.test/{code}.svg")},
        "borders": borders,
        "latlng": latlng,
    })
}

fn fixture_countries() -> Vec<Value> {
    vec![
        record("FRA", "France", "Paris", &["ESP", "BEL", "ZZZ"], [46.0, 2.0]),
        record("ESP", "Spain", "Madrid", &["FRA"], [40.0, -4.0]),
        record("BEL", "Belgium", "Brussels", &["FRA"], [50.8, 4.0]),
        record("IND", "India", "New Delhi", &[], [20.0, 77.0]),
        record("IOT", "British Indian Ocean Territory", "Diego Garcia", &[], [-6.0, 71.5]),
    ]
}

fn problem(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Bearer token for which the fake auth server fails with 503.
pub const OUTAGE_TOKEN: &str = "token-outage";

fn user_json(id: &str) -> Value {
    json!({"id": id, "email": format!("{id}@example.com")})
}

fn token_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer token-")
        .map(str::to_string)
}

fn has_anon_key(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY)
}

fn eq_param(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key)?.strip_prefix("eq.").map(str::to_string)
}

async fn all_countries(State(shared): State<Shared>) -> Json<Vec<Value>> {
    shared.log("all".to_string());
    Json(fixture_countries())
}

async fn countries_by_name(State(shared): State<Shared>, Path(name): Path<String>) -> Response {
    shared.log(format!("name:{name}"));
    let needle = name.to_lowercase();
    let found: Vec<Value> = fixture_countries()
        .into_iter()
        .filter(|c| {
            c["name"]["common"]
                .as_str()
                .is_some_and(|n| n.to_lowercase().contains(&needle))
        })
        .collect();
    if found.is_empty() {
        return problem(StatusCode::NOT_FOUND, json!({"status": 404, "message": "Not Found"}));
    }
    Json(found).into_response()
}

async fn country_by_code(State(shared): State<Shared>, Path(code): Path<String>) -> Response {
    shared.log(format!("alpha:{code}"));
    let code = code.to_uppercase();
    match fixture_countries()
        .into_iter()
        .find(|c| c["cca3"].as_str() == Some(code.as_str()))
    {
        Some(found) => Json(vec![found]).into_response(),
        None => problem(StatusCode::NOT_FOUND, json!({"status": 404, "message": "Not Found"})),
    }
}

async fn weather(State(shared): State<Shared>, Query(q): Params) -> Response {
    let city = q.get("q").cloned().unwrap_or_default();
    shared.log(format!("weather:{city}"));
    if q.get("appid").map(String::as_str) != Some("test-weather-key") {
        return problem(StatusCode::UNAUTHORIZED, json!({"cod": 401, "message": "Invalid API key"}));
    }
    if city != "Paris" {
        return problem(StatusCode::NOT_FOUND, json!({"cod": "404", "message": "city not found"}));
    }
    Json(json!({
        "weather": [{"description": "few clouds", "icon": "02d"}],
        "main": {"temp": 12.5, "feels_like": 11.0, "humidity": 81},
        "wind": {"speed": 5.1}
    }))
    .into_response()
}

async fn photos(State(shared): State<Shared>, headers: HeaderMap, Query(q): Params) -> Response {
    let query = q.get("query").cloned().unwrap_or_default();
    shared.log(format!("photos:{query}"));
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Client-ID test-unsplash-key") {
        return problem(StatusCode::UNAUTHORIZED, json!({"errors": ["OAuth error: The access token is invalid"]}));
    }
    let count: usize = q.get("per_page").and_then(|n| n.parse().ok()).unwrap_or(10);
    let results: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": format!("{query}-{i}"),
                "alt_description": format!("{query} view {i}"),
                "urls": {"regular": format!("https://img.test/{i}/r"), "full": format!("https://img.test/{i}/f")}
            })
        })
        .collect();
    Json(json!({"total": count, "results": results})).into_response()
}

async fn videos(State(shared): State<Shared>, Query(q): Params) -> Json<Value> {
    let query = q.get("q").cloned().unwrap_or_default();
    shared.log(format!("youtube:{query}"));
    if query.contains("Nowhere") {
        return Json(json!({"items": []}));
    }
    Json(json!({
        "items": [{
            "id": {"videoId": "vid-1"},
            "snippet": {
                "title": query,
                "channelTitle": "Travel",
                "thumbnails": {"high": {"url": "https://yt.test/h.jpg"}}
            }
        }]
    }))
}

async fn places(State(shared): State<Shared>, Query(q): Params) -> Json<Value> {
    let get = |k: &str| q.get(k).cloned().unwrap_or_default();
    shared.log(format!("places:{}:{},{}", get("categories"), get("lat"), get("lon")));
    Json(json!({
        "type": "FeatureCollection",
        "features": [
            {"properties": {"name": "Old Town", "formatted": "1 Main St", "categories": ["tourism.sights"], "lat": 46.1, "lon": 2.1}},
            {"properties": {"name": null}},
            {"properties": {"name": "Old Town"}},
            {"properties": {"name": "Harbour"}}
        ]
    }))
}

async fn sign_up(State(shared): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    shared.log(format!("signup:{email}"));
    Json(json!({"id": "new-user", "email": email}))
}

async fn token(Query(q): Params, Json(body): Json<Value>) -> Response {
    if q.get("grant_type").map(String::as_str) != Some("password") || body["password"] != PASSWORD {
        return problem(
            StatusCode::BAD_REQUEST,
            json!({"error": "invalid_grant", "error_description": "Invalid login credentials"}),
        );
    }
    Json(json!({
        "access_token": "token-u1",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-u1",
        "user": {"id": "u1", "email": body["email"]}
    }))
    .into_response()
}

async fn current_user(headers: HeaderMap) -> Response {
    if token_user(&headers).as_deref() == OUTAGE_TOKEN.strip_prefix("token-") {
        return problem(StatusCode::SERVICE_UNAVAILABLE, json!({"msg": "auth unavailable"}));
    }
    match token_user(&headers) {
        Some(id) => Json(user_json(&id)).into_response(),
        None => problem(StatusCode::UNAUTHORIZED, json!({"msg": "invalid JWT"})),
    }
}

async fn logout(State(shared): State<Shared>, headers: HeaderMap) -> StatusCode {
    shared.log(format!("logout:{}", token_user(&headers).unwrap_or_default()));
    StatusCode::NO_CONTENT
}

async fn select_favorites(State(shared): State<Shared>, headers: HeaderMap, Query(q): Params) -> Response {
    if !has_anon_key(&headers) || token_user(&headers).is_none() {
        return problem(StatusCode::UNAUTHORIZED, json!({"message": "JWT expired"}));
    }
    let user = eq_param(&q, "user_id");
    let name = eq_param(&q, "country_name");
    let rows: Vec<Value> = shared
        .store()
        .favorites
        .iter()
        .filter(|(u, n)| Some(u) == user.as_ref() && name.as_ref().is_none_or(|want| want == n))
        .map(|(u, n)| json!({"user_id": u, "country_name": n}))
        .collect();
    Json(rows).into_response()
}

async fn insert_favorite(State(shared): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let user = body["user_id"].as_str().unwrap_or_default().to_string();
    let name = body["country_name"].as_str().unwrap_or_default().to_string();
    shared.store().favorites.push((user, name));
    StatusCode::CREATED
}

async fn delete_favorites(State(shared): State<Shared>, Query(q): Params) -> StatusCode {
    let user = eq_param(&q, "user_id");
    let name = eq_param(&q, "country_name");
    shared
        .store()
        .favorites
        .retain(|(u, n)| !(Some(u) == user.as_ref() && Some(n) == name.as_ref()));
    StatusCode::NO_CONTENT
}

async fn select_profile(State(shared): State<Shared>, Query(q): Params) -> Json<Vec<Value>> {
    let id = eq_param(&q, "id").unwrap_or_default();
    Json(shared.store().profiles.get(&id).cloned().into_iter().collect())
}

async fn upsert_profile(State(shared): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Vec<Value>>) {
    let id = body["id"].as_str().unwrap_or_default().to_string();
    shared.store().profiles.insert(id, body.clone());
    (StatusCode::CREATED, Json(vec![body]))
}

async fn subscribe(State(shared): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body[0]["email"].as_str().unwrap_or_default().to_string();
    let mut store = shared.store();
    if store.newsletter.contains(&email) {
        return problem(
            StatusCode::CONFLICT,
            json!({"code": "23505", "message": "duplicate key value violates unique constraint"}),
        );
    }
    store.newsletter.push(email);
    StatusCode::CREATED.into_response()
}

async fn store_avatar(
    State(shared): State<Shared>,
    Path(path): Path<String>,
    body: axum::body::Bytes,
) -> Json<Value> {
    shared.store().avatars.push((path.clone(), body.len()));
    Json(json!({"Key": format!("avatars/{path}")}))
}
