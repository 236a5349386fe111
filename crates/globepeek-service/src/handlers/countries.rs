//! Directory, suggestions, detail and landing endpoints.

use axum::extract::{Path, Query, State};
use serde::Serialize;
use tracing::info;

use globepeek_lib::directory::{page_of, SUGGESTION_LIMIT};
use globepeek_lib::{
    fetch_detail, load_landing, Country, DetailPage, Directory, LandingPage, PageItem, Section,
};
use globepeek_service_shared::{
    failure_reason, record_directory_query, record_upstream_call, record_upstream_failure,
    AppState, DirectoryQuery, ProblemDetails, RequestId, ServiceResponse, SuggestQuery,
};

use super::{upstream_call, validated, ApiResult};

/// How many "did you mean" names a missing country gets.
const NOT_FOUND_SUGGESTIONS: usize = 3;

/// One page of the directory plus the option lists for the filter controls.
#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub page: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub countries: Vec<Country>,
    pub pagination: Vec<PageItem>,
    pub regions: Vec<String>,
    pub languages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub query: String,
    pub suggestions: Vec<String>,
}

async fn load_directory(state: &AppState, request_id: &RequestId) -> Result<Directory, ProblemDetails> {
    upstream_call("restcountries", "all", request_id, state.clients().countries.all())
        .await
        .map(Directory::new)
}

/// Count the fetch behind a page section. Sections that never started are
/// skipped; a failed one also counts as a failure.
fn record_section<T>(upstream: &'static str, operation: &'static str, section: &Section<T>) {
    if section.is_loading() {
        return;
    }
    record_upstream_call(upstream, operation);
    if section.is_failed() {
        record_upstream_failure(upstream, "section");
    }
}

/// `GET /api/v1/countries`
pub async fn list(
    State(state): State<AppState>,
    request_id: RequestId,
    Query(query): Query<DirectoryQuery>,
) -> ApiResult<DirectoryResponse> {
    let query = validated(query, &request_id)?;
    let directory = load_directory(&state, &request_id).await?;

    let filtered = directory.filter(&query.filter());
    let page = page_of(&filtered, query.page());
    record_directory_query("list", page.total_matches);
    info!(
        request_id = %request_id,
        matches = page.total_matches,
        page = page.page,
        "directory page served"
    );

    Ok(ServiceResponse::new(DirectoryResponse {
        page: page.page,
        total_pages: page.total_pages,
        total_matches: page.total_matches,
        countries: page.countries.to_vec(),
        pagination: page.pagination,
        regions: directory.regions(),
        languages: directory.languages(),
    }))
}

/// `GET /api/v1/countries/suggest`
pub async fn suggest(
    State(state): State<AppState>,
    request_id: RequestId,
    Query(query): Query<SuggestQuery>,
) -> ApiResult<SuggestResponse> {
    let query = validated(query, &request_id)?;
    if query.q.trim().is_empty() {
        return Ok(ServiceResponse::new(SuggestResponse {
            query: query.q,
            suggestions: Vec::new(),
        }));
    }

    let directory = load_directory(&state, &request_id).await?;
    let suggestions = directory.suggestions(&query.q, SUGGESTION_LIMIT);
    record_directory_query("suggest", suggestions.len());

    Ok(ServiceResponse::new(SuggestResponse {
        query: query.q,
        suggestions,
    }))
}

/// `GET /api/v1/countries/{name}`
///
/// Sections fail independently and are reported inside a 200 response. Only
/// an unknown country is an error: 404 with similar names when the full list
/// can be fetched.
pub async fn detail(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(name): Path<String>,
) -> ApiResult<DetailPage> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ProblemDetails::bad_request("Country name cannot be empty", request_id.as_str()));
    }

    let clients = state.clients();
    let page = fetch_detail(clients, clients, &name).await;
    record_section("restcountries", "country", &page.country);

    if page.is_not_found() {
        record_upstream_call("restcountries", "all");
        let suggestions = match clients.countries.all().await {
            Ok(all) => Directory::new(all).fuzzy_matches(&name, NOT_FOUND_SUGGESTIONS),
            Err(e) => {
                record_upstream_failure("restcountries", failure_reason(&e));
                tracing::warn!(request_id = %request_id, error = %e, "could not load suggestions");
                Vec::new()
            }
        };
        info!(request_id = %request_id, country = %name, "detail requested for unknown country");
        return Err(ProblemDetails::country_not_found(&name, &suggestions, request_id.as_str()));
    }

    record_section("unsplash", "images", &page.images);
    record_section("youtube", "video", &page.video);
    record_section("openweather", "weather", &page.weather);
    record_section("restcountries", "borders", &page.borders);
    record_section("geoapify", "destinations", &page.destinations);
    info!(request_id = %request_id, country = %name, "detail page served");
    Ok(ServiceResponse::new(page))
}

/// `GET /api/v1/landing`
pub async fn landing(State(state): State<AppState>, request_id: RequestId) -> ApiResult<LandingPage> {
    let clients = state.clients();
    let page = load_landing(clients, clients).await;
    record_section("unsplash", "hero", &page.hero);
    record_section("restcountries", "featured", &page.featured);
    record_section("youtube", "video", &page.video);
    info!(
        request_id = %request_id,
        hero = page.hero.ready().is_some(),
        featured = page.featured.ready().map_or(0, Vec::len),
        "landing page served"
    );
    Ok(ServiceResponse::new(page))
}
