mod common;

use globepeek_lib::{
    add_favorite, aggregate_favorites, fetch_detail, load_landing, resolve_favorites, ApiClients,
    ApiConfig, FavoriteRow, Section,
};

use common::{session, spawn_upstream};

fn rows(names: &[&str]) -> Vec<FavoriteRow> {
    names
        .iter()
        .map(|n| FavoriteRow {
            user_id: "u1".to_string(),
            country_name: n.to_string(),
        })
        .collect()
}

#[tokio::test]
async fn duplicate_favorites_resolve_to_one_country() {
    let upstream = spawn_upstream().await;
    let clients = upstream.clients();

    let outcome = aggregate_favorites(&clients, &rows(&["France", "France"])).await;
    assert_eq!(outcome.countries.len(), 1);
    assert_eq!(outcome.countries[0].code.as_str(), "FRA");
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn unknown_favorite_is_reported_not_fatal() {
    let upstream = spawn_upstream().await;
    let outcome = aggregate_favorites(&upstream.clients(), &rows(&["Atlantis", "Spain"])).await;

    assert_eq!(outcome.countries.len(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].country_name, "Atlantis");
}

#[tokio::test]
async fn favorites_round_trip_through_the_rows_api() {
    let upstream = spawn_upstream().await;
    let clients = upstream.clients();
    let session = session("u1");

    add_favorite(&clients.supabase, &session, "France").await.unwrap();
    add_favorite(&clients.supabase, &session, "France").await.unwrap();
    add_favorite(&clients.supabase, &session, "India").await.unwrap();
    assert_eq!(upstream.favorites().len(), 2);

    let outcome = resolve_favorites(&clients.supabase, &clients, &session)
        .await
        .unwrap();
    let codes: Vec<_> = outcome.countries.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, ["FRA", "IND", "IOT"]);
}

#[tokio::test]
async fn detail_page_fans_out_from_the_record() {
    let upstream = spawn_upstream().await;
    let clients = upstream.clients();

    let page = fetch_detail(&clients, &clients, "France").await;

    assert!(page.is_complete());
    assert_eq!(page.country.ready().unwrap().code.as_str(), "FRA");
    assert_eq!(page.images.ready().unwrap().len(), 5);
    assert_eq!(page.video.ready().unwrap().video_id, "vid-1");
    assert_eq!(page.weather.ready().unwrap().description, "few clouds");
    assert_eq!(page.destinations.ready().unwrap().len(), 2);

    // ZZZ does not resolve; the other neighbours still show.
    let borders: Vec<_> = page
        .borders
        .ready()
        .unwrap()
        .iter()
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(borders, ["Spain", "Belgium"]);

    let requests = upstream.requests();
    assert!(requests.contains(&"photos:France".to_string()));
    assert!(requests.contains(&"youtube:Scenic France".to_string()));
    assert!(requests.contains(&"weather:Paris".to_string()));
}

#[tokio::test]
async fn a_failing_service_only_fails_its_section() {
    let upstream = spawn_upstream().await;
    let config = ApiConfig {
        openweather_key: Some("wrong-key".to_string()),
        youtube_key: None,
        ..upstream.config()
    };
    let clients = ApiClients::new(&config).unwrap();

    let page = fetch_detail(&clients, &clients, "Spain").await;

    assert!(matches!(page.weather, Section::Failed(ref m) if m.contains("Invalid API key")));
    assert!(matches!(page.video, Section::Failed(ref m) if m.contains("youtube")));
    assert!(page.country.ready().is_some());
    assert!(page.images.ready().is_some());
    assert!(page.borders.ready().is_some());
    assert!(page.destinations.ready().is_some());
}

#[tokio::test]
async fn unknown_country_detail_is_not_found() {
    let upstream = spawn_upstream().await;
    let clients = upstream.clients();

    let page = fetch_detail(&clients, &clients, "Atlantis").await;
    assert!(page.is_not_found());
    assert_eq!(page.weather, Section::Empty);
}

#[tokio::test]
async fn landing_page_loads_every_part() {
    let upstream = spawn_upstream().await;
    let clients = upstream.clients();

    let landing = load_landing(&clients, &clients).await;
    assert_eq!(landing.hero.ready().unwrap().id, "world-0");
    assert_eq!(landing.featured.ready().unwrap().len(), 4);
    assert!(landing.video.ready().is_some());
}
