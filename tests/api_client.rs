//! HTTP client and session against an in-process superhero service.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use humble_heroes::api::{ApiError, HeroApi, HttpHeroApi};
use humble_heroes::hero::{FormField, HeroForm, NewHero};
use humble_heroes::session::{LeaderboardSession, SessionEvent, SessionOptions, SubmitError};

#[derive(Clone, Default)]
struct Store {
    heroes: Arc<Mutex<Vec<Value>>>,
    posts: Arc<Mutex<Vec<Value>>>,
}

async fn list(State(store): State<Store>) -> Json<Vec<Value>> {
    Json(store.heroes.lock().unwrap().clone())
}

async fn create(State(store): State<Store>, Json(body): Json<Value>) -> StatusCode {
    store.posts.lock().unwrap().push(body.clone());
    store.heroes.lock().unwrap().push(body);
    StatusCode::CREATED
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_store(store: Store) -> String {
    let router = Router::new()
        .route("/superheroes", get(list).post(create))
        .with_state(store);
    spawn(router).await
}

fn api(base: &str) -> HttpHeroApi {
    HttpHeroApi::new(base, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_list_decodes_lenient_scores() {
    let store = Store::default();
    *store.heroes.lock().unwrap() = vec![
        json!({"id": 1, "name": "Quiet Quill", "superpower": "Editing", "humilityScore": 9.5}),
        json!({"id": "b7", "name": "Meek Marvel", "superpower": "Listening", "humilityScore": "8.5"}),
        json!({"name": "Nobody", "superpower": "None", "humilityScore": null}),
    ];
    let base = spawn_store(store).await;

    let heroes = api(&base).list_heroes().await.unwrap();
    assert_eq!(heroes.len(), 3);
    assert_eq!(heroes[0].humility_score, 9.5);
    assert_eq!(heroes[1].humility_score, 8.5);
    assert_eq!(heroes[2].humility_score, 0.0);
    assert_eq!(heroes[1].row_key(), "b7");
}

#[tokio::test]
async fn test_list_keeps_good_records_next_to_bad_ones() {
    let store = Store::default();
    *store.heroes.lock().unwrap() = vec![
        Value::Null,
        json!({"id": 1.5, "name": null, "superpower": "Editing", "humilityScore": 4}),
        json!({"id": true, "name": "Meek Marvel", "superpower": "Listening", "humilityScore": 8}),
        json!("stray"),
        json!({"id": 3, "name": "Tidal", "superpower": "Water", "humilityScore": 9}),
    ];
    let base = spawn_store(store).await;

    let session = LeaderboardSession::new(api(&base), SessionOptions::default());
    assert_eq!(session.load().await.unwrap(), 3);

    let sorted = session.sorted().await;
    let names: Vec<&str> = sorted.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Tidal", "Meek Marvel", ""]);
    assert_eq!(sorted[2].row_key(), "1.5");
}

#[tokio::test]
async fn test_create_posts_camel_case_number() {
    let store = Store::default();
    let base = spawn_store(store.clone()).await;

    let hero = NewHero {
        name: "Gentle Giant".to_string(),
        superpower: "Strength".to_string(),
        humility_score: 7.5,
    };
    // Trailing slash on the origin is tolerated
    api(&format!("{}/", base)).create_hero(&hero).await.unwrap();

    let posts = store.posts.lock().unwrap();
    assert_eq!(
        posts[0],
        json!({"name": "Gentle Giant", "superpower": "Strength", "humilityScore": 7.5})
    );
}

#[tokio::test]
async fn test_server_error_status() {
    let router = Router::new().route(
        "/superheroes",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database down") }),
    );
    let base = spawn(router).await;

    match api(&base).list_heroes().await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database down");
        }
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server() {
    // Bind and drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = api(&format!("http://{}", addr)).list_heroes().await;
    assert!(matches!(result, Err(ApiError::Unavailable(_))));
}

#[tokio::test]
async fn test_session_submit_and_refresh() {
    let store = Store::default();
    *store.heroes.lock().unwrap() = vec![
        json!({"name": "Five", "superpower": "a", "humilityScore": 5}),
        json!({"name": "Nine", "superpower": "b", "humilityScore": 9}),
    ];
    let base = spawn_store(store.clone()).await;

    let options = SessionOptions::default().refresh_delay(Duration::from_millis(20));
    let mut session = LeaderboardSession::new(api(&base), options);
    let mut events = session.subscribe();

    let mut form = HeroForm::new();
    form.set_field(FormField::Name, "Two");
    form.set_field(FormField::Superpower, "c");
    form.set_field(FormField::HumilityScore, "2");
    session.submit(&mut form).await.unwrap();
    assert_eq!(form, HeroForm::default());

    let loaded = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(SessionEvent::Loaded { count }) = events.recv().await {
                return count;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(loaded, 3);

    let names: Vec<String> = session.sorted().await.into_iter().map(|h| h.name).collect();
    assert_eq!(names, vec!["Nine", "Five", "Two"]);
    session.unmount().await;
}

#[tokio::test]
async fn test_session_rejects_out_of_range_without_request() {
    let store = Store::default();
    let base = spawn_store(store.clone()).await;
    let mut session = LeaderboardSession::new(api(&base), SessionOptions::default());

    let mut form = HeroForm::new();
    form.set_field(FormField::Name, "Too Modest");
    form.set_field(FormField::Superpower, "Vanishing");
    form.set_field(FormField::HumilityScore, "0.5");

    assert!(matches!(
        session.submit(&mut form).await,
        Err(SubmitError::Validation(_))
    ));
    assert!(store.posts.lock().unwrap().is_empty());
    assert_eq!(form.humility_score, "0.5");
}
