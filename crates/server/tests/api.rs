use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::TimeDelta;
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, auth::TokenIssuer};
use server::ServerState;

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .password_iterations(1_000)
        .build()
        .await
        .unwrap();
    let tokens = TokenIssuer::new("test-secret", TimeDelta::minutes(30)).unwrap();

    server::router(ServerState::new(engine, tokens))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn create_user(app: &Router, name: &str, email: &str) -> i64 {
    let (status, body) = send(
        app,
        post_json(
            "/users/",
            json!({ "name": name, "email": email, "password": "pw" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn create_event(app: &Router, title: &str, max_seats: i32) -> i64 {
    let (status, body) = send(
        app,
        post_json("/events/", json!({ "title": title, "max_seats": max_seats })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "email={}&password={password}",
            email.replace('@', "%40")
        )))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn create_user_hides_password() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/users/",
            json!({ "name": "Ann", "email": "ann@x.com", "password": "pw1" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Ann");
    assert_eq!(body["email"], "ann@x.com");
    assert!(body["id"].is_i64());
    assert!(body["created_at"].is_string());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn duplicate_email_is_bad_request() {
    let app = app().await;
    create_user(&app, "Ann", "ann@x.com").await;

    let (status, body) = send(
        &app,
        post_json(
            "/users/",
            json!({ "name": "Bob", "email": "ann@x.com", "password": "pw2" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("ann@x.com"));

    let (_, users) = send(&app, get("/users/")).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_user_body_is_rejected() {
    let app = app().await;

    let (status, body) = send(&app, post_json("/users/", json!({ "name": "Ann" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("email"));

    let request = Request::builder()
        .method("POST")
        .uri("/rsvps/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_numeric_id_is_rejected_as_json() {
    let app = app().await;

    let (status, body) = send(&app, get("/users/ann")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, get("/events/x/rsvps")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn get_user_by_id() {
    let app = app().await;
    let id = create_user(&app, "Ann", "ann@x.com").await;

    let (status, body) = send(&app, get(&format!("/users/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ann@x.com");

    let (status, _) = send(&app, get("/users/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn events_are_created_and_listed() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/events/",
            json!({ "title": "Meetup", "description": "Talks", "max_seats": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Meetup");
    assert_eq!(body["description"], "Talks");
    assert_eq!(body["max_seats"], 2);

    create_event(&app, "Workshop", 10).await;

    let (status, body) = send(&app, get("/events/")).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, ["Meetup", "Workshop"]);
}

#[tokio::test]
async fn zero_seat_event_is_unprocessable() {
    let app = app().await;

    let (status, _) = send(
        &app,
        post_json("/events/", json!({ "title": "Meetup", "max_seats": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn rsvp_flow_reports_capacity_and_duplicates() {
    let app = app().await;
    let ann = create_user(&app, "Ann", "ann@x.com").await;
    let bob = create_user(&app, "Bob", "bob@x.com").await;
    let meetup = create_event(&app, "Meetup", 1).await;
    let workshop = create_event(&app, "Workshop", 5).await;

    let (status, body) = send(
        &app,
        post_json("/rsvps/", json!({ "user_id": ann, "event_id": meetup })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], ann);
    assert_eq!(body["event_id"], meetup);

    let (status, body) = send(
        &app,
        post_json("/rsvps/", json!({ "user_id": bob, "event_id": meetup })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Meetup"));

    send(
        &app,
        post_json("/rsvps/", json!({ "user_id": ann, "event_id": workshop })),
    )
    .await;
    let (status, _) = send(
        &app,
        post_json("/rsvps/", json!({ "user_id": ann, "event_id": workshop })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, get(&format!("/events/{meetup}/rsvps"))).await;
    assert_eq!(status, StatusCode::OK);
    let rsvps = body.as_array().unwrap();
    assert_eq!(rsvps.len(), 1);
    assert_eq!(rsvps[0]["user_id"], ann);
}

#[tokio::test]
async fn rsvp_for_unknown_rows_is_not_found() {
    let app = app().await;
    let ann = create_user(&app, "Ann", "ann@x.com").await;

    let (status, body) = send(
        &app,
        post_json("/rsvps/", json!({ "user_id": 77, "event_id": 78 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("user"));

    let (status, body) = send(
        &app,
        post_json("/rsvps/", json!({ "user_id": ann, "event_id": 78 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("event"));
}

#[tokio::test]
async fn rsvps_of_unknown_event_are_empty() {
    let app = app().await;

    let (status, body) = send(&app, get("/events/42/rsvps")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn token_from_form_grants_access_to_me() {
    let app = app().await;
    create_user(&app, "Ann", "ann@x.com").await;

    let (status, body) = login(&app, "ann@x.com", "pw").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ann");
    assert_eq!(body["email"], "ann@x.com");
}

#[tokio::test]
async fn token_from_query_string() {
    let app = app().await;
    create_user(&app, "Ann", "ann@x.com").await;

    let request = Request::builder()
        .method("POST")
        .uri("/token?email=ann%40x.com&password=pw")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app().await;
    create_user(&app, "Ann", "ann@x.com").await;

    let (status, _) = login(&app, "ann@x.com", "nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = login(&app, "bob@x.com", "pw").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_credentials_are_bad_request() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn me_requires_valid_bearer() {
    let app = app().await;

    let response = app.clone().oneshot(get("/users/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let request = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid or expired token");
}

#[tokio::test]
async fn token_of_foreign_issuer_is_rejected() {
    let app = app().await;
    create_user(&app, "Ann", "ann@x.com").await;

    let other = TokenIssuer::new("other-secret", TimeDelta::minutes(30)).unwrap();
    let token = other.issue("ann@x.com").unwrap();

    let request = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_scheme_is_unauthorized() {
    let app = app().await;
    create_user(&app, "Ann", "ann@x.com").await;

    let request = Request::builder()
        .uri("/users/me")
        .header(header::AUTHORIZATION, "Basic YW5uOnB3")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "invalid or expired token");
}
