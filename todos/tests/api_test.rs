mod common;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Value};

use common::spawn_app;

#[tokio::test]
async fn test_signup_login_and_manage_todos() {
    let app = spawn_app().await;

    let signup = app
        .server
        .post("/signup")
        .json(&json!({ "email": "ada@example.com", "password": "correct horse" }))
        .await;
    signup.assert_status(StatusCode::CREATED);
    assert_eq!(signup.json::<Value>()["email"], "ada@example.com");
    assert!(signup.json::<Value>().get("password_hash").is_none());

    let login = app
        .server
        .post("/auth")
        .json(&json!({ "email": "ada@example.com", "password": "correct horse" }))
        .await;
    login.assert_status_ok();
    let token = login.json::<Value>()["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();
    let bearer = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();

    let created = app
        .server
        .post("/todos")
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({
            "title": "Write the report",
            "description": "Quarterly numbers",
            "status": "in_progress",
            "completed": false
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let todo = created.json::<Value>();
    assert_eq!(todo["status"], "in_progress");
    assert!(todo.get("id").is_none());
    let uuid = todo["uuid"].as_str().unwrap().to_string();

    let updated = app
        .server
        .put(&format!("/todo/{uuid}"))
        .add_header(AUTHORIZATION, bearer.clone())
        .json(&json!({ "status": "completed", "completed": true }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["status"], "completed");
    assert_eq!(updated.json::<Value>()["title"], "Write the report");

    let deleted = app
        .server
        .delete(&format!("/todos/{uuid}"))
        .add_header(AUTHORIZATION, bearer.clone())
        .await;
    deleted.assert_status_ok();
    deleted.assert_json(&json!({ "message": "Todo deleted successfully" }));

    let again = app
        .server
        .delete(&format!("/todos/{uuid}"))
        .add_header(AUTHORIZATION, bearer)
        .await;
    again.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(again.json::<Value>()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_bad_credentials() {
    let app = spawn_app().await;

    let invalid = app
        .server
        .post("/signup")
        .json(&json!({ "email": "not-an-email", "password": "short" }))
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

    let login = app
        .server
        .post("/auth")
        .json(&json!({ "email": "nobody@example.com", "password": "correct horse" }))
        .await;
    login.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(login.json::<Value>()["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_todo_routes_require_a_valid_token() {
    let app = spawn_app().await;

    app.server
        .get("/todos")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .post("/todos")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer garbage"))
        .json(&json!({ "title": "Sneaky" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_payloads() {
    let app = spawn_app().await;

    let short_title = app
        .server
        .post("/todos")
        .add_header(AUTHORIZATION, app.auth(5))
        .json(&json!({ "title": "ab" }))
        .await;
    short_title.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        short_title.json::<Value>()["error"]["errors"][0]["field"],
        "title"
    );

    let created = app
        .server
        .post("/todos")
        .add_header(AUTHORIZATION, app.auth(5))
        .json(&json!({ "title": "Valid title" }))
        .await;
    let uuid = created.json::<Value>()["uuid"].as_str().unwrap().to_string();

    let bad_status = app
        .server
        .put(&format!("/todo/{uuid}"))
        .add_header(AUTHORIZATION, app.auth(5))
        .json(&json!({ "status": "archived" }))
        .await;
    bad_status.assert_status(StatusCode::BAD_REQUEST);

    let not_a_uuid = app
        .server
        .put("/todo/not-a-uuid")
        .add_header(AUTHORIZATION, app.auth(5))
        .json(&json!({ "completed": true }))
        .await;
    not_a_uuid.assert_status(StatusCode::NOT_FOUND);

    let someone_else = app
        .server
        .put(&format!("/todo/{uuid}"))
        .add_header(AUTHORIZATION, app.auth(6))
        .json(&json!({ "completed": true }))
        .await;
    someone_else.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = spawn_app().await;

    let health = app.server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["status"], "ok");

    let docs = app.server.get("/api-docs/openapi.json").await;
    docs.assert_status_ok();
    let paths = docs.json::<Value>()["paths"].clone();
    assert!(paths.get("/todos").is_some());
    assert!(paths.get("/todo/{uuid}").is_some());
}

#[tokio::test]
async fn test_no_https_redirect_in_test_mode() {
    let app = spawn_app().await;

    let response = app
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-forwarded-proto"),
            HeaderValue::from_static("http"),
        )
        .await;
    response.assert_status_ok();
}
