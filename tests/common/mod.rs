#![allow(dead_code)]

use academic_api::{database, routes::api_router};
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub async fn setup_test_db() -> DatabaseConnection {
    let db = database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    database::create_schema(&db).await.expect("schema");
    db
}

pub fn setup_test_app(db: impl Into<Arc<DatabaseConnection>>) -> Router {
    api_router(db)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl TestResponse {
    pub fn content_range(&self) -> &str {
        self.headers
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        json,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, None).await
}

pub async fn delete(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::DELETE, uri, None).await
}

/// `filter[field][op]=value`, percent-encoded.
pub fn filter(field: &str, op: &str, value: &str) -> String {
    format!("filter%5B{field}%5D%5B{op}%5D={value}")
}

fn created_id(response: &TestResponse) -> Uuid {
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.json);
    response.json["id"].as_str().unwrap().parse().unwrap()
}

pub async fn create_degree(app: &Router, name: &str, max_year: i32) -> Uuid {
    let response = send(
        app,
        Method::POST,
        "/api/v1/degrees",
        Some(json!({"name": name, "max_year": max_year})),
    )
    .await;
    created_id(&response)
}

pub async fn create_classroom(app: &Router, name: &str, degree_id: Uuid) -> Uuid {
    let response = send(
        app,
        Method::POST,
        "/api/v1/classrooms",
        Some(json!({"name": name, "degree_id": degree_id})),
    )
    .await;
    created_id(&response)
}

pub async fn create_student(
    app: &Router,
    classroom_id: Uuid,
    email: &str,
    gender: &str,
    date_of_birth: Option<&str>,
) -> Uuid {
    let response = send(
        app,
        Method::POST,
        "/api/v1/students",
        Some(json!({
            "classroom_id": classroom_id,
            "first_name": "Test",
            "last_name": "Student",
            "email": email,
            "gender": gender,
            "date_of_birth": date_of_birth,
        })),
    )
    .await;
    created_id(&response)
}

/// Bachelor (B1 with two students, B2 empty) and Master (M1 with one student).
pub struct Fixture {
    pub bachelor: Uuid,
    pub master: Uuid,
    pub b1: Uuid,
    pub b2: Uuid,
    pub m1: Uuid,
    pub students: [Uuid; 3],
}

pub async fn seed_fixture(app: &Router) -> Fixture {
    let bachelor = create_degree(app, "Bachelor", 4).await;
    let master = create_degree(app, "Master", 2).await;
    let b1 = create_classroom(app, "B1", bachelor).await;
    let b2 = create_classroom(app, "B2", bachelor).await;
    let m1 = create_classroom(app, "M1", master).await;
    let students = [
        create_student(app, b1, "ada@example.com", "female", Some("2001-03-04")).await,
        create_student(app, b1, "alan@example.com", "male", Some("1998-06-23")).await,
        create_student(app, m1, "grace@example.com", "female", None).await,
    ];

    Fixture {
        bachelor,
        master,
        b1,
        b2,
        m1,
        students,
    }
}
