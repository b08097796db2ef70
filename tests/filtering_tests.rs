mod common;

use axum::http::StatusCode;
use common::{filter, get, seed_fixture, setup_test_app, setup_test_db};
use serde_json::Value;

fn names(json: &Value, key: &str) -> Vec<String> {
    let mut names: Vec<String> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item[key].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_max_year_gte_filters_degrees() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;
    common::create_degree(&app, "PhD", 4).await;

    let response = get(&app, &format!("/api/v1/degrees?{}", filter("max_year", "gte", "3"))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(names(&response.json, "name"), vec!["Bachelor", "PhD"]);
}

#[tokio::test]
async fn test_non_whitelisted_operator_is_ignored() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let response = get(&app, &format!("/api/v1/degrees?{}", filter("name", "gt", "X"))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(names(&response.json, "name"), vec!["Bachelor", "Master"]);
}

#[tokio::test]
async fn test_unknown_field_is_ignored() {
    let app = setup_test_app(setup_test_db().await);
    let fixture = seed_fixture(&app).await;

    let uri = format!(
        "/api/v1/classrooms?{}&{}",
        filter("degree_id", "eq", &fixture.master.to_string()),
        filter("name", "lte", "B1"),
    );
    let response = get(&app, &uri).await;

    assert_eq!(names(&response.json, "name"), vec!["B1", "B2", "M1"]);
}

#[tokio::test]
async fn test_filters_conjoin() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;
    common::create_degree(&app, "PhD", 4).await;

    let uri = format!(
        "/api/v1/degrees?{}&{}",
        filter("max_year", "gt", "1"),
        filter("name", "eq", "PhD"),
    );
    let response = get(&app, &uri).await;

    assert_eq!(names(&response.json, "name"), vec!["PhD"]);
}

#[tokio::test]
async fn test_uncoercible_value_is_ignored() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let response = get(&app, &format!("/api/v1/degrees?{}", filter("max_year", "eq", "four"))).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_student_filters() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let women = get(&app, &format!("/api/v1/students?{}", filter("gender", "eq", "female"))).await;
    assert_eq!(
        names(&women.json, "email"),
        vec!["ada@example.com", "grace@example.com"]
    );

    let born_before = get(
        &app,
        &format!("/api/v1/students?{}", filter("date_of_birth", "lt", "2000-01-01")),
    )
    .await;
    assert_eq!(names(&born_before.json, "email"), vec!["alan@example.com"]);

    let by_email = get(
        &app,
        &format!("/api/v1/students?{}", filter("email", "eq", "ada%40example.com")),
    )
    .await;
    assert_eq!(names(&by_email.json, "email"), vec!["ada@example.com"]);
}

#[tokio::test]
async fn test_date_range_uses_both_bounds() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let uri = format!(
        "/api/v1/students?{}&{}",
        filter("date_of_birth", "gte", "1998-06-23"),
        filter("date_of_birth", "lte", "2001-03-03"),
    );
    let response = get(&app, &uri).await;

    assert_eq!(names(&response.json, "email"), vec!["alan@example.com"]);
}

#[tokio::test]
async fn test_pagination_and_content_range() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let all = get(&app, "/api/v1/students").await;
    assert_eq!(all.content_range(), "students 0-2/3");

    let first = get(&app, "/api/v1/students?per_page=2").await;
    assert_eq!(first.json.as_array().unwrap().len(), 2);
    assert_eq!(first.content_range(), "students 0-1/3");

    let second = get(&app, "/api/v1/students?per_page=2&page=2").await;
    assert_eq!(second.json.as_array().unwrap().len(), 1);
    assert_eq!(second.content_range(), "students 2-2/3");

    let beyond = get(&app, "/api/v1/students?per_page=2&page=5").await;
    assert!(beyond.json.as_array().unwrap().is_empty());
    assert_eq!(beyond.content_range(), "students */3");
}

#[tokio::test]
async fn test_huge_page_returns_empty_page() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let response = get(&app, "/api/v1/students?page=100000000000000000&per_page=100").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json.as_array().unwrap().is_empty());
    assert_eq!(response.content_range(), "students */3");
}

#[tokio::test]
async fn test_text_filter_is_exact() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let padded = get(&app, &format!("/api/v1/students?{}", filter("last_name", "eq", "%20Student"))).await;
    assert!(padded.json.as_array().unwrap().is_empty());

    let exact = get(&app, &format!("/api/v1/students?{}", filter("last_name", "eq", "Student"))).await;
    assert_eq!(exact.json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_filtered_total_in_content_range() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let response = get(&app, &format!("/api/v1/students?{}", filter("gender", "eq", "male"))).await;
    assert_eq!(response.content_range(), "students 0-0/1");
}
