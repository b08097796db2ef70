mod common;

use axum::http::StatusCode;
use common::{get, seed_fixture, setup_test_app, setup_test_db};
use serde_json::Value;

fn find<'a>(items: &'a Value, key: &str, value: &str) -> &'a Value {
    items
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item[key] == value)
        .unwrap()
}

#[tokio::test]
async fn test_relations_are_null_unless_requested() {
    let app = setup_test_app(setup_test_db().await);
    let fixture = seed_fixture(&app).await;

    let degrees = get(&app, "/api/v1/degrees").await;
    for degree in degrees.json.as_array().unwrap() {
        assert!(degree["classrooms"].is_null());
        assert!(degree["students"].is_null());
    }

    let student = get(&app, &format!("/api/v1/students/{}", fixture.students[0])).await;
    assert_eq!(student.status, StatusCode::OK);
    assert!(student.json["classroom"].is_null());
    assert!(student.json["degree"].is_null());
    assert!(student.json.get("classroom_id").is_none());
}

#[tokio::test]
async fn test_false_flags_do_not_load() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let degrees = get(&app, "/api/v1/degrees?includeClassrooms=false&includeStudents=0").await;
    let bachelor = find(&degrees.json, "name", "Bachelor");
    assert!(bachelor["classrooms"].is_null());
    assert!(bachelor["students"].is_null());
}

#[tokio::test]
async fn test_degree_include_classrooms() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let degrees = get(&app, "/api/v1/degrees?includeClassrooms=true").await;
    let bachelor = find(&degrees.json, "name", "Bachelor");

    let classrooms = bachelor["classrooms"].as_array().unwrap();
    assert_eq!(classrooms.len(), 2);
    assert!(classrooms.iter().all(|classroom| classroom["students"].is_null()));
    assert!(bachelor["students"].is_null());
}

#[tokio::test]
async fn test_degree_include_students_goes_through_classrooms() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let degrees = get(&app, "/api/v1/degrees?includeStudents=1").await;
    let bachelor = find(&degrees.json, "name", "Bachelor");
    let master = find(&degrees.json, "name", "Master");

    assert_eq!(bachelor["students"].as_array().unwrap().len(), 2);
    assert_eq!(master["students"].as_array().unwrap().len(), 1);
    assert!(bachelor["classrooms"].is_null());
}

#[tokio::test]
async fn test_degree_both_flags_nest_students_in_classrooms() {
    let app = setup_test_app(setup_test_db().await);
    let fixture = seed_fixture(&app).await;

    let degree = get(
        &app,
        &format!(
            "/api/v1/degrees/{}?includeClassrooms=true&includeStudents=true",
            fixture.bachelor
        ),
    )
    .await;

    let classrooms = &degree.json["classrooms"];
    assert_eq!(find(classrooms, "name", "B1")["students"].as_array().unwrap().len(), 2);
    assert!(find(classrooms, "name", "B2")["students"].as_array().unwrap().is_empty());
    assert_eq!(degree.json["students"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_classroom_include_degree_and_alias() {
    let app = setup_test_app(setup_test_db().await);
    let fixture = seed_fixture(&app).await;

    let single = get(&app, &format!("/api/v1/classrooms/{}?includeDegree=true", fixture.m1)).await;
    assert_eq!(single.json["degree"]["name"], "Master");
    assert!(single.json["students"].is_null());

    let list = get(&app, "/api/v1/classrooms?includeDegrees=true&includeStudents=true").await;
    let b2 = find(&list.json, "name", "B2");
    assert_eq!(b2["degree"]["name"], "Bachelor");
    assert!(b2["degree"]["classrooms"].is_null());
    assert!(b2["students"].as_array().unwrap().is_empty());
    assert_eq!(find(&list.json, "name", "B1")["students"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_student_include_classroom_and_degree() {
    let app = setup_test_app(setup_test_db().await);
    let fixture = seed_fixture(&app).await;
    let uri = format!("/api/v1/students/{}", fixture.students[2]);

    let degree_only = get(&app, &format!("{uri}?includeDegree=true")).await;
    assert_eq!(degree_only.json["degree"]["name"], "Master");
    assert!(degree_only.json["classroom"].is_null());

    let both = get(&app, &format!("{uri}?includeDegree=true&includeClassroom=true")).await;
    assert_eq!(both.json["classroom"]["name"], "M1");
    assert_eq!(both.json["classroom"]["degree"]["name"], "Master");
    assert_eq!(both.json["degree"]["max_year"], 2);

    let classroom_only = get(&app, &format!("{uri}?includeClassroom=yes")).await;
    assert_eq!(classroom_only.json["classroom"]["name"], "M1");
    assert!(classroom_only.json["classroom"]["degree"].is_null());
}

#[tokio::test]
async fn test_student_list_includes() {
    let app = setup_test_app(setup_test_db().await);
    seed_fixture(&app).await;

    let list = get(&app, "/api/v1/students?includeDegree=on").await;
    let ada = find(&list.json, "email", "ada@example.com");
    let grace = find(&list.json, "email", "grace@example.com");
    assert_eq!(ada["degree"]["name"], "Bachelor");
    assert_eq!(grace["degree"]["name"], "Master");
}
