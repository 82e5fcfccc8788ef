use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{NaiveTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::Doctor;
use doctor_cell::router::{doctor_routes, DoctorState};
use doctor_cell::store::{DoctorStore, MemoryDoctorStore, PostgrestDoctorStore};
use shared_database::postgrest::PostgrestClient;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn doctor(id: i64, last_name: &str) -> Doctor {
    Doctor {
        id,
        first_name: "Asha".to_string(),
        last_name: last_name.to_string(),
        email: format!("doctor{}@clinic.example", id),
        specialization: "Cardiology".to_string(),
        phone: Some("+1-555-0100".to_string()),
        is_available: true,
        working_days: Some("Mon-Fri".to_string()),
        working_hours_start: NaiveTime::from_hms_opt(9, 0, 0),
        working_hours_end: NaiveTime::from_hms_opt(17, 0, 0),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn postgrest_store_parses_a_doctor_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 7,
            "first_name": "Asha",
            "last_name": "Rao",
            "email": "doctor7@clinic.example",
            "specialization": "Cardiology",
            "phone": null,
            "is_available": true,
            "working_days": "Mon-Fri",
            "working_hours_start": "09:00:00",
            "working_hours_end": "17:00:00",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_database_url(&mock_server.uri()).to_app_config();
    let store = PostgrestDoctorStore::new(Arc::new(PostgrestClient::new(&config)));

    let doctor = store.fetch(7).await.unwrap().expect("doctor should exist");
    assert_eq!(doctor.full_name(), "Asha Rao");
    assert_eq!(doctor.specialization, "Cardiology");
}

#[tokio::test]
async fn postgrest_store_reports_absent_doctors_as_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_database_url(&mock_server.uri()).to_app_config();
    let store = PostgrestDoctorStore::new(Arc::new(PostgrestClient::new(&config)));

    assert!(store.fetch(99).await.unwrap().is_none());
}

#[tokio::test]
async fn directory_routes_serve_profile_reads() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_test_token(
        &TestUser::patient(41, "pat@example.com"),
        &config.jwt_secret,
        None,
    );

    let doctors = Arc::new(MemoryDoctorStore::new());
    doctors.insert(doctor(7, "Rao"));
    doctors.insert(doctor(8, "Ibrahim"));

    let router = doctor_routes(DoctorState {
        config: config.to_arc(),
        doctors,
    });

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/7")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["total"], 2);
    // Listing is ordered by last name.
    assert_eq!(body["doctors"][0]["last_name"], "Ibrahim");

    let response = router
        .oneshot(
            Request::builder()
                .uri("/99")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
