//! End-to-end tests for the full tutorhubd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real repos,
//! real credentials, real services, real axum router) and exercises the HTTP
//! layer via `tower::ServiceExt::oneshot`: no TCP port is bound.

use std::future::Future;
use std::num::NonZeroU32;
use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use tutorhub_adapter_credentials::{JwtIssuer, Pbkdf2Hasher};
use tutorhub_adapter_http_axum::router::{self, App};
use tutorhub_adapter_http_axum::state::{AppState, Backend, Repositories, UploadSettings};
use tutorhub_adapter_storage_sqlite_sqlx::{
    Config, SqliteBookingRepository, SqliteCategoryRepository, SqliteChatRepository,
    SqliteLessonRepository, SqliteRatingRepository, SqliteStudentRepository,
    SqliteTeacherRepository,
};
use tutorhub_app::ports::PostalCodeLookup;
use tutorhub_domain::error::{TutorHubError, UpstreamError};
use tutorhub_domain::id::StudentId;
use tutorhub_domain::postal::{PostalAddress, PostalCode};

struct TestBackend;

/// Knows one postal code and fails for codes starting with 5.
struct FakePostal;

impl PostalCodeLookup for FakePostal {
    fn lookup(
        &self,
        code: &PostalCode,
    ) -> impl Future<Output = Result<Option<PostalAddress>, TutorHubError>> + Send {
        let result = match code.as_str() {
            "01001000" => Ok(Some(PostalAddress {
                postal_code: "01001-000".to_string(),
                street: "Praça da Sé".to_string(),
                complement: String::new(),
                district: "Sé".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
            })),
            digits if digits.starts_with('5') => Err(UpstreamError::BadStatus {
                service: "ViaCEP",
                status: 503,
            }
            .into()),
            _ => Ok(None),
        };
        async move { result }
    }
}

impl Backend for TestBackend {
    type Students = SqliteStudentRepository;
    type Teachers = SqliteTeacherRepository;
    type Categories = SqliteCategoryRepository;
    type Lessons = SqliteLessonRepository;
    type Bookings = SqliteBookingRepository;
    type Ratings = SqliteRatingRepository;
    type Chats = SqliteChatRepository;
    type Hasher = Pbkdf2Hasher;
    type Tokens = JwtIssuer;
    type Postal = FakePostal;
}

fn upload_root() -> PathBuf {
    std::env::temp_dir().join(format!("tutorhub-it-{}", StudentId::new()))
}

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn build_app(root: PathBuf, cors_origins: &[String]) -> App {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let pool = db.pool().clone();

    let repos = Repositories::<TestBackend> {
        students: SqliteStudentRepository::new(pool.clone()),
        teachers: SqliteTeacherRepository::new(pool.clone()),
        categories: SqliteCategoryRepository::new(pool.clone()),
        lessons: SqliteLessonRepository::new(pool.clone()),
        bookings: SqliteBookingRepository::new(pool.clone()),
        ratings: SqliteRatingRepository::new(pool.clone()),
        chats: SqliteChatRepository::new(pool),
    };
    let hasher = Pbkdf2Hasher::new(NonZeroU32::new(1_000).unwrap());
    let tokens = JwtIssuer::new("integration-secret", chrono::TimeDelta::hours(1));
    let uploads = UploadSettings {
        root,
        public_base_url: None,
    };

    router::build(
        AppState::new(repos, hasher, tokens, FakePostal, uploads),
        cors_origins,
    )
}

async fn app_with_uploads(root: PathBuf) -> App {
    build_app(root, &[]).await
}

async fn app() -> App {
    app_with_uploads(upload_root()).await
}

async fn call(
    app: &App,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send(app, request).await
}

async fn send(app: &App, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

async fn register_student(app: &App, name: &str, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/students",
        None,
        Some(json!({ "name": name, "email": email, "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    id_of(&body)
}

async fn register_teacher(app: &App, name: &str, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/teachers",
        None,
        Some(json!({ "name": name, "email": email, "password": "pw123", "area": "Music" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    id_of(&body)
}

async fn login(app: &App, email: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["access_token"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let (status, body) = call(&app().await, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn should_describe_service_at_root() {
    let (status, body) = call(&app().await, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn should_report_database_health() {
    let app = app().await;
    register_student(&app, "Ana", "ana@example.com").await;
    let (status, body) = call(&app, Method::GET, "/api/auth/test-db", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student_count"], 1);
    assert_eq!(body["sample_student"]["email"], "ana@example.com");
}

#[tokio::test]
async fn should_route_when_path_has_trailing_slash() {
    let app = app().await;
    register_student(&app, "Ana", "ana@example.com").await;

    let (status, body) = call(&app, Method::GET, "/api/students/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login/",
        None,
        Some(json!({ "email": "ana@example.com", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn should_answer_with_error_body_when_request_is_unreadable() {
    let app = app().await;
    let raw = |body: &'static str| {
        Request::builder()
            .method(Method::POST)
            .uri("/api/categories")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    };

    for body in ["{not json", r#"{"name":5}"#] {
        let (status, value) = send(&app, raw(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(value["error"], "invalid_body");
        assert!(value["message"].is_string());
    }

    let (status, value) = call(&app, Method::GET, "/api/students?page=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"], "invalid_query");
    assert!(value["message"].is_string());
}

#[tokio::test]
async fn should_accept_json_body_without_content_type() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/students")
        .body(Body::from(
            json!({ "name": "Ana", "email": "ana@example.com" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["email"], "ana@example.com");
}

fn with_origin(method: Method, uri: &str, origin: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, origin)
}

#[tokio::test]
async fn should_allow_only_configured_origins() {
    let app = build_app(upload_root(), &["https://app.example.com".to_string()]).await;

    let request = with_origin(Method::GET, "/health", "https://app.example.com")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example.com"
    );

    let request = with_origin(Method::GET, "/health", "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(request).await.unwrap();
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    let request = with_origin(Method::OPTIONS, "/api/students/me", "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert!(resp.status().is_success());
    let allowed = resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("authorization"), "{allowed}");
}

#[tokio::test]
async fn should_allow_any_origin_when_wildcard_is_configured() {
    let app = build_app(upload_root(), &["*".to_string()]).await;
    let request = with_origin(Method::GET, "/health", "https://anyone.example.com")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_login_and_verify_token_when_credentials_match() {
    let app = app().await;
    let id = register_student(&app, "Ana", "Ana@Example.com").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": " ana@example.com ", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "student");
    assert_eq!(body["user"]["id"], id);
    assert!(body["user"].get("password_hash").is_none());

    let token = body["access_token"].as_str().unwrap();
    let (status, body) = call(&app, Method::GET, "/api/auth/verify", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], id);
    assert_eq!(body["kind"], "student");
}

#[tokio::test]
async fn should_reject_login_when_password_is_wrong() {
    let app = app().await;
    register_teacher(&app, "Rui", "rui@example.com").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "rui@example.com", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn should_require_bearer_token_for_protected_routes() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/api/students/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_token");

    let (status, _) = call(&app, Method::GET, "/api/chats", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_resolve_postal_code_through_lookup() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/api/auth/postal-code/01001-000", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "São Paulo");
    assert_eq!(body["state"], "SP");

    let (status, body) = call(&app, Method::GET, "/api/auth/postal-code/1234", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_postal_code");

    let (status, body) = call(&app, Method::GET, "/api/auth/postal-code/99999999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = call(&app, Method::GET, "/api/auth/postal-code/50000000", None, None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_reject_duplicate_email_registration() {
    let app = app().await;
    register_student(&app, "Ana", "ana@example.com").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/students",
        None,
        Some(json!({ "name": "Other", "email": "ANA@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email_already_exists");
}

#[tokio::test]
async fn should_forbid_teacher_me_for_student_token() {
    let app = app().await;
    register_student(&app, "Ana", "ana@example.com").await;
    let token = login(&app, "ana@example.com").await;

    let (status, _) = call(&app, Method::GET, "/api/teachers/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::GET, "/api/students/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ana");
}

#[tokio::test]
async fn should_publish_profile_and_serve_it_by_slug_without_private_fields() {
    let app = app().await;
    register_student(&app, "Ana Souza", "ana@example.com").await;
    let token = login(&app, "ana@example.com").await;

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/students/me",
        Some(&token),
        Some(json!({ "phone": "555-0101", "wants_to_learn": "guitar, piano" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, published) =
        call(&app, Method::POST, "/api/students/me/publish", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let slug = published["slug"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/students/slug/{slug}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ana Souza");
    assert_eq!(body["wants_to_learn"], json!(["guitar", "piano"]));
    assert!(body.get("phone").is_none());
    assert!(body.get("email").is_none());
}

#[tokio::test]
async fn should_page_student_search() {
    let app = app().await;
    for (name, email) in [
        ("Ana", "ana@example.com"),
        ("Bia", "bia@example.com"),
        ("Caio", "caio@example.com"),
    ] {
        register_student(&app, name, email).await;
    }

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/students?limit=2&page=2&sort=name&order=1",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Caio");

    let (status, body) = call(&app, Method::GET, "/api/students?q=(", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_search_pattern");
}

#[tokio::test]
async fn should_record_review_average() {
    let app = app().await;
    let id = register_student(&app, "Ana", "ana@example.com").await;
    let token = login(&app, "ana@example.com").await;
    let uri = format!("/api/students/{id}/review");

    let (status, _) = call(&app, Method::POST, &uri, Some(&token), Some(json!({ "score": 5 }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) =
        call(&app, Method::POST, &uri, Some(&token), Some(json!({ "score": "4" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "average": 4.5 }));

    let (status, body) =
        call(&app, Method::POST, &uri, Some(&token), Some(json!({ "score": "great" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_score_range");
}

// ---------------------------------------------------------------------------
// Catalog, bookings and ratings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_run_lesson_lifecycle_from_booking_to_rating() {
    let app = app().await;
    let student = register_student(&app, "Ana", "ana@example.com").await;
    let teacher = register_teacher(&app, "Rui", "rui@example.com").await;

    let (status, category) = call(
        &app,
        Method::POST,
        "/api/categories",
        None,
        Some(json!({ "name": "Music" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category = id_of(&category);

    let (status, lesson) = call(
        &app,
        Method::POST,
        "/api/lessons",
        None,
        Some(json!({
            "title": "Guitar basics",
            "price": "50",
            "teacher_id": teacher,
            "category_id": category,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{lesson}");
    assert_eq!(lesson["status"], "available");
    let lesson = id_of(&lesson);

    let booking_body = json!({
        "student_id": student,
        "teacher_id": teacher,
        "lesson_id": lesson,
        "scheduled_at": "2025-03-10T14:00:00Z",
    });
    let (status, booking) = call(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    let booking = id_of(&booking);

    let (_, view) = call(&app, Method::GET, &format!("/api/lessons/{lesson}"), None, None).await;
    assert_eq!(view["status"], "scheduled");

    let (status, body) = call(&app, Method::POST, "/api/bookings", None, Some(booking_body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "teacher_schedule_conflict");

    let rating_body = json!({
        "student_id": student,
        "teacher_id": teacher,
        "lesson_id": lesson,
        "score": 9,
        "text": "Great class",
    });
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/ratings",
        None,
        Some(rating_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "student_did_not_attend_lesson");

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/bookings/{booking}/status"),
        None,
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::POST, "/api/ratings", None, Some(rating_body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, stats) = call(
        &app,
        Method::GET,
        &format!("/api/ratings/teacher/{teacher}/stats"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["average"], 9.0);
    assert_eq!(stats["teacher"]["id"], teacher);

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/api/categories/{category}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "category_in_use");
}

#[tokio::test]
async fn should_return_not_found_when_booking_update_points_at_unknown_records() {
    let app = app().await;
    let student = register_student(&app, "Ana", "ana@example.com").await;
    let teacher = register_teacher(&app, "Rui", "rui@example.com").await;
    let (_, lesson) = call(
        &app,
        Method::POST,
        "/api/lessons",
        None,
        Some(json!({ "title": "Guitar basics", "teacher_id": teacher })),
    )
    .await;
    let lesson = id_of(&lesson);
    let (status, booking) = call(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(json!({
            "student_id": student,
            "teacher_id": teacher,
            "lesson_id": lesson,
            "scheduled_at": "2025-03-10T14:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    let uri = format!("/api/bookings/{}", id_of(&booking));

    for body in [
        json!({ "student_id": StudentId::new() }),
        json!({ "lesson_id": tutorhub_domain::id::LessonId::new() }),
    ] {
        let (status, value) = call(&app, Method::PUT, &uri, None, Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{value}");
        assert_eq!(value["error"], "not_found");
    }

    let (_, stored) = call(&app, Method::GET, &uri, None, None).await;
    assert_eq!(stored["student_id"], student.as_str());
    assert_eq!(stored["lesson_id"], lesson.as_str());
}

#[tokio::test]
async fn should_list_category_lessons_with_category_header() {
    let app = app().await;
    let teacher = register_teacher(&app, "Rui", "rui@example.com").await;
    let (_, category) = call(
        &app,
        Method::POST,
        "/api/categories",
        None,
        Some(json!({ "name": "Math" })),
    )
    .await;
    let category = id_of(&category);
    for title in ["Algebra", "Geometry"] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/lessons",
            None,
            Some(json!({ "title": title, "teacher_id": teacher, "category_id": category })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/categories/{category}/lessons?q=geo"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["name"], "Math");
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["title"], "Geometry");
}

#[tokio::test]
async fn should_return_not_found_for_unknown_lesson_and_bad_request_for_malformed_id() {
    let app = app().await;
    let missing = tutorhub_domain::id::LessonId::new();
    let (status, body) = call(&app, Method::GET, &format!("/api/lessons/{missing}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = call(&app, Method::GET, "/api/lessons/42", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

// ---------------------------------------------------------------------------
// Chats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_open_conversation_once_and_exchange_messages() {
    let app = app().await;
    register_student(&app, "Ana", "ana@example.com").await;
    let teacher = register_teacher(&app, "Rui", "rui@example.com").await;
    let ana = login(&app, "ana@example.com").await;
    let rui = login(&app, "rui@example.com").await;

    let open = json!({ "user_id": teacher });
    let (status, conversation) =
        call(&app, Method::POST, "/api/chats", Some(&ana), Some(open.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(conversation["other"]["name"], "Rui");
    let id = id_of(&conversation);

    let (status, again) = call(&app, Method::POST, "/api/chats", Some(&ana), Some(open)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&again), id);

    let uri = format!("/api/chats/{id}/messages");
    let (status, sent) =
        call(&app, Method::POST, &uri, Some(&ana), Some(json!({ "text": " hello " }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["text"], "hello");
    assert_eq!(sent["from_me"], true);

    let (status, messages) = call(&app, Method::GET, &uri, Some(&rui), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages[0]["text"], "hello");
    assert_eq!(messages[0]["from_me"], false);

    let (status, list) = call(&app, Method::GET, "/api/chats", Some(&rui), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["last_message"]["text"], "hello");

    let (status, body) =
        call(&app, Method::POST, &uri, Some(&rui), Some(json!({ "text": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty_message");
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

fn multipart(content_type: &str, file_name: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "tutorhub-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn upload(app: &App, uri: &str, token: &str, content_type: &str, file: &[u8]) -> (StatusCode, Value) {
    let (multipart_type, body) = multipart(content_type, "Me.PNG", file);
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::HOST, "api.test")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, multipart_type)
        .body(Body::from(body))
        .unwrap();
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn should_store_avatar_and_update_profile() {
    let root = upload_root();
    let app = app_with_uploads(root.clone()).await;
    let id = register_student(&app, "Ana", "ana@example.com").await;
    let token = login(&app, "ana@example.com").await;

    let (status, body) = upload(
        &app,
        &format!("/api/students/{id}/avatar"),
        &token,
        "image/png",
        b"\x89PNG fake",
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let url = body["avatar_url"].as_str().unwrap();
    assert!(url.starts_with(&format!("http://api.test/uploads/avatars/students/{id}_")));
    assert!(url.ends_with(".png"));
    assert_eq!(body["user"]["avatar_url"], url);

    let file_name = url.rsplit('/').next().unwrap();
    let stored = root.join("avatars").join("students").join(file_name);
    assert_eq!(std::fs::read(stored).unwrap(), b"\x89PNG fake");
    let _ = std::fs::remove_dir_all(root);
}

#[tokio::test]
async fn should_reject_avatar_upload_for_someone_else_or_wrong_type() {
    let app = app().await;
    let ana = register_student(&app, "Ana", "ana@example.com").await;
    register_student(&app, "Bia", "bia@example.com").await;
    let bia = login(&app, "bia@example.com").await;
    let ana_token = login(&app, "ana@example.com").await;

    let uri = format!("/api/uploads/avatar/students/{ana}");
    let (status, _) = upload(&app, &uri, &bia, "image/png", b"png").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = upload(&app, &uri, &ana_token, "text/plain", b"hello").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], "unsupported_type");
}
