//! Login, token verification, health checks and postal code lookup.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};

use tutorhub_app::services::auth_service::Login;
use tutorhub_domain::postal::PostalAddress;

use crate::error::ApiError;
use crate::extract::{AuthUser, Json};
use crate::state::{AppState, Backend};

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/test", get(test))
        .route("/test-db", get(test_db::<B>))
        .route("/login", post(login::<B>))
        .route("/verify", get(verify))
        .route("/postal-code/{code}", get(postal_code::<B>))
}

/// `GET /api/auth/test`
pub async fn test() -> Json<Value> {
    Json(json!({ "msg": "system running" }))
}

/// `GET /api/auth/test-db`
pub async fn test_db<B: Backend>(State(state): State<AppState<B>>) -> Result<Json<Value>, ApiError> {
    let (count, sample) = state.students.health_check().await?;
    Ok(Json(json!({
        "msg": "database connection ok",
        "student_count": count,
        "sample_student": sample,
    })))
}

/// `POST /api/auth/login`
pub async fn login<B: Backend>(
    State(state): State<AppState<B>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Login>, ApiError> {
    let login = state
        .auth
        .login(req.email.as_deref(), req.password.as_deref())
        .await?;
    Ok(Json(login))
}

/// `GET /api/auth/verify`
pub async fn verify(AuthUser(identity): AuthUser) -> Json<Value> {
    Json(json!({
        "msg": "token valid",
        "user_id": identity.user_id,
        "email": identity.email,
        "name": identity.name,
        "kind": identity.kind,
    }))
}

/// `GET /api/auth/postal-code/{code}`
pub async fn postal_code<B: Backend>(
    State(state): State<AppState<B>>,
    Path(code): Path<String>,
) -> Result<Json<PostalAddress>, ApiError> {
    let address = state.addresses.lookup(&code).await?;
    Ok(Json(address))
}
