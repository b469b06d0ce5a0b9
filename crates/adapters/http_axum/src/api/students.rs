//! JSON REST handlers for student profiles.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};

use tutorhub_app::services::student_service::{ProfileSort, Provisioned, StudentFilter};
use tutorhub_domain::error::ValidationError;
use tutorhub_domain::id::{StudentId, UserId, parse_id};
use tutorhub_domain::query::{ListParams, Page, TextPattern};
use tutorhub_domain::student::{NewStudent, Student, StudentPatch};
use tutorhub_domain::summary::public_profile;

use crate::api::{Reply, internal, path_id, uploads};
use crate::error::ApiError;
use crate::extract::{AuthUser, Json, Query};
use crate::state::{AppState, Backend};

/// Search parameters of `GET /api/students`.
#[derive(Debug, Default, Deserialize)]
pub struct StudentQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub teaches: Option<String>,
    pub learns: Option<String>,
    pub specialization: Option<String>,
    pub modality: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    /// `public` (default) or `all`.
    pub visibility: Option<String>,
    pub sort: Option<String>,
}

impl StudentQuery {
    fn filter(self) -> Result<StudentFilter, ValidationError> {
        Ok(StudentFilter {
            q: TextPattern::optional(self.q.as_deref(), "q")?,
            city: self.city.filter(|c| !c.trim().is_empty()),
            state: self.state.filter(|s| !s.trim().is_empty()),
            teaches: TextPattern::optional(self.teaches.as_deref(), "teaches")?,
            learns: TextPattern::optional(self.learns.as_deref(), "learns")?,
            specialization: TextPattern::optional(
                self.specialization.as_deref(),
                "specialization",
            )?,
            modality: self.modality.filter(|m| !m.trim().is_empty()),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            include_private: self
                .visibility
                .as_deref()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("all")),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EndorseRequest {
    pub skill: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub score: Value,
    pub comment: Option<String>,
    pub author_id: Option<String>,
}

/// Whole-number review score; anything unreadable becomes 0 and fails the
/// range check.
fn review_score(value: &Value) -> u8 {
    let whole = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    whole.and_then(|n| u8::try_from(n).ok()).unwrap_or(0)
}

pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(list::<B>).post(create::<B>))
        .route("/me", get(me::<B>).put(update_me::<B>))
        .route("/me/publish", post(publish::<B>))
        .route("/slug/{slug}", get(by_slug::<B>))
        .route(
            "/{id}",
            get(get_one::<B>).put(update::<B>).delete(delete::<B>),
        )
        .route("/{id}/endorse", post(endorse::<B>))
        .route("/{id}/review", post(review::<B>))
        .route("/{id}/avatar", uploads::student_route::<B>())
}

/// `POST /api/students`
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    Json(input): Json<NewStudent>,
) -> Result<Reply<Student>, ApiError> {
    let student = state.students.create_student(input).await?;
    Ok(Reply::Created(student))
}

/// `GET /api/students`
pub async fn list<B: Backend>(
    State(state): State<AppState<B>>,
    Query(list): Query<ListParams>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Page<Student>>, ApiError> {
    let sort = ProfileSort::parse(query.sort.as_deref());
    let filter = query.filter()?;
    let page = state
        .students
        .list_students(&filter, sort, &list.page_request())
        .await?;
    Ok(Json(page))
}

/// `GET /api/students/me`
pub async fn me<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Student>, ApiError> {
    Ok(Json(state.students.me(&caller).await?))
}

/// `PUT /api/students/me`
pub async fn update_me<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Json(patch): Json<StudentPatch>,
) -> Result<Json<Student>, ApiError> {
    Ok(Json(state.students.update_me(&caller, patch).await?))
}

/// `POST /api/students/me/publish`
pub async fn publish<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Student>, ApiError> {
    Ok(Json(state.students.publish_me(&caller).await?))
}

/// `GET /api/students/slug/{slug}`
pub async fn by_slug<B: Backend>(
    State(state): State<AppState<B>>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let student = state.students.get_by_slug(slug.trim()).await?;
    Ok(Json(public_profile(&student).map_err(internal)?))
}

/// `GET /api/students/{id}`
pub async fn get_one<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Reply<Student>, ApiError> {
    let id: StudentId = path_id(&id)?;
    let (student, provisioned) = state.students.get_or_provision(&caller, id).await?;
    Ok(match provisioned {
        Provisioned::Existing => Reply::Ok(student),
        Provisioned::Created => Reply::Created(student),
    })
}

/// `PUT /api/students/{id}`
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    _caller: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<StudentPatch>,
) -> Result<Json<Student>, ApiError> {
    let id: StudentId = path_id(&id)?;
    Ok(Json(state.students.update_student(id, patch).await?))
}

/// `DELETE /api/students/{id}`
pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: StudentId = path_id(&id)?;
    state.students.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/students/{id}/endorse`
pub async fn endorse<B: Backend>(
    State(state): State<AppState<B>>,
    _caller: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<EndorseRequest>,
) -> Result<Json<Value>, ApiError> {
    let id: StudentId = path_id(&id)?;
    state
        .students
        .endorse(id, req.skill.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// `POST /api/students/{id}/review`
pub async fn review<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Value>, ApiError> {
    let id: StudentId = path_id(&id)?;
    let author = req
        .author_id
        .as_deref()
        .and_then(|raw| parse_id::<UserId>(raw, "author_id").ok())
        .unwrap_or(caller.user_id);
    let comment = req
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let average = state
        .students
        .review(id, review_score(&req.score), comment, Some(author))
        .await?;
    Ok(Json(json!({ "ok": true, "average": average })))
}
