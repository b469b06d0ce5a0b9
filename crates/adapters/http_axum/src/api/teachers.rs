//! JSON REST handlers for teacher profiles.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::Deserialize;
use serde_json::Value;

use tutorhub_app::services::student_service::ProfileSort;
use tutorhub_app::services::teacher_service::TeacherFilter;
use tutorhub_domain::error::ValidationError;
use tutorhub_domain::id::TeacherId;
use tutorhub_domain::query::{ListParams, Page, TextPattern};
use tutorhub_domain::summary::public_profile;
use tutorhub_domain::teacher::{NewTeacher, Teacher, TeacherPatch};

use crate::api::{Reply, internal, path_id, uploads};
use crate::error::ApiError;
use crate::extract::{AuthUser, Json, Query};
use crate::state::{AppState, Backend};

/// Search parameters of `GET /api/teachers`.
#[derive(Debug, Default, Deserialize)]
pub struct TeacherQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub area: Option<String>,
    pub teaches: Option<String>,
    pub sort: Option<String>,
}

impl TeacherQuery {
    fn filter(self) -> Result<TeacherFilter, ValidationError> {
        Ok(TeacherFilter {
            q: TextPattern::optional(self.q.as_deref(), "q")?,
            city: self.city.filter(|c| !c.trim().is_empty()),
            state: self.state.filter(|s| !s.trim().is_empty()),
            area: self.area.filter(|a| !a.trim().is_empty()),
            teaches: TextPattern::optional(self.teaches.as_deref(), "teaches")?,
        })
    }
}

pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(list::<B>).post(create::<B>))
        .route("/me", get(me::<B>).put(update_me::<B>))
        .route("/slug/{slug}", get(by_slug::<B>))
        .route(
            "/{id}",
            get(get_one::<B>).put(update::<B>).delete(delete::<B>),
        )
        .route("/{id}/avatar", uploads::teacher_route::<B>())
}

/// `POST /api/teachers`
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    Json(input): Json<NewTeacher>,
) -> Result<Reply<Teacher>, ApiError> {
    let teacher = state.teachers.create_teacher(input).await?;
    Ok(Reply::Created(teacher))
}

/// `GET /api/teachers`
pub async fn list<B: Backend>(
    State(state): State<AppState<B>>,
    Query(list): Query<ListParams>,
    Query(query): Query<TeacherQuery>,
) -> Result<Json<Page<Teacher>>, ApiError> {
    let sort = ProfileSort::parse(query.sort.as_deref());
    let filter = query.filter()?;
    let page = state
        .teachers
        .list_teachers(&filter, sort, &list.page_request())
        .await?;
    Ok(Json(page))
}

pub async fn me<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Teacher>, ApiError> {
    Ok(Json(state.teachers.me(&caller).await?))
}

pub async fn update_me<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Json(patch): Json<TeacherPatch>,
) -> Result<Json<Teacher>, ApiError> {
    Ok(Json(state.teachers.update_me(&caller, patch).await?))
}

/// `GET /api/teachers/slug/{slug}`, tolerant of near-miss slugs.
pub async fn by_slug<B: Backend>(
    State(state): State<AppState<B>>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let teacher = state.teachers.get_by_slug(slug.trim()).await?;
    Ok(Json(public_profile(&teacher).map_err(internal)?))
}

/// `GET /api/teachers/{id}`
pub async fn get_one<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<Teacher>, ApiError> {
    let id: TeacherId = path_id(&id)?;
    Ok(Json(state.teachers.get_teacher(id).await?))
}

pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    _caller: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<TeacherPatch>,
) -> Result<Json<Teacher>, ApiError> {
    let id: TeacherId = path_id(&id)?;
    Ok(Json(state.teachers.update_teacher(id, patch).await?))
}

pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: TeacherId = path_id(&id)?;
    state.teachers.delete_teacher(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
