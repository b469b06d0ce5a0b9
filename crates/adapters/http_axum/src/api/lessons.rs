//! JSON REST handlers for lessons.

use std::str::FromStr;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use serde::Deserialize;

use tutorhub_app::services::lesson_service::{LessonFilter, LessonSort};
use tutorhub_domain::id::LessonId;
use tutorhub_domain::lesson::{Lesson, LessonInput, LessonStatus};
use tutorhub_domain::query::{ListParams, Page, TextPattern};
use tutorhub_domain::summary::LessonView;

use crate::api::{Reply, path_id, query_id, query_value};
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::state::{AppState, Backend};

#[derive(Debug, Default, Deserialize)]
pub struct LessonQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub teacher: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

impl LessonQuery {
    fn filter(&self) -> Result<LessonFilter, ApiError> {
        Ok(LessonFilter {
            q: TextPattern::optional(self.q.as_deref(), "q")?,
            category: query_id(self.category.as_deref(), "category")?,
            teacher: query_id(self.teacher.as_deref(), "teacher")?,
            status: query_value(self.status.as_deref(), LessonStatus::from_str)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
    pub teacher_id: Option<String>,
}

pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(list::<B>).post(create::<B>))
        .route(
            "/{id}",
            get(get_one::<B>).put(update::<B>).delete(delete::<B>),
        )
        .route("/{id}/status", put(change_status::<B>))
}

/// `POST /api/lessons`
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    Json(input): Json<LessonInput>,
) -> Result<Reply<Lesson>, ApiError> {
    let lesson = state.lessons.create_lesson(input).await?;
    Ok(Reply::Created(lesson))
}

/// `GET /api/lessons`
pub async fn list<B: Backend>(
    State(state): State<AppState<B>>,
    Query(list): Query<ListParams>,
    Query(query): Query<LessonQuery>,
) -> Result<Json<Page<LessonView>>, ApiError> {
    let filter = query.filter()?;
    let sort = LessonSort::parse(query.sort.as_deref());
    let page = state
        .lessons
        .list_lessons(&filter, sort, &list.page_request())
        .await?;
    Ok(Json(page))
}

/// `GET /api/lessons/{id}`
pub async fn get_one<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<LessonView>, ApiError> {
    let id: LessonId = path_id(&id)?;
    Ok(Json(state.lessons.get_lesson_view(id).await?))
}

/// `PUT /api/lessons/{id}`
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Json(input): Json<LessonInput>,
) -> Result<Json<Lesson>, ApiError> {
    let id: LessonId = path_id(&id)?;
    Ok(Json(state.lessons.update_lesson(id, input).await?))
}

/// `DELETE /api/lessons/{id}`
pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: LessonId = path_id(&id)?;
    state.lessons.delete_lesson(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/lessons/{id}/status`
pub async fn change_status<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Lesson>, ApiError> {
    let id: LessonId = path_id(&id)?;
    let lesson = state
        .lessons
        .change_status(id, req.status.as_deref(), req.teacher_id.as_deref())
        .await?;
    Ok(Json(lesson))
}
