//! JSON REST handlers for lesson ratings and rating statistics.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::Deserialize;

use tutorhub_app::services::rating_service::RatingFilter;
use tutorhub_domain::id::{LessonId, RatingId, TeacherId};
use tutorhub_domain::query::{ListParams, Page};
use tutorhub_domain::rating::{Rating, RatingInput, RatingPatch};
use tutorhub_domain::summary::{LessonSubject, RatingDetail, RatingView, SubjectStats, TeacherSubject};

use crate::api::{Reply, path_id, query_id};
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::state::{AppState, Backend};

#[derive(Debug, Default, Deserialize)]
pub struct RatingQuery {
    pub student: Option<String>,
    pub teacher: Option<String>,
    pub lesson: Option<String>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl RatingQuery {
    fn filter(&self) -> Result<RatingFilter, ApiError> {
        Ok(RatingFilter {
            student: query_id(self.student.as_deref(), "student")?,
            teacher: query_id(self.teacher.as_deref(), "teacher")?,
            lesson: query_id(self.lesson.as_deref(), "lesson")?,
            min_score: self.min_score,
            max_score: self.max_score,
        })
    }
}

pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(list::<B>).post(create::<B>))
        .route(
            "/{id}",
            get(get_one::<B>).put(update::<B>).delete(delete::<B>),
        )
        .route("/teacher/{id}/stats", get(teacher_stats::<B>))
        .route("/lesson/{id}/stats", get(lesson_stats::<B>))
}

/// `POST /api/ratings`
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    Json(input): Json<RatingInput>,
) -> Result<Reply<Rating>, ApiError> {
    let rating = state.ratings.create_rating(input).await?;
    Ok(Reply::Created(rating))
}

/// `GET /api/ratings`
pub async fn list<B: Backend>(
    State(state): State<AppState<B>>,
    Query(list): Query<ListParams>,
    Query(query): Query<RatingQuery>,
) -> Result<Json<Page<RatingView>>, ApiError> {
    let filter = query.filter()?;
    let page = state
        .ratings
        .list_ratings(&filter, &list.page_request())
        .await?;
    Ok(Json(page))
}

pub async fn get_one<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<RatingDetail>, ApiError> {
    let id: RatingId = path_id(&id)?;
    Ok(Json(state.ratings.get_rating_detail(id).await?))
}

pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Json(patch): Json<RatingPatch>,
) -> Result<Json<Rating>, ApiError> {
    let id: RatingId = path_id(&id)?;
    Ok(Json(state.ratings.update_rating(id, patch).await?))
}

pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: RatingId = path_id(&id)?;
    state.ratings.delete_rating(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/ratings/teacher/{id}/stats`
pub async fn teacher_stats<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<SubjectStats<TeacherSubject>>, ApiError> {
    let id: TeacherId = path_id(&id)?;
    Ok(Json(state.ratings.teacher_stats(id).await?))
}

/// `GET /api/ratings/lesson/{id}/stats`
pub async fn lesson_stats<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<SubjectStats<LessonSubject>>, ApiError> {
    let id: LessonId = path_id(&id)?;
    Ok(Json(state.ratings.lesson_stats(id).await?))
}
