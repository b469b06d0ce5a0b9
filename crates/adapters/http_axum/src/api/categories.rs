//! JSON REST handlers for lesson categories.

use std::str::FromStr;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::{Deserialize, Serialize};

use tutorhub_app::services::category_service::CategorySort;
use tutorhub_app::services::lesson_service::LessonFilter;
use tutorhub_domain::category::Category;
use tutorhub_domain::id::CategoryId;
use tutorhub_domain::lesson::LessonStatus;
use tutorhub_domain::query::{ListParams, Page, TextPattern};
use tutorhub_domain::summary::{CategoryView, LessonView};

use crate::api::{Reply, path_id, query_value};
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::state::{AppState, Backend};

#[derive(Debug, Default, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryLessonsQuery {
    pub q: Option<String>,
    pub status: Option<String>,
}

/// A category together with one page of its lessons.
#[derive(Serialize)]
pub struct CategoryLessons {
    category: Category,
    #[serde(flatten)]
    lessons: Page<LessonView>,
}

pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(list::<B>).post(create::<B>))
        .route(
            "/{id}",
            get(get_one::<B>).put(update::<B>).delete(delete::<B>),
        )
        .route("/{id}/lessons", get(lessons::<B>))
}

/// `POST /api/categories`
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    Json(req): Json<CategoryRequest>,
) -> Result<Reply<Category>, ApiError> {
    let category = state.categories.create_category(req.name.as_deref()).await?;
    Ok(Reply::Created(category))
}

/// `GET /api/categories`
pub async fn list<B: Backend>(
    State(state): State<AppState<B>>,
    Query(list): Query<ListParams>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Page<CategoryView>>, ApiError> {
    let q = TextPattern::optional(query.q.as_deref(), "q")?;
    let sort = CategorySort::parse(query.sort.as_deref());
    let page = state
        .categories
        .list_categories(q.as_ref(), sort, &list.page_request())
        .await?;
    Ok(Json(page))
}

/// `GET /api/categories/{id}`
pub async fn get_one<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryView>, ApiError> {
    let id: CategoryId = path_id(&id)?;
    Ok(Json(state.categories.get_category_view(id).await?))
}

/// `PUT /api/categories/{id}`
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let id: CategoryId = path_id(&id)?;
    let category = state
        .categories
        .update_category(id, req.name.as_deref())
        .await?;
    Ok(Json(category))
}

/// `DELETE /api/categories/{id}`; refused while lessons still use it.
pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: CategoryId = path_id(&id)?;
    state.categories.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/categories/{id}/lessons`
pub async fn lessons<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Query(list): Query<ListParams>,
    Query(query): Query<CategoryLessonsQuery>,
) -> Result<Json<CategoryLessons>, ApiError> {
    let id: CategoryId = path_id(&id)?;
    let filter = LessonFilter {
        q: TextPattern::optional(query.q.as_deref(), "q")?,
        category: Some(id),
        teacher: None,
        status: query_value(query.status.as_deref(), LessonStatus::from_str)?,
    };
    let (category, lessons) = state
        .categories
        .category_lessons(id, &filter, &list.page_request())
        .await?;
    Ok(Json(CategoryLessons { category, lessons }))
}
