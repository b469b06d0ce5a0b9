//! JSON REST handlers for bookings.

use std::str::FromStr;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use serde::Deserialize;

use tutorhub_app::services::booking_service::{BookingFilter, BookingSort};
use tutorhub_domain::booking::{Booking, BookingInput, BookingStatus};
use tutorhub_domain::id::BookingId;
use tutorhub_domain::input::parse_instant;
use tutorhub_domain::query::{ListParams, Page};
use tutorhub_domain::summary::{BookingDetail, BookingView};

use crate::api::{Reply, path_id, query_id, query_value};
use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::state::{AppState, Backend};

#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    pub student: Option<String>,
    pub teacher: Option<String>,
    pub lesson: Option<String>,
    pub status: Option<String>,
    /// Inclusive lower bound on `scheduled_at`.
    pub from: Option<String>,
    /// Inclusive upper bound on `scheduled_at`.
    pub to: Option<String>,
    pub sort: Option<String>,
}

impl BookingQuery {
    fn filter(&self) -> Result<BookingFilter, ApiError> {
        Ok(BookingFilter {
            student: query_id(self.student.as_deref(), "student")?,
            teacher: query_id(self.teacher.as_deref(), "teacher")?,
            lesson: query_id(self.lesson.as_deref(), "lesson")?,
            status: query_value(self.status.as_deref(), BookingStatus::from_str)?,
            from: query_value(self.from.as_deref(), |raw| parse_instant(raw, "from"))?,
            to: query_value(self.to.as_deref(), |raw| parse_instant(raw, "to"))?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
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

/// `POST /api/bookings`
pub async fn create<B: Backend>(
    State(state): State<AppState<B>>,
    Json(input): Json<BookingInput>,
) -> Result<Reply<Booking>, ApiError> {
    let booking = state.bookings.create_booking(input).await?;
    Ok(Reply::Created(booking))
}

/// `GET /api/bookings`
pub async fn list<B: Backend>(
    State(state): State<AppState<B>>,
    Query(list): Query<ListParams>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<Page<BookingView>>, ApiError> {
    let filter = query.filter()?;
    let sort = BookingSort::parse(query.sort.as_deref());
    let page = state
        .bookings
        .list_bookings(&filter, sort, &list.page_request())
        .await?;
    Ok(Json(page))
}

/// `GET /api/bookings/{id}`
pub async fn get_one<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<BookingDetail>, ApiError> {
    let id: BookingId = path_id(&id)?;
    Ok(Json(state.bookings.get_booking_detail(id).await?))
}

/// `PUT /api/bookings/{id}`
pub async fn update<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Json(input): Json<BookingInput>,
) -> Result<Json<Booking>, ApiError> {
    let id: BookingId = path_id(&id)?;
    Ok(Json(state.bookings.update_booking(id, input).await?))
}

/// `DELETE /api/bookings/{id}`
pub async fn delete<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: BookingId = path_id(&id)?;
    state.bookings.delete_booking(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/bookings/{id}/status`
pub async fn change_status<B: Backend>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Booking>, ApiError> {
    let id: BookingId = path_id(&id)?;
    let booking = state
        .bookings
        .change_status(id, req.status.as_deref())
        .await?;
    Ok(Json(booking))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorhub_domain::error::{TutorHubError, ValidationError};

    #[test]
    fn should_parse_date_range_bounds() {
        let query = BookingQuery {
            from: Some("2025-03-01T00:00:00Z".to_string()),
            to: Some("2025-03-31T23:59:59Z".to_string()),
            ..BookingQuery::default()
        };
        let filter = query.filter().unwrap();
        assert!(filter.from.unwrap() < filter.to.unwrap());
    }

    #[test]
    fn should_name_bound_when_date_is_malformed() {
        let query = BookingQuery {
            to: Some("next tuesday".to_string()),
            ..BookingQuery::default()
        };
        assert!(matches!(
            query.filter(),
            Err(ApiError::Domain(TutorHubError::Validation(
                ValidationError::InvalidDateTime("to")
            )))
        ));
    }
}
