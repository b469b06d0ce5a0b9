//! Direct conversations between two users. Every route needs a bearer token.

use axum::Router;
use axum::extract::{Path, State};
use axum::routing::get;
use serde::Deserialize;

use tutorhub_domain::chat::MessageView;
use tutorhub_domain::id::ConversationId;
use tutorhub_domain::summary::ConversationView;

use crate::api::{Reply, path_id};
use crate::error::ApiError;
use crate::extract::{AuthUser, Json};
use crate::state::{AppState, Backend};

#[derive(Debug, Default, Deserialize)]
pub struct OpenRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    pub text: Option<String>,
}

pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(list::<B>).post(open::<B>))
        .route("/{id}/messages", get(messages::<B>).post(send::<B>))
}

/// `GET /api/chats`
pub async fn list<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<ConversationView>>, ApiError> {
    Ok(Json(state.chats.list_conversations(&caller).await?))
}

/// `POST /api/chats`; `201` when a new conversation was started.
pub async fn open<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Json(req): Json<OpenRequest>,
) -> Result<Reply<ConversationView>, ApiError> {
    let (view, created) = state
        .chats
        .open_conversation(&caller, req.user_id.as_deref())
        .await?;
    Ok(if created {
        Reply::Created(view)
    } else {
        Reply::Ok(view)
    })
}

/// `GET /api/chats/{id}/messages`
pub async fn messages<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let id: ConversationId = path_id(&id)?;
    Ok(Json(state.chats.messages(&caller, id).await?))
}

/// `POST /api/chats/{id}/messages`
pub async fn send<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SendRequest>,
) -> Result<Reply<MessageView>, ApiError> {
    let id: ConversationId = path_id(&id)?;
    let message = state.chats.send(&caller, id, req.text.as_deref()).await?;
    Ok(Reply::Created(message))
}
