//! Multipart avatar uploads for students and teachers.
//!
//! Files land under `<root>/avatars/<kind>/<id>_<unix ts><ext>` and are served
//! back through the `/uploads` static mount.

use std::fmt::Display;
use std::path::Path as FsPath;

use axum::Router;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{MethodRouter, post};
use serde::Serialize;

use tutorhub_domain::id::{StudentId, TeacherId};
use tutorhub_domain::student::Student;
use tutorhub_domain::teacher::Teacher;
use tutorhub_domain::time::now;

use crate::api::{internal, path_id};
use crate::error::{ApiError, UploadError};
use crate::extract::{AuthUser, Json};
use crate::state::{AppState, Backend, UploadSettings};

/// Largest accepted avatar.
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Request body ceiling, above [`MAX_AVATAR_BYTES`] to fit multipart framing.
const BODY_LIMIT: usize = 2 * MAX_AVATAR_BYTES;

const ALLOWED_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "image/gif",
];

#[derive(Serialize)]
pub struct AvatarReply<T> {
    ok: bool,
    avatar_url: String,
    user: T,
}

pub fn routes<B: Backend>() -> Router<AppState<B>> {
    Router::new()
        .route("/avatar/students/{id}", student_route::<B>())
        .route("/avatar/teachers/{id}", teacher_route::<B>())
}

pub(crate) fn student_route<B: Backend>() -> MethodRouter<AppState<B>> {
    post(student_avatar::<B>).layer(DefaultBodyLimit::max(BODY_LIMIT))
}

pub(crate) fn teacher_route<B: Backend>() -> MethodRouter<AppState<B>> {
    post(teacher_avatar::<B>).layer(DefaultBodyLimit::max(BODY_LIMIT))
}

pub async fn student_avatar<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<AvatarReply<Student>>, ApiError> {
    let id: StudentId = path_id(&id)?;
    caller.require_owner(id)?;
    state.students.get_student(id).await?;

    let avatar_url = store(&state.uploads, &headers, "students", id, multipart).await?;
    let user = state.students.set_avatar(id, avatar_url.clone()).await?;
    Ok(Json(AvatarReply {
        ok: true,
        avatar_url,
        user,
    }))
}

pub async fn teacher_avatar<B: Backend>(
    State(state): State<AppState<B>>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<AvatarReply<Teacher>>, ApiError> {
    let id: TeacherId = path_id(&id)?;
    caller.require_owner(id)?;
    state.teachers.get_teacher(id).await?;

    let avatar_url = store(&state.uploads, &headers, "teachers", id, multipart).await?;
    let user = state.teachers.set_avatar(id, avatar_url.clone()).await?;
    Ok(Json(AvatarReply {
        ok: true,
        avatar_url,
        user,
    }))
}

struct Upload {
    extension: String,
    bytes: Vec<u8>,
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge(MAX_AVATAR_BYTES)
    } else {
        UploadError::Multipart(err)
    }
}

/// Pull the first `file` or `avatar` part out of the body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, UploadError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if !matches!(field.name(), Some("file" | "avatar")) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if !ALLOWED_TYPES.contains(&content_type.as_str()) {
            return Err(UploadError::UnsupportedType(content_type));
        }
        let extension = avatar_extension(field.file_name());
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(UploadError::TooLarge(MAX_AVATAR_BYTES));
        }
        return Ok(Upload {
            extension,
            bytes: bytes.to_vec(),
        });
    }
    Err(UploadError::NoFile)
}

async fn store(
    settings: &UploadSettings,
    headers: &HeaderMap,
    kind: &str,
    id: impl Display,
    multipart: Multipart,
) -> Result<String, ApiError> {
    let upload = read_upload(multipart).await?;
    let file_name = format!("{id}_{}{}", now().timestamp(), upload.extension);

    let dir = settings.root.join("avatars").join(kind);
    tokio::fs::create_dir_all(&dir).await.map_err(internal)?;
    let path = dir.join(&file_name);
    tokio::fs::write(&path, &upload.bytes)
        .await
        .map_err(internal)?;
    tracing::info!(path = %path.display(), size = upload.bytes.len(), "avatar stored");

    let base = public_base(settings, headers);
    Ok(format!("{base}/uploads/avatars/{kind}/{file_name}"))
}

/// Lowercased extension with its dot, `.jpg` when the client sent none.
fn avatar_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map_or_else(|| ".jpg".to_string(), |ext| format!(".{}", ext.to_ascii_lowercase()))
}

fn public_base(settings: &UploadSettings, headers: &HeaderMap) -> String {
    if let Some(base) = settings.public_base_url.as_deref() {
        return base.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}
