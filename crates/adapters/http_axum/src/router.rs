//! Axum router assembly.

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::response::Json;
use axum::routing::get;
use serde_json::{Value, json};
use tower::Layer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::{AppState, Backend};

/// Build the CORS layer for `origins`; `*` allows any origin.
///
/// Origins that are not valid header values are skipped with a warning.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::any()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// The servable application: the router behind trailing-slash trimming.
pub type App = NormalizePath<Router>;

/// Build the top-level application.
///
/// API routes live under `/api` and uploaded files under `/uploads`. A
/// trailing slash is trimmed before routing, so `/api/students/` reaches
/// `/api/students`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<B: Backend>(state: AppState<B>, cors_origins: &[String]) -> App {
    let uploads = ServeDir::new(&state.uploads.root);

    let router = Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes::<B>())
        .nest_service("/uploads", uploads)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "message": "TutorHub API",
        "status": "success",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_check() -> &'static str {
    "OK"
}
