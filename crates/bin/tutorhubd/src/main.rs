//! # tutorhubd, the tutorhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`tutorhub.toml`, environment overrides)
//! - Initialise logging
//! - Open the `SQLite` pool and run migrations
//! - Construct repositories, credentials, the postal code client and services
//! - Build the axum router, bind and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use axum::ServiceExt;
use axum::extract::Request;
use tracing_subscriber::EnvFilter;

use tutorhub_adapter_credentials::{JwtIssuer, Pbkdf2Hasher};
use tutorhub_adapter_http_axum::router;
use tutorhub_adapter_http_axum::state::{AppState, Backend, Repositories, UploadSettings};
use tutorhub_adapter_postal_viacep::ViaCepClient;
use tutorhub_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, SqliteBookingRepository, SqliteCategoryRepository,
    SqliteChatRepository, SqliteLessonRepository, SqliteRatingRepository,
    SqliteStudentRepository, SqliteTeacherRepository,
};

/// The production adapter set.
struct SqliteBackend;

impl Backend for SqliteBackend {
    type Students = SqliteStudentRepository;
    type Teachers = SqliteTeacherRepository;
    type Categories = SqliteCategoryRepository;
    type Lessons = SqliteLessonRepository;
    type Bookings = SqliteBookingRepository;
    type Ratings = SqliteRatingRepository;
    type Chats = SqliteChatRepository;
    type Hasher = Pbkdf2Hasher;
    type Tokens = JwtIssuer;
    type Postal = ViaCepClient;
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    if config.auth.jwt_secret == "change-me" {
        tracing::warn!("using the default jwt secret; set TUTORHUB_JWT_SECRET");
    }

    // Database
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let pool = db.pool().clone();

    // Repositories
    let repos = Repositories::<SqliteBackend> {
        students: SqliteStudentRepository::new(pool.clone()),
        teachers: SqliteTeacherRepository::new(pool.clone()),
        categories: SqliteCategoryRepository::new(pool.clone()),
        lessons: SqliteLessonRepository::new(pool.clone()),
        bookings: SqliteBookingRepository::new(pool.clone()),
        ratings: SqliteRatingRepository::new(pool.clone()),
        chats: SqliteChatRepository::new(pool),
    };

    // Credentials
    let hasher = Pbkdf2Hasher::default();
    let tokens = JwtIssuer::new(&config.auth.jwt_secret, config.token_ttl());

    // Postal codes
    let postal = ViaCepClient::new(config.postal.base_url.clone(), config.postal_timeout())?;

    // HTTP
    let uploads = UploadSettings {
        root: config.uploads.root.clone(),
        public_base_url: config.uploads.public_base_url.clone(),
    };
    let state = AppState::new(repos, hasher, tokens, postal, uploads);
    let app = router::build(state, &config.cors.origins);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("tutorhubd listening on http://{bind_addr}");

    // Path normalisation wraps the router, so serve the layered service.
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("tutorhubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
            Err(err) => {
                tracing::error!(error = %err, "failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
