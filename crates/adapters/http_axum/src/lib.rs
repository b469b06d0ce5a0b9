//! # tutorhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the JSON API under `/api` (auth, profiles, catalog, bookings,
//!   ratings, chats)
//! - Authenticate callers from `Authorization: Bearer` headers
//! - Accept avatar uploads and serve them back from `/uploads`
//! - Map application results into HTTP responses and errors into
//!   `{"error", "message"}` bodies
//!
//! ## Dependency rule
//! Depends on `tutorhub-app` (for port traits and services) and `tutorhub-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod extract;
pub mod router;
pub mod state;
