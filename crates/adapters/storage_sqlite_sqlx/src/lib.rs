//! # tutorhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `tutorhub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Turn unique-constraint violations into domain conflicts
//!
//! ## Dependency rule
//! Depends on `tutorhub-app` (for port traits) and `tutorhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod booking_repo;
mod catalog_repo;
mod chat_repo;
mod error;
mod pool;
mod rating_repo;
mod row;
mod student_repo;
mod teacher_repo;

pub use booking_repo::SqliteBookingRepository;
pub use catalog_repo::{SqliteCategoryRepository, SqliteLessonRepository};
pub use chat_repo::SqliteChatRepository;
pub use error::StorageError;
pub use pool::{Config, Database};
pub use rating_repo::SqliteRatingRepository;
pub use student_repo::SqliteStudentRepository;
pub use teacher_repo::SqliteTeacherRepository;
