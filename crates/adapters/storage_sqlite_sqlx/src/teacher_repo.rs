//! `SQLite` implementation of [`TeacherRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use tutorhub_app::ports::TeacherRepository;
use tutorhub_domain::error::{NotFoundError, TutorHubError};
use tutorhub_domain::id::TeacherId;
use tutorhub_domain::teacher::Teacher;
use tutorhub_domain::time::to_canonical;

use crate::error::StorageError;
use crate::row;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Teacher);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Teacher> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let mut teacher: Teacher = row::json(row, "document")?;
        teacher.password_hash = row.try_get("password_hash")?;
        Ok(Self(teacher))
    }
}

const INSERT: &str = r"
    INSERT INTO teachers (id, email, slug, password_hash, document, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM teachers WHERE id = ?";
const SELECT_BY_EMAIL: &str = "SELECT * FROM teachers WHERE email = ?";
const SELECT_BY_SLUG: &str = "SELECT * FROM teachers WHERE slug = ?";
const SELECT_ALL: &str = "SELECT * FROM teachers ORDER BY created_at";
const SLUG_EXISTS: &str =
    "SELECT EXISTS(SELECT 1 FROM teachers WHERE slug = ? AND id IS NOT ?)";

const UPDATE: &str = r"
    UPDATE teachers
    SET email = ?, slug = ?, password_hash = COALESCE(?, password_hash), document = ?,
        updated_at = ?
    WHERE id = ?
    RETURNING password_hash
";

const DELETE_BY_ID: &str = "DELETE FROM teachers WHERE id = ?";

/// `SQLite`-backed teacher repository.
#[derive(Clone)]
pub struct SqliteTeacherRepository {
    pool: SqlitePool,
}

impl SqliteTeacherRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TeacherRepository for SqliteTeacherRepository {
    fn create(&self, teacher: Teacher) -> impl Future<Output = Result<Teacher, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let document = serde_json::to_string(&teacher).map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(teacher.id.to_string())
                .bind(&teacher.profile.email)
                .bind(teacher.profile.slug.as_deref())
                .bind(teacher.password_hash.as_deref())
                .bind(&document)
                .bind(to_canonical(teacher.created_at))
                .bind(to_canonical(teacher.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(teacher)
        }
    }

    fn get_by_id(
        &self,
        id: TeacherId,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        let email = email.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_EMAIL)
                .bind(email)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        let slug = slug.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_SLUG)
                .bind(slug)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn slug_exists(
        &self,
        slug: &str,
        except: Option<TeacherId>,
    ) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let pool = self.pool.clone();
        let slug = slug.to_string();
        async move {
            let exists: bool = sqlx::query_scalar(SLUG_EXISTS)
                .bind(slug)
                .bind(except.map(|id| id.to_string()))
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(exists)
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Teacher>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(
        &self,
        mut teacher: Teacher,
    ) -> impl Future<Output = Result<Teacher, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let document = serde_json::to_string(&teacher).map_err(StorageError::from)?;

            let stored: Option<Option<String>> = sqlx::query_scalar(UPDATE)
                .bind(&teacher.profile.email)
                .bind(teacher.profile.slug.as_deref())
                .bind(teacher.password_hash.as_deref())
                .bind(&document)
                .bind(to_canonical(teacher.updated_at))
                .bind(teacher.id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some(password_hash) = stored else {
                return Err(NotFoundError {
                    entity: "Teacher",
                    id: teacher.id.to_string(),
                }
                .into());
            };
            teacher.password_hash = password_hash;
            Ok(teacher)
        }
    }

    fn delete(&self, id: TeacherId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_BY_ID)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }
}
