//! `SQLite` implementation of [`StudentRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use tutorhub_app::ports::StudentRepository;
use tutorhub_domain::error::{NotFoundError, TutorHubError};
use tutorhub_domain::id::StudentId;
use tutorhub_domain::student::Student;
use tutorhub_domain::time::to_canonical;

use crate::error::StorageError;
use crate::row;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Student);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Student> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let mut student: Student = row::json(row, "document")?;
        student.password_hash = row.try_get("password_hash")?;
        Ok(Self(student))
    }
}

const INSERT: &str = r"
    INSERT INTO students (id, email, slug, password_hash, document, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM students WHERE id = ?";
const SELECT_BY_EMAIL: &str = "SELECT * FROM students WHERE email = ?";
const SELECT_BY_SLUG: &str = "SELECT * FROM students WHERE slug = ?";
const SELECT_ALL: &str = "SELECT * FROM students ORDER BY created_at";
const SLUG_EXISTS: &str =
    "SELECT EXISTS(SELECT 1 FROM students WHERE slug = ? AND id IS NOT ?)";
const COUNT: &str = "SELECT COUNT(*) FROM students";

const UPDATE: &str = r"
    UPDATE students
    SET email = ?, slug = ?, password_hash = COALESCE(?, password_hash), document = ?,
        updated_at = ?
    WHERE id = ?
    RETURNING password_hash
";

const DELETE_BY_ID: &str = "DELETE FROM students WHERE id = ?";

/// `SQLite`-backed student repository.
#[derive(Clone)]
pub struct SqliteStudentRepository {
    pool: SqlitePool,
}

impl SqliteStudentRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl StudentRepository for SqliteStudentRepository {
    fn create(&self, student: Student) -> impl Future<Output = Result<Student, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let document = serde_json::to_string(&student).map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(student.id.to_string())
                .bind(&student.profile.email)
                .bind(student.profile.slug.as_deref())
                .bind(student.password_hash.as_deref())
                .bind(&document)
                .bind(to_canonical(student.created_at))
                .bind(to_canonical(student.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(student)
        }
    }

    fn get_by_id(
        &self,
        id: StudentId,
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send {
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
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send {
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
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send {
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
        except: Option<StudentId>,
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

    fn get_all(&self) -> impl Future<Output = Result<Vec<Student>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn count(&self) -> impl Future<Output = Result<usize, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let count: i64 = sqlx::query_scalar(COUNT)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row::count(count))
        }
    }

    fn update(
        &self,
        mut student: Student,
    ) -> impl Future<Output = Result<Student, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let document = serde_json::to_string(&student).map_err(StorageError::from)?;

            let stored: Option<Option<String>> = sqlx::query_scalar(UPDATE)
                .bind(&student.profile.email)
                .bind(student.profile.slug.as_deref())
                .bind(student.password_hash.as_deref())
                .bind(&document)
                .bind(to_canonical(student.updated_at))
                .bind(student.id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            let Some(password_hash) = stored else {
                return Err(NotFoundError {
                    entity: "Student",
                    id: student.id.to_string(),
                }
                .into());
            };
            student.password_hash = password_hash;
            Ok(student)
        }
    }

    fn delete(&self, id: StudentId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
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
