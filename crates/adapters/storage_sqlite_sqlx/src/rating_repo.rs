//! `SQLite` implementation of [`RatingRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use tutorhub_app::ports::RatingRepository;
use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::id::{LessonId, RatingId, StudentId, TeacherId};
use tutorhub_domain::rating::Rating;
use tutorhub_domain::time::to_canonical;

use crate::error::StorageError;
use crate::row;

struct Wrapper(Rating);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Rating> {
        value.map(|w| w.0)
    }

    fn all(rows: Vec<Self>) -> Vec<Rating> {
        rows.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Rating {
            id: row::parsed(row, "id")?,
            student_id: row::parsed(row, "student_id")?,
            lesson_id: row::parsed(row, "lesson_id")?,
            teacher_id: row::parsed(row, "teacher_id")?,
            score: row.try_get("score")?,
            text: row.try_get("text")?,
            created_at: row::timestamp(row, "created_at")?,
            updated_at: row::timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO ratings (id, student_id, lesson_id, teacher_id, score, text, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM ratings WHERE id = ?";
const SELECT_BY_STUDENT_LESSON: &str =
    "SELECT * FROM ratings WHERE student_id = ? AND lesson_id = ?";
const SELECT_ALL: &str = "SELECT * FROM ratings ORDER BY created_at";
const SELECT_BY_TEACHER: &str = "SELECT * FROM ratings WHERE teacher_id = ? ORDER BY created_at";
const SELECT_BY_LESSON: &str = "SELECT * FROM ratings WHERE lesson_id = ? ORDER BY created_at";
const UPDATE: &str = "UPDATE ratings SET score = ?, text = ?, updated_at = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM ratings WHERE id = ?";

/// `SQLite`-backed rating repository.
#[derive(Clone)]
pub struct SqliteRatingRepository {
    pool: SqlitePool,
}

impl SqliteRatingRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn list_where(
        &self,
        query: &'static str,
        key: String,
    ) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(query)
                .bind(key)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::all(rows))
        }
    }
}

impl RatingRepository for SqliteRatingRepository {
    fn create(&self, rating: Rating) -> impl Future<Output = Result<Rating, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(rating.id.to_string())
                .bind(rating.student_id.to_string())
                .bind(rating.lesson_id.to_string())
                .bind(rating.teacher_id.to_string())
                .bind(rating.score)
                .bind(rating.text.as_deref())
                .bind(to_canonical(rating.created_at))
                .bind(to_canonical(rating.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rating)
        }
    }

    fn get_by_id(
        &self,
        id: RatingId,
    ) -> impl Future<Output = Result<Option<Rating>, TutorHubError>> + Send {
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

    fn find_by_student_lesson(
        &self,
        student: StudentId,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Option<Rating>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_STUDENT_LESSON)
                .bind(student.to_string())
                .bind(lesson.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::all(rows))
        }
    }

    fn list_by_teacher(
        &self,
        teacher: TeacherId,
    ) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send {
        self.list_where(SELECT_BY_TEACHER, teacher.to_string())
    }

    fn list_by_lesson(
        &self,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send {
        self.list_where(SELECT_BY_LESSON, lesson.to_string())
    }

    fn update(&self, rating: Rating) -> impl Future<Output = Result<Rating, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(rating.score)
                .bind(rating.text.as_deref())
                .bind(to_canonical(rating.updated_at))
                .bind(rating.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rating)
        }
    }

    fn delete(&self, id: RatingId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
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
