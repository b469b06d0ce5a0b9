//! `SQLite` implementation of [`BookingRepository`].
//!
//! Slot exclusivity is enforced by two partial unique indexes over active
//! bookings, so a racing insert still fails with a schedule conflict.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use tutorhub_app::ports::BookingRepository;
use tutorhub_domain::booking::Booking;
use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::id::{BookingId, LessonId, StudentId, TeacherId};
use tutorhub_domain::time::{Timestamp, to_canonical};

use crate::error::StorageError;
use crate::row;

struct Wrapper(Booking);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Booking> {
        value.map(|w| w.0)
    }

    fn all(rows: Vec<Self>) -> Vec<Booking> {
        rows.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Booking {
            id: row::parsed(row, "id")?,
            student_id: row::parsed(row, "student_id")?,
            teacher_id: row::parsed(row, "teacher_id")?,
            lesson_id: row::parsed(row, "lesson_id")?,
            scheduled_at: row::timestamp(row, "scheduled_at")?,
            status: row::parsed(row, "status")?,
            notes: row.try_get("notes")?,
            created_at: row::timestamp(row, "created_at")?,
            updated_at: row::timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO bookings (id, student_id, teacher_id, lesson_id, scheduled_at, status, notes, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM bookings WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM bookings ORDER BY scheduled_at";
const SELECT_BY_LESSON: &str = "SELECT * FROM bookings WHERE lesson_id = ? ORDER BY scheduled_at";
const SELECT_ACTIVE_FOR_TEACHER: &str = r"
    SELECT * FROM bookings
    WHERE teacher_id = ? AND scheduled_at = ? AND status IN ('scheduled', 'confirmed')
    LIMIT 1
";
const SELECT_ACTIVE_FOR_STUDENT: &str = r"
    SELECT * FROM bookings
    WHERE student_id = ? AND scheduled_at = ? AND status IN ('scheduled', 'confirmed')
    LIMIT 1
";

const UPDATE: &str = r"
    UPDATE bookings
    SET student_id = ?, teacher_id = ?, lesson_id = ?, scheduled_at = ?, status = ?, notes = ?,
        updated_at = ?
    WHERE id = ?
";

const DELETE_BY_ID: &str = "DELETE FROM bookings WHERE id = ?";

/// `SQLite`-backed booking repository.
#[derive(Clone)]
pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn find_active(
        &self,
        query: &'static str,
        owner: String,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(query)
                .bind(owner)
                .bind(to_canonical(at))
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }
}

impl BookingRepository for SqliteBookingRepository {
    fn create(&self, booking: Booking) -> impl Future<Output = Result<Booking, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT)
                .bind(booking.id.to_string())
                .bind(booking.student_id.to_string())
                .bind(booking.teacher_id.to_string())
                .bind(booking.lesson_id.to_string())
                .bind(to_canonical(booking.scheduled_at))
                .bind(booking.status.as_str())
                .bind(booking.notes.as_deref())
                .bind(to_canonical(booking.created_at))
                .bind(to_canonical(booking.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(booking)
        }
    }

    fn get_by_id(
        &self,
        id: BookingId,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send {
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

    fn get_all(&self) -> impl Future<Output = Result<Vec<Booking>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::all(rows))
        }
    }

    fn list_by_lesson(
        &self,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Vec<Booking>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_LESSON)
                .bind(lesson.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::all(rows))
        }
    }

    fn find_active_for_teacher(
        &self,
        teacher: TeacherId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send {
        self.find_active(SELECT_ACTIVE_FOR_TEACHER, teacher.to_string(), at)
    }

    fn find_active_for_student(
        &self,
        student: StudentId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send {
        self.find_active(SELECT_ACTIVE_FOR_STUDENT, student.to_string(), at)
    }

    fn update(&self, booking: Booking) -> impl Future<Output = Result<Booking, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(booking.student_id.to_string())
                .bind(booking.teacher_id.to_string())
                .bind(booking.lesson_id.to_string())
                .bind(to_canonical(booking.scheduled_at))
                .bind(booking.status.as_str())
                .bind(booking.notes.as_deref())
                .bind(to_canonical(booking.updated_at))
                .bind(booking.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(booking)
        }
    }

    fn delete(&self, id: BookingId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
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
