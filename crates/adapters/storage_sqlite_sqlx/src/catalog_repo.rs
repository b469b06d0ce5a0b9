//! `SQLite` implementations of [`CategoryRepository`] and [`LessonRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use tutorhub_app::ports::{CategoryRepository, LessonRepository};
use tutorhub_domain::category::Category;
use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::id::{CategoryId, LessonId};
use tutorhub_domain::lesson::{Lesson, LessonStatusChange};
use tutorhub_domain::time::to_canonical;

use crate::error::StorageError;
use crate::row;

struct CategoryRow(Category);

impl<'r> FromRow<'r, SqliteRow> for CategoryRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Category {
            id: row::parsed(row, "id")?,
            name: row.try_get("name")?,
            created_at: row::timestamp(row, "created_at")?,
            updated_at: row::timestamp(row, "updated_at")?,
        }))
    }
}

struct LessonRow(Lesson);

impl<'r> FromRow<'r, SqliteRow> for LessonRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Lesson {
            id: row::parsed(row, "id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            category_id: row::maybe_parsed(row, "category_id")?,
            teacher_id: row::parsed(row, "teacher_id")?,
            status: row::parsed(row, "status")?,
            created_at: row::timestamp(row, "created_at")?,
            updated_at: row::timestamp(row, "updated_at")?,
        }))
    }
}

const INSERT_CATEGORY: &str =
    "INSERT INTO categories (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)";
const SELECT_CATEGORY_BY_ID: &str = "SELECT * FROM categories WHERE id = ?";
const SELECT_CATEGORY_BY_NAME: &str = "SELECT * FROM categories WHERE name = ? COLLATE NOCASE";
const SELECT_CATEGORIES: &str = "SELECT * FROM categories ORDER BY created_at";
const UPDATE_CATEGORY: &str = "UPDATE categories SET name = ?, updated_at = ? WHERE id = ?";
const DELETE_CATEGORY: &str = "DELETE FROM categories WHERE id = ?";

const INSERT_LESSON: &str = r"
    INSERT INTO lessons (id, title, description, price, category_id, teacher_id, status, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";
const SELECT_LESSON_BY_ID: &str = "SELECT * FROM lessons WHERE id = ?";
const SELECT_LESSONS: &str = "SELECT * FROM lessons ORDER BY created_at";
const SELECT_LESSONS_BY_CATEGORY: &str =
    "SELECT * FROM lessons WHERE category_id = ? ORDER BY created_at";
const COUNT_LESSONS_BY_CATEGORY: &str = "SELECT COUNT(*) FROM lessons WHERE category_id = ?";
const UPDATE_LESSON: &str = r"
    UPDATE lessons
    SET title = ?, description = ?, price = ?, category_id = ?, teacher_id = ?, status = ?,
        updated_at = ?
    WHERE id = ?
";
const DELETE_LESSON: &str = "DELETE FROM lessons WHERE id = ?";
const INSERT_STATUS_CHANGE: &str = r"
    INSERT INTO lesson_status_changes (lesson_id, new_status, teacher_id, changed_at)
    VALUES (?, ?, ?, ?)
";

/// `SQLite`-backed category repository.
#[derive(Clone)]
pub struct SqliteCategoryRepository {
    pool: SqlitePool,
}

impl SqliteCategoryRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CategoryRepository for SqliteCategoryRepository {
    fn create(
        &self,
        category: Category,
    ) -> impl Future<Output = Result<Category, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT_CATEGORY)
                .bind(category.id.to_string())
                .bind(&category.name)
                .bind(to_canonical(category.created_at))
                .bind(to_canonical(category.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(category)
        }
    }

    fn get_by_id(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<CategoryRow> = sqlx::query_as(SELECT_CATEGORY_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|r| r.0))
        }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Category>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        let name = name.trim().to_string();
        async move {
            let row: Option<CategoryRow> = sqlx::query_as(SELECT_CATEGORY_BY_NAME)
                .bind(name)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|r| r.0))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Category>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<CategoryRow> = sqlx::query_as(SELECT_CATEGORIES)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|r| r.0).collect())
        }
    }

    fn update(
        &self,
        category: Category,
    ) -> impl Future<Output = Result<Category, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE_CATEGORY)
                .bind(&category.name)
                .bind(to_canonical(category.updated_at))
                .bind(category.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(category)
        }
    }

    fn delete(&self, id: CategoryId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_CATEGORY)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }
}

/// `SQLite`-backed lesson repository.
#[derive(Clone)]
pub struct SqliteLessonRepository {
    pool: SqlitePool,
}

impl SqliteLessonRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl LessonRepository for SqliteLessonRepository {
    fn create(&self, lesson: Lesson) -> impl Future<Output = Result<Lesson, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT_LESSON)
                .bind(lesson.id.to_string())
                .bind(&lesson.title)
                .bind(lesson.description.as_deref())
                .bind(lesson.price)
                .bind(lesson.category_id.map(|id| id.to_string()))
                .bind(lesson.teacher_id.to_string())
                .bind(lesson.status.as_str())
                .bind(to_canonical(lesson.created_at))
                .bind(to_canonical(lesson.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(lesson)
        }
    }

    fn get_by_id(
        &self,
        id: LessonId,
    ) -> impl Future<Output = Result<Option<Lesson>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<LessonRow> = sqlx::query_as(SELECT_LESSON_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|r| r.0))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Lesson>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<LessonRow> = sqlx::query_as(SELECT_LESSONS)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|r| r.0).collect())
        }
    }

    fn list_by_category(
        &self,
        category: CategoryId,
    ) -> impl Future<Output = Result<Vec<Lesson>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<LessonRow> = sqlx::query_as(SELECT_LESSONS_BY_CATEGORY)
                .bind(category.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|r| r.0).collect())
        }
    }

    fn count_by_category(
        &self,
        category: CategoryId,
    ) -> impl Future<Output = Result<usize, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let count: i64 = sqlx::query_scalar(COUNT_LESSONS_BY_CATEGORY)
                .bind(category.to_string())
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row::count(count))
        }
    }

    fn update(&self, lesson: Lesson) -> impl Future<Output = Result<Lesson, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE_LESSON)
                .bind(&lesson.title)
                .bind(lesson.description.as_deref())
                .bind(lesson.price)
                .bind(lesson.category_id.map(|id| id.to_string()))
                .bind(lesson.teacher_id.to_string())
                .bind(lesson.status.as_str())
                .bind(to_canonical(lesson.updated_at))
                .bind(lesson.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(lesson)
        }
    }

    fn delete(&self, id: LessonId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(DELETE_LESSON)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() > 0)
        }
    }

    fn record_status_change(
        &self,
        change: LessonStatusChange,
    ) -> impl Future<Output = Result<(), TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(INSERT_STATUS_CHANGE)
                .bind(change.lesson_id.to_string())
                .bind(change.new_status.as_str())
                .bind(change.teacher_id.map(|id| id.to_string()))
                .bind(to_canonical(change.changed_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
