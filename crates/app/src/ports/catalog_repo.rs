//! Catalog repository ports: categories and the lessons filed under them.

use std::future::Future;

use tutorhub_domain::category::Category;
use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::id::{CategoryId, LessonId};
use tutorhub_domain::lesson::{Lesson, LessonStatusChange};

/// Repository for persisting and querying [`Category`]s.
pub trait CategoryRepository {
    fn create(
        &self,
        category: Category,
    ) -> impl Future<Output = Result<Category, TutorHubError>> + Send;

    fn get_by_id(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, TutorHubError>> + Send;

    /// Case-insensitive lookup by name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Category>, TutorHubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Category>, TutorHubError>> + Send;

    fn update(
        &self,
        category: Category,
    ) -> impl Future<Output = Result<Category, TutorHubError>> + Send;

    fn delete(&self, id: CategoryId) -> impl Future<Output = Result<bool, TutorHubError>> + Send;
}

/// Repository for persisting and querying [`Lesson`]s.
pub trait LessonRepository {
    fn create(&self, lesson: Lesson) -> impl Future<Output = Result<Lesson, TutorHubError>> + Send;

    fn get_by_id(
        &self,
        id: LessonId,
    ) -> impl Future<Output = Result<Option<Lesson>, TutorHubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Lesson>, TutorHubError>> + Send;

    fn list_by_category(
        &self,
        category: CategoryId,
    ) -> impl Future<Output = Result<Vec<Lesson>, TutorHubError>> + Send;

    fn count_by_category(
        &self,
        category: CategoryId,
    ) -> impl Future<Output = Result<usize, TutorHubError>> + Send;

    fn update(&self, lesson: Lesson) -> impl Future<Output = Result<Lesson, TutorHubError>> + Send;

    fn delete(&self, id: LessonId) -> impl Future<Output = Result<bool, TutorHubError>> + Send;

    /// Append an entry to the lesson status audit log.
    fn record_status_change(
        &self,
        change: LessonStatusChange,
    ) -> impl Future<Output = Result<(), TutorHubError>> + Send;
}
