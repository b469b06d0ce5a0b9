//! Rating repository port.

use std::future::Future;

use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::id::{LessonId, RatingId, StudentId, TeacherId};
use tutorhub_domain::rating::Rating;

/// Repository for persisting and querying [`Rating`]s.
///
/// At most one rating may exist per (student, lesson) pair; a second insert
/// fails with [`ConflictError::AlreadyRated`](tutorhub_domain::error::ConflictError::AlreadyRated).
pub trait RatingRepository {
    fn create(&self, rating: Rating) -> impl Future<Output = Result<Rating, TutorHubError>> + Send;

    fn get_by_id(
        &self,
        id: RatingId,
    ) -> impl Future<Output = Result<Option<Rating>, TutorHubError>> + Send;

    fn find_by_student_lesson(
        &self,
        student: StudentId,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Option<Rating>, TutorHubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send;

    fn list_by_teacher(
        &self,
        teacher: TeacherId,
    ) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send;

    fn list_by_lesson(
        &self,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send;

    fn update(&self, rating: Rating) -> impl Future<Output = Result<Rating, TutorHubError>> + Send;

    fn delete(&self, id: RatingId) -> impl Future<Output = Result<bool, TutorHubError>> + Send;
}
