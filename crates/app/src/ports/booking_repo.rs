//! Booking repository port.

use std::future::Future;

use tutorhub_domain::booking::Booking;
use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::id::{BookingId, LessonId, StudentId, TeacherId};
use tutorhub_domain::time::Timestamp;

/// Repository for persisting and querying [`Booking`]s.
///
/// Implementations must reject a second *active* booking for the same
/// teacher or the same student at the same instant, reporting
/// [`ConflictError::TeacherSchedule`](tutorhub_domain::error::ConflictError::TeacherSchedule)
/// or [`ConflictError::StudentSchedule`](tutorhub_domain::error::ConflictError::StudentSchedule).
pub trait BookingRepository {
    fn create(&self, booking: Booking) -> impl Future<Output = Result<Booking, TutorHubError>> + Send;

    fn get_by_id(
        &self,
        id: BookingId,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Booking>, TutorHubError>> + Send;

    fn list_by_lesson(
        &self,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Vec<Booking>, TutorHubError>> + Send;

    /// Active booking of `teacher` at exactly `at`, if any.
    fn find_active_for_teacher(
        &self,
        teacher: TeacherId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send;

    /// Active booking of `student` at exactly `at`, if any.
    fn find_active_for_student(
        &self,
        student: StudentId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send;

    fn update(&self, booking: Booking) -> impl Future<Output = Result<Booking, TutorHubError>> + Send;

    fn delete(&self, id: BookingId) -> impl Future<Output = Result<bool, TutorHubError>> + Send;
}
