//! Profile repository ports: persistence for students and teachers.
//!
//! Implementations must enforce unique emails and slugs, reporting a
//! violation as [`ConflictError::EmailTaken`](tutorhub_domain::error::ConflictError::EmailTaken)
//! or [`ConflictError::SlugTaken`](tutorhub_domain::error::ConflictError::SlugTaken).

use std::future::Future;

use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::id::{StudentId, TeacherId};
use tutorhub_domain::student::Student;
use tutorhub_domain::teacher::Teacher;

/// Repository for persisting and querying [`Student`]s.
pub trait StudentRepository {
    fn create(&self, student: Student) -> impl Future<Output = Result<Student, TutorHubError>> + Send;

    fn get_by_id(
        &self,
        id: StudentId,
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send;

    /// Look up by normalised email, password hash included.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send;

    fn find_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send;

    /// Whether a student other than `except` already uses `slug`.
    fn slug_exists(
        &self,
        slug: &str,
        except: Option<StudentId>,
    ) -> impl Future<Output = Result<bool, TutorHubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Student>, TutorHubError>> + Send;

    fn count(&self) -> impl Future<Output = Result<usize, TutorHubError>> + Send;

    /// Replace the stored student. A `None` password hash keeps the stored one.
    fn update(&self, student: Student) -> impl Future<Output = Result<Student, TutorHubError>> + Send;

    /// Delete a student, returning whether one existed.
    fn delete(&self, id: StudentId) -> impl Future<Output = Result<bool, TutorHubError>> + Send;
}

/// Repository for persisting and querying [`Teacher`]s.
pub trait TeacherRepository {
    fn create(&self, teacher: Teacher) -> impl Future<Output = Result<Teacher, TutorHubError>> + Send;

    fn get_by_id(
        &self,
        id: TeacherId,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send;

    /// Look up by normalised email, password hash included.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send;

    fn find_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send;

    /// Whether a teacher other than `except` already uses `slug`.
    fn slug_exists(
        &self,
        slug: &str,
        except: Option<TeacherId>,
    ) -> impl Future<Output = Result<bool, TutorHubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Teacher>, TutorHubError>> + Send;

    /// Replace the stored teacher. A `None` password hash keeps the stored one.
    fn update(&self, teacher: Teacher) -> impl Future<Output = Result<Teacher, TutorHubError>> + Send;

    /// Delete a teacher, returning whether one existed.
    fn delete(&self, id: TeacherId) -> impl Future<Output = Result<bool, TutorHubError>> + Send;
}
