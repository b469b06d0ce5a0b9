//! Booking service: appointments, slot conflicts and lesson status sync.
//!
//! Creating, deleting or re-statusing a booking ends by re-counting the
//! lesson's bookings and applying the rules in [`tutorhub_domain::booking`].

use std::cmp::Ordering;
use std::collections::HashMap;

use tutorhub_domain::booking::{
    Booking, BookingInput, BookingStatus, LessonBookingTally, lesson_status_after_change,
    lesson_status_after_create, lesson_status_after_delete, parse_status,
};
use tutorhub_domain::error::{ConflictError, NotFoundError, TutorHubError, ValidationError};
use tutorhub_domain::id::{BookingId, LessonId, StudentId, TeacherId};
use tutorhub_domain::lesson::{Lesson, LessonStatus};
use tutorhub_domain::query::{Page, PageRequest, paginate};
use tutorhub_domain::summary::{BookingDetail, BookingView, LessonSummary, PersonSummary};
use tutorhub_domain::time::Timestamp;

use crate::ports::{BookingRepository, LessonRepository, StudentRepository, TeacherRepository};
use crate::services::lesson_service::lesson_not_found;

/// Sort keys accepted when listing bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingSort {
    #[default]
    ScheduledAt,
    CreatedAt,
    UpdatedAt,
}

impl BookingSort {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("created_at") => Self::CreatedAt,
            Some("updated_at") => Self::UpdatedAt,
            _ => Self::ScheduledAt,
        }
    }

    fn compare(self, a: &Booking, b: &Booking) -> Ordering {
        match self {
            Self::ScheduledAt => a.scheduled_at.cmp(&b.scheduled_at),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

/// Search criteria for booking listings. `from` and `to` are inclusive.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub student: Option<StudentId>,
    pub teacher: Option<TeacherId>,
    pub lesson: Option<LessonId>,
    pub status: Option<BookingStatus>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl BookingFilter {
    fn matches(&self, booking: &Booking) -> bool {
        self.student.is_none_or(|s| booking.student_id == s)
            && self.teacher.is_none_or(|t| booking.teacher_id == t)
            && self.lesson.is_none_or(|l| booking.lesson_id == l)
            && self.status.is_none_or(|s| booking.status == s)
            && self.from.is_none_or(|from| booking.scheduled_at >= from)
            && self.to.is_none_or(|to| booking.scheduled_at <= to)
    }
}

fn not_found(id: BookingId) -> TutorHubError {
    NotFoundError {
        entity: "Booking",
        id: id.to_string(),
    }
    .into()
}

/// Application service for bookings.
pub struct BookingService<B, S, T, L> {
    bookings: B,
    students: S,
    teachers: T,
    lessons: L,
}

impl<B, S, T, L> BookingService<B, S, T, L>
where
    B: BookingRepository,
    S: StudentRepository,
    T: TeacherRepository,
    L: LessonRepository,
{
    pub fn new(bookings: B, students: S, teachers: T, lessons: L) -> Self {
        Self {
            bookings,
            students,
            teachers,
            lessons,
        }
    }

    /// Book a lesson slot.
    ///
    /// # Errors
    ///
    /// - [`TutorHubError::Validation`] for missing or malformed fields and for
    ///   a lesson that belongs to another teacher.
    /// - [`TutorHubError::NotFound`] when the student, teacher or lesson does
    ///   not exist.
    /// - [`ConflictError::TeacherSchedule`] / [`ConflictError::StudentSchedule`]
    ///   when an active booking already holds the instant, whatever status the
    ///   new booking carries.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_booking(&self, input: BookingInput) -> Result<Booking, TutorHubError> {
        input.require_all()?;
        let booking = input.validate()?.into_booking()?;

        let lesson = self.check_references(&booking).await?;
        self.check_slots(&booking).await?;

        let booking = self.bookings.create(booking).await?;
        tracing::info!(
            booking_id = %booking.id,
            lesson_id = %booking.lesson_id,
            scheduled_at = %booking.scheduled_at,
            "booking created"
        );
        if let Some(next) = lesson_status_after_create(lesson.status) {
            self.set_lesson_status(lesson, next).await?;
        }
        Ok(booking)
    }

    /// Look up a booking without enrichment.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown id.
    pub async fn get_booking(&self, id: BookingId) -> Result<Booking, TutorHubError> {
        self.bookings
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// A booking with its full student, teacher and lesson records.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown id.
    pub async fn get_booking_detail(&self, id: BookingId) -> Result<BookingDetail, TutorHubError> {
        let booking = self.get_booking(id).await?;
        let student = self.students.get_by_id(booking.student_id).await?;
        let teacher = self.teachers.get_by_id(booking.teacher_id).await?;
        let lesson = self.lessons.get_by_id(booking.lesson_id).await?;
        Ok(BookingDetail {
            booking,
            student,
            teacher,
            lesson,
        })
    }

    /// Search bookings, enriched with contact and lesson summaries.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn list_bookings(
        &self,
        filter: &BookingFilter,
        sort: BookingSort,
        page: &PageRequest,
    ) -> Result<Page<BookingView>, TutorHubError> {
        let all = self.bookings.get_all().await?;
        let matching: Vec<Booking> = all.into_iter().filter(|b| filter.matches(b)).collect();
        let page = paginate(matching, page, |a, b| sort.compare(a, b));

        let mut students: HashMap<StudentId, Option<PersonSummary>> = HashMap::new();
        let mut teachers: HashMap<TeacherId, Option<PersonSummary>> = HashMap::new();
        let mut lessons: HashMap<LessonId, Option<LessonSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(page.data.len());
        for booking in page.data {
            if !students.contains_key(&booking.student_id) {
                let summary = self
                    .students
                    .get_by_id(booking.student_id)
                    .await?
                    .map(|s| PersonSummary::student(&s).with_phone(s.profile.phone.as_ref()));
                students.insert(booking.student_id, summary);
            }
            if !teachers.contains_key(&booking.teacher_id) {
                let summary = self
                    .teachers
                    .get_by_id(booking.teacher_id)
                    .await?
                    .map(|t| PersonSummary::teacher(&t).with_phone(t.profile.phone.as_ref()));
                teachers.insert(booking.teacher_id, summary);
            }
            if !lessons.contains_key(&booking.lesson_id) {
                let summary = self
                    .lessons
                    .get_by_id(booking.lesson_id)
                    .await?
                    .map(|l| LessonSummary::described(&l));
                lessons.insert(booking.lesson_id, summary);
            }
            views.push(BookingView {
                student: students.get(&booking.student_id).cloned().flatten(),
                teacher: teachers.get(&booking.teacher_id).cloned().flatten(),
                lesson: lessons.get(&booking.lesson_id).cloned().flatten(),
                booking,
            });
        }
        Ok(Page {
            data: views,
            total: page.total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Apply a partial update. No lesson sync runs here.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NoFieldsToUpdate`] for an empty body.
    /// - [`TutorHubError::NotFound`] for an unknown booking, or when the
    ///   updated booking references a student, teacher or lesson that does not
    ///   exist.
    /// - [`ValidationError::LessonTeacherMismatch`] when the lesson belongs to
    ///   another teacher.
    /// - A schedule conflict when an active booking moves onto a taken slot.
    #[tracing::instrument(skip(self, input))]
    pub async fn update_booking(
        &self,
        id: BookingId,
        input: BookingInput,
    ) -> Result<Booking, TutorHubError> {
        let fields = input.validate()?;
        if fields.is_empty() {
            return Err(ValidationError::NoFieldsToUpdate.into());
        }
        let mut booking = self.get_booking(id).await?;
        fields.apply(&mut booking);
        self.check_references(&booking).await?;
        if booking.status.is_active() {
            self.check_slots(&booking).await?;
        }
        self.bookings.update(booking).await
    }

    /// Delete a booking and reopen its lesson when nothing active is left.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown id.
    #[tracing::instrument(skip(self))]
    pub async fn delete_booking(&self, id: BookingId) -> Result<(), TutorHubError> {
        let booking = self.get_booking(id).await?;
        if !self.bookings.delete(id).await? {
            return Err(not_found(id));
        }
        let Some(lesson) = self.lessons.get_by_id(booking.lesson_id).await? else {
            return Ok(());
        };
        let tally = self.tally(booking.lesson_id).await?;
        if let Some(next) = lesson_status_after_delete(lesson.status, tally) {
            self.set_lesson_status(lesson, next).await?;
        }
        Ok(())
    }

    /// Move a booking to a new status and cascade to its lesson.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] or
    /// [`ValidationError::InvalidStatus`] for the status and
    /// [`TutorHubError::NotFound`] for an unknown booking.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: BookingId,
        status: Option<&str>,
    ) -> Result<Booking, TutorHubError> {
        let next = parse_status(status)?;
        let mut booking = self.get_booking(id).await?;
        let previous = booking.status;
        booking.set_status(next);
        if next.is_active() && !previous.is_active() {
            self.check_slots(&booking).await?;
        }
        let booking = self.bookings.update(booking).await?;

        if let Some(lesson) = self.lessons.get_by_id(booking.lesson_id).await? {
            let tally = self.tally(booking.lesson_id).await?;
            if let Some(target) = lesson_status_after_change(lesson.status, previous, next, tally) {
                self.set_lesson_status(lesson, target).await?;
            }
        }
        Ok(booking)
    }

    async fn tally(&self, lesson: LessonId) -> Result<LessonBookingTally, TutorHubError> {
        let bookings = self.bookings.list_by_lesson(lesson).await?;
        Ok(LessonBookingTally::from_statuses(
            bookings.into_iter().map(|b| b.status),
        ))
    }

    async fn set_lesson_status(
        &self,
        mut lesson: Lesson,
        status: LessonStatus,
    ) -> Result<(), TutorHubError> {
        tracing::info!(lesson_id = %lesson.id, from = %lesson.status, to = %status, "lesson status synced");
        lesson.set_status(status);
        self.lessons.update(lesson).await?;
        Ok(())
    }

    /// The booking's lesson, once every reference is known to exist and the
    /// lesson belongs to the booked teacher.
    async fn check_references(&self, booking: &Booking) -> Result<Lesson, TutorHubError> {
        self.require_student(booking.student_id).await?;
        self.require_teacher(booking.teacher_id).await?;
        let lesson = self.require_lesson(booking.lesson_id).await?;
        if lesson.teacher_id != booking.teacher_id {
            return Err(ValidationError::LessonTeacherMismatch.into());
        }
        Ok(lesson)
    }

    async fn check_slots(&self, booking: &Booking) -> Result<(), TutorHubError> {
        let teacher_clash = self
            .bookings
            .find_active_for_teacher(booking.teacher_id, booking.scheduled_at)
            .await?;
        if teacher_clash.is_some_and(|other| other.id != booking.id) {
            return Err(ConflictError::TeacherSchedule.into());
        }
        let student_clash = self
            .bookings
            .find_active_for_student(booking.student_id, booking.scheduled_at)
            .await?;
        if student_clash.is_some_and(|other| other.id != booking.id) {
            return Err(ConflictError::StudentSchedule.into());
        }
        Ok(())
    }

    async fn require_student(&self, id: StudentId) -> Result<(), TutorHubError> {
        match self.students.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(NotFoundError {
                entity: "Student",
                id: id.to_string(),
            }
            .into()),
        }
    }

    async fn require_teacher(&self, id: TeacherId) -> Result<(), TutorHubError> {
        match self.teachers.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(NotFoundError {
                entity: "Teacher",
                id: id.to_string(),
            }
            .into()),
        }
    }

    async fn require_lesson(&self, id: LessonId) -> Result<Lesson, TutorHubError> {
        self.lessons
            .get_by_id(id)
            .await?
            .ok_or_else(|| lesson_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryBookings, InMemoryLessons, InMemoryStudents, InMemoryTeachers};
    use serde_json::json;
    use tutorhub_domain::profile::Profile;
    use tutorhub_domain::student::Student;
    use tutorhub_domain::teacher::Teacher;
    use tutorhub_domain::time::now;

    type Service = BookingService<InMemoryBookings, InMemoryStudents, InMemoryTeachers, InMemoryLessons>;

    struct Fixture {
        svc: Service,
        lessons: InMemoryLessons,
        teachers: InMemoryTeachers,
        student: StudentId,
        other_student: StudentId,
        teacher: TeacherId,
        lesson: LessonId,
    }

    fn fixture() -> Fixture {
        let students = InMemoryStudents::default();
        let teachers = InMemoryTeachers::default();
        let lessons = InMemoryLessons::default();

        let mut student = Student::new(Profile::new("Bia", "bia@example.com").unwrap());
        student.profile.phone = Some("555-0101".to_string());
        let other = Student::new(Profile::new("Caio", "caio@example.com").unwrap());
        let teacher = Teacher::new(Profile::new("Rui", "rui@example.com").unwrap());
        let ts = now();
        let lesson = Lesson {
            id: LessonId::new(),
            title: "Guitar".to_string(),
            description: Some("Chords".to_string()),
            price: Some(50.0),
            category_id: None,
            teacher_id: teacher.id,
            status: LessonStatus::Available,
            created_at: ts,
            updated_at: ts,
        };

        let f = Fixture {
            svc: BookingService::new(
                InMemoryBookings::default(),
                students.clone(),
                teachers.clone(),
                lessons.clone(),
            ),
            lessons: lessons.clone(),
            teachers: teachers.clone(),
            student: student.id,
            other_student: other.id,
            teacher: teacher.id,
            lesson: lesson.id,
        };
        students.store.lock().unwrap().insert(student.id, student);
        students.store.lock().unwrap().insert(other.id, other);
        teachers.store.lock().unwrap().insert(teacher.id, teacher);
        lessons.store.lock().unwrap().insert(lesson.id, lesson);
        f
    }

    fn input(f: &Fixture, student: StudentId, at: &str) -> BookingInput {
        serde_json::from_value(json!({
            "student_id": student.to_string(),
            "teacher_id": f.teacher.to_string(),
            "lesson_id": f.lesson.to_string(),
            "scheduled_at": at,
        }))
        .unwrap()
    }

    fn lesson_status(f: &Fixture) -> LessonStatus {
        f.lessons.store.lock().unwrap()[&f.lesson].status
    }

    #[tokio::test]
    async fn should_schedule_lesson_when_first_booking_is_created() {
        let f = fixture();
        let booking = f
            .svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Scheduled);
        assert_eq!(lesson_status(&f), LessonStatus::Scheduled);
    }

    #[tokio::test]
    async fn should_report_teacher_conflict_when_slot_is_taken() {
        let f = fixture();
        f.svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();
        let result = f
            .svc
            .create_booking(input(&f, f.other_student, "2025-03-10T14:00:00Z"))
            .await;
        assert!(matches!(
            result,
            Err(TutorHubError::Conflict(ConflictError::TeacherSchedule))
        ));
    }

    #[tokio::test]
    async fn should_allow_slot_when_previous_booking_was_cancelled() {
        let f = fixture();
        let first = f
            .svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();
        f.svc.change_status(first.id, Some("cancelled")).await.unwrap();
        let second = f
            .svc
            .create_booking(input(&f, f.other_student, "2025-03-10T14:00:00Z"))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn should_require_every_field_when_creating() {
        let f = fixture();
        let result = f
            .svc
            .create_booking(serde_json::from_value(json!({"student_id": f.student.to_string()})).unwrap())
            .await;
        assert!(matches!(
            result,
            Err(TutorHubError::Validation(ValidationError::MissingFields(fields))) if fields.len() == 4
        ));
    }

    #[tokio::test]
    async fn should_reject_lesson_of_another_teacher() {
        let f = fixture();
        let stranger = Teacher::new(Profile::new("Lia", "lia@example.com").unwrap());
        let stranger_id = stranger.id;
        f.teachers.store.lock().unwrap().insert(stranger_id, stranger);

        let body: BookingInput = serde_json::from_value(json!({
            "student_id": f.student.to_string(),
            "teacher_id": stranger_id.to_string(),
            "lesson_id": f.lesson.to_string(),
            "scheduled_at": "2025-03-10T14:00:00Z",
        }))
        .unwrap();
        let result = f.svc.create_booking(body).await;
        assert!(matches!(
            result,
            Err(TutorHubError::Validation(ValidationError::LessonTeacherMismatch))
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_student_is_unknown() {
        let f = fixture();
        let result = f
            .svc
            .create_booking(input(&f, StudentId::new(), "2025-03-10T14:00:00Z"))
            .await;
        assert!(matches!(result, Err(TutorHubError::NotFound(e)) if e.entity == "Student"));
    }

    #[tokio::test]
    async fn should_reopen_lesson_when_only_booking_is_cancelled() {
        let f = fixture();
        let booking = f
            .svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();
        f.svc.change_status(booking.id, Some("CANCELLED")).await.unwrap();
        assert_eq!(lesson_status(&f), LessonStatus::Available);

        f.svc.change_status(booking.id, Some("confirmed")).await.unwrap();
        assert_eq!(lesson_status(&f), LessonStatus::Scheduled);
    }

    #[tokio::test]
    async fn should_complete_lesson_when_every_booking_is_completed() {
        let f = fixture();
        let a = f
            .svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();
        let b = f
            .svc
            .create_booking(input(&f, f.other_student, "2025-03-11T14:00:00Z"))
            .await
            .unwrap();

        f.svc.change_status(a.id, Some("completed")).await.unwrap();
        assert_eq!(lesson_status(&f), LessonStatus::Scheduled);
        f.svc.change_status(b.id, Some("completed")).await.unwrap();
        assert_eq!(lesson_status(&f), LessonStatus::Completed);
    }

    #[tokio::test]
    async fn should_reopen_lesson_when_last_booking_is_deleted() {
        let f = fixture();
        let booking = f
            .svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();
        f.svc.delete_booking(booking.id).await.unwrap();
        assert_eq!(lesson_status(&f), LessonStatus::Available);
        assert!(matches!(
            f.svc.delete_booking(booking.id).await,
            Err(TutorHubError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_require_status_when_changing_it() {
        let f = fixture();
        let result = f.svc.change_status(BookingId::new(), None).await;
        assert!(matches!(
            result,
            Err(TutorHubError::Validation(ValidationError::MissingFields(_)))
        ));
    }

    #[tokio::test]
    async fn should_enrich_and_filter_listing() {
        let f = fixture();
        f.svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();
        f.svc
            .create_booking(input(&f, f.other_student, "2025-04-10T14:00:00Z"))
            .await
            .unwrap();

        let filter = BookingFilter {
            to: tutorhub_domain::time::from_rfc3339("2025-03-31T00:00:00Z"),
            ..BookingFilter::default()
        };
        let page = f
            .svc
            .list_bookings(&filter, BookingSort::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        let view = &page.data[0];
        assert_eq!(
            view.student.as_ref().unwrap().phone.as_deref(),
            Some("555-0101")
        );
        assert_eq!(view.lesson.as_ref().unwrap().title, "Guitar");
    }

    #[tokio::test]
    async fn should_reject_empty_update() {
        let f = fixture();
        let result = f
            .svc
            .update_booking(BookingId::new(), BookingInput::default())
            .await;
        assert!(matches!(
            result,
            Err(TutorHubError::Validation(ValidationError::NoFieldsToUpdate))
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_update_points_at_unknown_records() {
        let f = fixture();
        let booking = f
            .svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();

        let body: BookingInput =
            serde_json::from_value(json!({"student_id": StudentId::new().to_string()})).unwrap();
        let result = f.svc.update_booking(booking.id, body).await;
        assert!(matches!(result, Err(TutorHubError::NotFound(e)) if e.entity == "Student"));

        let body: BookingInput =
            serde_json::from_value(json!({"lesson_id": LessonId::new().to_string()})).unwrap();
        let result = f.svc.update_booking(booking.id, body).await;
        assert!(matches!(result, Err(TutorHubError::NotFound(e)) if e.entity == "Lesson"));

        let stored = f.svc.get_booking(booking.id).await.unwrap();
        assert_eq!(stored.student_id, f.student);
        assert_eq!(stored.lesson_id, f.lesson);
    }

    #[tokio::test]
    async fn should_reject_update_moving_booking_to_another_teacher() {
        let f = fixture();
        let stranger = Teacher::new(Profile::new("Lia", "lia@example.com").unwrap());
        let stranger_id = stranger.id;
        f.teachers.store.lock().unwrap().insert(stranger_id, stranger);
        let booking = f
            .svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();

        let body: BookingInput =
            serde_json::from_value(json!({"teacher_id": stranger_id.to_string()})).unwrap();
        let result = f.svc.update_booking(booking.id, body).await;
        assert!(matches!(
            result,
            Err(TutorHubError::Validation(ValidationError::LessonTeacherMismatch))
        ));
    }

    #[tokio::test]
    async fn should_report_conflict_when_cancelled_booking_is_created_on_taken_slot() {
        let f = fixture();
        f.svc
            .create_booking(input(&f, f.student, "2025-03-10T14:00:00Z"))
            .await
            .unwrap();

        let body: BookingInput = serde_json::from_value(json!({
            "student_id": f.other_student.to_string(),
            "teacher_id": f.teacher.to_string(),
            "lesson_id": f.lesson.to_string(),
            "scheduled_at": "2025-03-10T14:00:00Z",
            "status": "cancelled",
        }))
        .unwrap();
        let result = f.svc.create_booking(body).await;
        assert!(matches!(
            result,
            Err(TutorHubError::Conflict(ConflictError::TeacherSchedule))
        ));
    }
}
