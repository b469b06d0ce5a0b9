//! Rating service: students score lessons they attended.

use std::collections::HashMap;

use tutorhub_domain::booking::BookingStatus;
use tutorhub_domain::error::{ConflictError, NotFoundError, TutorHubError, ValidationError};
use tutorhub_domain::id::{LessonId, RatingId, StudentId, TeacherId};
use tutorhub_domain::query::{Page, PageRequest, paginate};
use tutorhub_domain::rating::{Rating, RatingInput, RatingPatch, RatingStats};
use tutorhub_domain::summary::{
    LessonSubject, LessonSummary, PersonSummary, RatingDetail, RatingView, SubjectStats,
    TeacherSubject,
};

use crate::ports::{
    BookingRepository, LessonRepository, RatingRepository, StudentRepository, TeacherRepository,
};
use crate::services::lesson_service::lesson_not_found;

/// Search criteria for rating listings; score bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct RatingFilter {
    pub student: Option<StudentId>,
    pub teacher: Option<TeacherId>,
    pub lesson: Option<LessonId>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

impl RatingFilter {
    fn matches(&self, rating: &Rating) -> bool {
        self.student.is_none_or(|s| rating.student_id == s)
            && self.teacher.is_none_or(|t| rating.teacher_id == t)
            && self.lesson.is_none_or(|l| rating.lesson_id == l)
            && self.min_score.is_none_or(|min| rating.score >= min)
            && self.max_score.is_none_or(|max| rating.score <= max)
    }
}

fn not_found(id: RatingId) -> TutorHubError {
    NotFoundError {
        entity: "Rating",
        id: id.to_string(),
    }
    .into()
}

fn teacher_not_found(id: TeacherId) -> TutorHubError {
    NotFoundError {
        entity: "Teacher",
        id: id.to_string(),
    }
    .into()
}

/// Application service for ratings.
pub struct RatingService<R, S, T, L, B> {
    ratings: R,
    students: S,
    teachers: T,
    lessons: L,
    bookings: B,
}

impl<R, S, T, L, B> RatingService<R, S, T, L, B>
where
    R: RatingRepository,
    S: StudentRepository,
    T: TeacherRepository,
    L: LessonRepository,
    B: BookingRepository,
{
    pub fn new(ratings: R, students: S, teachers: T, lessons: L, bookings: B) -> Self {
        Self {
            ratings,
            students,
            teachers,
            lessons,
            bookings,
        }
    }

    /// Rate a lesson the student completed with that teacher.
    ///
    /// # Errors
    ///
    /// - [`TutorHubError::Validation`] for missing fields, bad ids, an
    ///   out-of-range score, a lesson of another teacher, or a student with
    ///   no completed booking for the lesson.
    /// - [`TutorHubError::NotFound`] for unknown references.
    /// - [`ConflictError::AlreadyRated`] for a second rating of the lesson.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_rating(&self, input: RatingInput) -> Result<Rating, TutorHubError> {
        let new = input.validate()?;

        if self.students.get_by_id(new.student_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "Student",
                id: new.student_id.to_string(),
            }
            .into());
        }
        if self.teachers.get_by_id(new.teacher_id).await?.is_none() {
            return Err(teacher_not_found(new.teacher_id));
        }
        let lesson = self
            .lessons
            .get_by_id(new.lesson_id)
            .await?
            .ok_or_else(|| lesson_not_found(new.lesson_id))?;
        if lesson.teacher_id != new.teacher_id {
            return Err(ValidationError::LessonTeacherMismatch.into());
        }
        if self
            .ratings
            .find_by_student_lesson(new.student_id, new.lesson_id)
            .await?
            .is_some()
        {
            return Err(ConflictError::AlreadyRated.into());
        }

        let attended = self
            .bookings
            .list_by_lesson(new.lesson_id)
            .await?
            .iter()
            .any(|b| {
                b.student_id == new.student_id
                    && b.teacher_id == new.teacher_id
                    && b.status == BookingStatus::Completed
            });
        if !attended {
            return Err(ValidationError::DidNotAttend.into());
        }

        let rating = self.ratings.create(new.into_rating()).await?;
        tracing::info!(rating_id = %rating.id, lesson_id = %rating.lesson_id, score = rating.score, "lesson rated");
        Ok(rating)
    }

    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown id.
    pub async fn get_rating(&self, id: RatingId) -> Result<Rating, TutorHubError> {
        self.ratings
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// A rating with its full student, teacher and lesson records.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown id.
    pub async fn get_rating_detail(&self, id: RatingId) -> Result<RatingDetail, TutorHubError> {
        let rating = self.get_rating(id).await?;
        let student = self.students.get_by_id(rating.student_id).await?;
        let teacher = self.teachers.get_by_id(rating.teacher_id).await?;
        let lesson = self.lessons.get_by_id(rating.lesson_id).await?;
        Ok(RatingDetail {
            rating,
            student,
            teacher,
            lesson,
        })
    }

    /// Search ratings, newest first, with summaries of what they reference.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn list_ratings(
        &self,
        filter: &RatingFilter,
        page: &PageRequest,
    ) -> Result<Page<RatingView>, TutorHubError> {
        let all = self.ratings.get_all().await?;
        let matching: Vec<Rating> = all.into_iter().filter(|r| filter.matches(r)).collect();
        let page = paginate(matching, page, |a, b| a.created_at.cmp(&b.created_at));

        let mut students: HashMap<StudentId, Option<PersonSummary>> = HashMap::new();
        let mut teachers: HashMap<TeacherId, Option<PersonSummary>> = HashMap::new();
        let mut lessons: HashMap<LessonId, Option<LessonSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(page.data.len());
        for rating in page.data {
            if !students.contains_key(&rating.student_id) {
                let summary = self
                    .students
                    .get_by_id(rating.student_id)
                    .await?
                    .map(|s| PersonSummary::student(&s));
                students.insert(rating.student_id, summary);
            }
            if !teachers.contains_key(&rating.teacher_id) {
                let summary = self
                    .teachers
                    .get_by_id(rating.teacher_id)
                    .await?
                    .map(|t| PersonSummary::teacher(&t));
                teachers.insert(rating.teacher_id, summary);
            }
            if !lessons.contains_key(&rating.lesson_id) {
                let summary = self.lessons.get_by_id(rating.lesson_id).await?.map(|l| {
                    let mut summary = LessonSummary::described(&l);
                    summary.price = None;
                    summary
                });
                lessons.insert(rating.lesson_id, summary);
            }
            views.push(RatingView {
                student: students.get(&rating.student_id).cloned().flatten(),
                teacher: teachers.get(&rating.teacher_id).cloned().flatten(),
                lesson: lessons.get(&rating.lesson_id).cloned().flatten(),
                rating,
            });
        }
        Ok(Page {
            data: views,
            total: page.total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Change the score or text of a rating.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoFieldsToUpdate`],
    /// [`ValidationError::ScoreOutOfRange`] or [`TutorHubError::NotFound`].
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_rating(
        &self,
        id: RatingId,
        patch: RatingPatch,
    ) -> Result<Rating, TutorHubError> {
        let mut rating = self.get_rating(id).await?;
        patch.apply(&mut rating)?;
        self.ratings.update(rating).await
    }

    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when nothing was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rating(&self, id: RatingId) -> Result<(), TutorHubError> {
        if self.ratings.delete(id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// Score aggregate over every rating of a teacher.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown teacher.
    pub async fn teacher_stats(
        &self,
        id: TeacherId,
    ) -> Result<SubjectStats<TeacherSubject>, TutorHubError> {
        let teacher = self
            .teachers
            .get_by_id(id)
            .await?
            .ok_or_else(|| teacher_not_found(id))?;
        let ratings = self.ratings.list_by_teacher(id).await?;
        Ok(SubjectStats {
            stats: RatingStats::from_scores(ratings.iter().map(|r| r.score)),
            subject: TeacherSubject { teacher },
        })
    }

    /// Score aggregate over every rating of a lesson.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown lesson.
    pub async fn lesson_stats(
        &self,
        id: LessonId,
    ) -> Result<SubjectStats<LessonSubject>, TutorHubError> {
        let lesson = self
            .lessons
            .get_by_id(id)
            .await?
            .ok_or_else(|| lesson_not_found(id))?;
        let ratings = self.ratings.list_by_lesson(id).await?;
        Ok(SubjectStats {
            stats: RatingStats::from_scores(ratings.iter().map(|r| r.score)),
            subject: LessonSubject { lesson },
        })
    }
}
