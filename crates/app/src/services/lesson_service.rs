//! Lesson service: publishing, searching and manual status changes.

use std::cmp::Ordering;
use std::collections::HashMap;

use tutorhub_domain::error::{NotFoundError, TutorHubError, ValidationError};
use tutorhub_domain::id::{CategoryId, LessonId, TeacherId, parse_id};
use tutorhub_domain::lesson::{
    Lesson, LessonFields, LessonInput, LessonStatus, LessonStatusChange, parse_manual_status,
};
use tutorhub_domain::query::{Page, PageRequest, TextPattern, cmp_f64, paginate};
use tutorhub_domain::summary::{CategorySummary, LessonView, PersonSummary};
use tutorhub_domain::time::now;

use crate::ports::{CategoryRepository, LessonRepository, TeacherRepository};

/// Sort keys accepted when listing lessons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LessonSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Price,
}

impl LessonSort {
    /// Parse a `sort` parameter; unknown keys fall back to `created_at`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("updated_at") => Self::UpdatedAt,
            Some("title") => Self::Title,
            Some("price") => Self::Price,
            _ => Self::CreatedAt,
        }
    }

    pub(crate) fn compare(self, a: &Lesson, b: &Lesson) -> Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            Self::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::Price => cmp_f64(a.price, b.price),
        }
    }
}

/// Search criteria for lesson listings.
#[derive(Debug, Clone, Default)]
pub struct LessonFilter {
    pub q: Option<TextPattern>,
    pub category: Option<CategoryId>,
    pub teacher: Option<TeacherId>,
    pub status: Option<LessonStatus>,
}

impl LessonFilter {
    pub(crate) fn matches(&self, lesson: &Lesson) -> bool {
        self.q.as_ref().is_none_or(|q| q.any(lesson.search_texts()))
            && self.category.is_none_or(|c| lesson.category_id == Some(c))
            && self.teacher.is_none_or(|t| lesson.teacher_id == t)
            && self.status.is_none_or(|s| lesson.status == s)
    }
}

pub(crate) fn lesson_not_found(id: LessonId) -> TutorHubError {
    NotFoundError {
        entity: "Lesson",
        id: id.to_string(),
    }
    .into()
}

/// Attach teacher and category summaries to `lessons`, fetching each
/// referenced record once.
pub(crate) async fn enrich_lessons<T, C>(
    lessons: Vec<Lesson>,
    teachers: &T,
    categories: &C,
) -> Result<Vec<LessonView>, TutorHubError>
where
    T: TeacherRepository,
    C: CategoryRepository,
{
    let mut teacher_cache: HashMap<TeacherId, Option<PersonSummary>> = HashMap::new();
    let mut category_cache: HashMap<CategoryId, Option<CategorySummary>> = HashMap::new();
    let mut views = Vec::with_capacity(lessons.len());
    for lesson in lessons {
        let teacher = match teacher_cache.get(&lesson.teacher_id) {
            Some(cached) => cached.clone(),
            None => {
                let summary = teachers.get_by_id(lesson.teacher_id).await?.map(|t| {
                    PersonSummary::teacher(&t).with_bio(t.profile.bio.as_ref())
                });
                teacher_cache.insert(lesson.teacher_id, summary.clone());
                summary
            }
        };
        let category = match lesson.category_id {
            None => None,
            Some(id) => match category_cache.get(&id) {
                Some(cached) => cached.clone(),
                None => {
                    let summary = categories
                        .get_by_id(id)
                        .await?
                        .map(|c| CategorySummary::from(&c));
                    category_cache.insert(id, summary.clone());
                    summary
                }
            },
        };
        views.push(LessonView {
            lesson,
            teacher,
            category,
        });
    }
    Ok(views)
}

/// Application service for lessons.
pub struct LessonService<L, T, C> {
    lessons: L,
    teachers: T,
    categories: C,
}

impl<L, T, C> LessonService<L, T, C>
where
    L: LessonRepository,
    T: TeacherRepository,
    C: CategoryRepository,
{
    pub fn new(lessons: L, teachers: T, categories: C) -> Self {
        Self {
            lessons,
            teachers,
            categories,
        }
    }

    /// Publish a lesson. It starts `available`.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::Validation`] for missing or malformed fields
    /// and [`TutorHubError::NotFound`] when the teacher or category does not
    /// exist.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_lesson(&self, input: LessonInput) -> Result<Lesson, TutorHubError> {
        let fields = input.validate()?;
        self.check_references(&fields).await?;
        let lesson = fields.into_lesson()?;
        tracing::info!(lesson_id = %lesson.id, teacher_id = %lesson.teacher_id, "lesson published");
        self.lessons.create(lesson).await
    }

    /// Look up a lesson without enrichment.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when no lesson with `id` exists.
    pub async fn get_lesson(&self, id: LessonId) -> Result<Lesson, TutorHubError> {
        self.lessons
            .get_by_id(id)
            .await?
            .ok_or_else(|| lesson_not_found(id))
    }

    /// Look up a lesson with its teacher and category.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when no lesson with `id` exists.
    pub async fn get_lesson_view(&self, id: LessonId) -> Result<LessonView, TutorHubError> {
        let lesson = self.get_lesson(id).await?;
        let mut views = enrich_lessons(vec![lesson], &self.teachers, &self.categories).await?;
        let mut view = views.pop().ok_or_else(|| lesson_not_found(id))?;
        if let Some(summary) = view.teacher.take() {
            let background = self
                .teachers
                .get_by_id(view.lesson.teacher_id)
                .await?
                .and_then(|t| t.academic_background);
            view.teacher = Some(summary.with_academic_background(background.as_ref()));
        }
        Ok(view)
    }

    /// Search lessons.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn list_lessons(
        &self,
        filter: &LessonFilter,
        sort: LessonSort,
        page: &PageRequest,
    ) -> Result<Page<LessonView>, TutorHubError> {
        let all = self.lessons.get_all().await?;
        let matching: Vec<Lesson> = all.into_iter().filter(|l| filter.matches(l)).collect();
        let page = paginate(matching, page, |a, b| sort.compare(a, b));
        let views = enrich_lessons(page.data, &self.teachers, &self.categories).await?;
        Ok(Page {
            data: views,
            total: page.total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Apply a partial update; referenced teacher and category must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoFieldsToUpdate`] for an empty body and
    /// [`TutorHubError::NotFound`] for unknown references.
    #[tracing::instrument(skip(self, input))]
    pub async fn update_lesson(
        &self,
        id: LessonId,
        input: LessonInput,
    ) -> Result<Lesson, TutorHubError> {
        let fields = input.validate()?;
        if fields.is_empty() {
            return Err(ValidationError::NoFieldsToUpdate.into());
        }
        let mut lesson = self.get_lesson(id).await?;
        self.check_references(&fields).await?;
        fields.apply(&mut lesson);
        self.lessons.update(lesson).await
    }

    /// Delete a lesson.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when nothing was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_lesson(&self, id: LessonId) -> Result<(), TutorHubError> {
        if self.lessons.delete(id).await? {
            Ok(())
        } else {
            Err(lesson_not_found(id))
        }
    }

    /// Set a lesson's status by hand and record the change.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidStatus`] for unknown or sync-only
    /// statuses and [`TutorHubError::NotFound`] for an unknown lesson.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: LessonId,
        status: Option<&str>,
        teacher_id: Option<&str>,
    ) -> Result<Lesson, TutorHubError> {
        let status = parse_manual_status(status)?;
        let teacher_id: Option<TeacherId> = teacher_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|raw| parse_id(raw, "teacher_id"))
            .transpose()?;

        let mut lesson = self.get_lesson(id).await?;
        lesson.set_status(status);
        let lesson = self.lessons.update(lesson).await?;
        self.lessons
            .record_status_change(LessonStatusChange {
                lesson_id: id,
                new_status: status,
                teacher_id,
                changed_at: now(),
            })
            .await?;
        tracing::info!(lesson_id = %id, status = %status, "lesson status changed");
        Ok(lesson)
    }

    async fn check_references(&self, fields: &LessonFields) -> Result<(), TutorHubError> {
        if let Some(teacher_id) = fields.teacher_id {
            if self.teachers.get_by_id(teacher_id).await?.is_none() {
                return Err(NotFoundError {
                    entity: "Teacher",
                    id: teacher_id.to_string(),
                }
                .into());
            }
        }
        if let Some(category_id) = fields.category_id {
            if self.categories.get_by_id(category_id).await?.is_none() {
                return Err(NotFoundError {
                    entity: "Category",
                    id: category_id.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}
