//! Category service: CRUD for categories and their lesson listings.

use std::cmp::Ordering;

use tutorhub_domain::category::{Category, validate_name};
use tutorhub_domain::error::{ConflictError, NotFoundError, TutorHubError};
use tutorhub_domain::id::CategoryId;
use tutorhub_domain::query::{Page, PageRequest, TextPattern, paginate};
use tutorhub_domain::summary::{CategoryView, LessonSummary, LessonView};

use crate::ports::{CategoryRepository, LessonRepository, TeacherRepository};
use crate::services::lesson_service::{LessonFilter, LessonSort, enrich_lessons};

/// Lessons shown inline on a category detail.
const PREVIEW_LESSONS: usize = 5;

/// Sort keys accepted when listing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategorySort {
    #[default]
    CreatedAt,
    Name,
}

impl CategorySort {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("name") => Self::Name,
            _ => Self::CreatedAt,
        }
    }

    fn compare(self, a: &Category, b: &Category) -> Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    }
}

fn not_found(id: CategoryId) -> TutorHubError {
    NotFoundError {
        entity: "Category",
        id: id.to_string(),
    }
    .into()
}

/// Application service for categories.
pub struct CategoryService<C, L, T> {
    categories: C,
    lessons: L,
    teachers: T,
}

impl<C, L, T> CategoryService<C, L, T>
where
    C: CategoryRepository,
    L: LessonRepository,
    T: TeacherRepository,
{
    pub fn new(categories: C, lessons: L, teachers: T) -> Self {
        Self {
            categories,
            lessons,
            teachers,
        }
    }

    /// Create a category with a unique (case-insensitive) name.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::Validation`] for a missing or blank name and
    /// [`ConflictError::CategoryNameTaken`] for a duplicate.
    #[tracing::instrument(skip(self))]
    pub async fn create_category(&self, name: Option<&str>) -> Result<Category, TutorHubError> {
        let category = Category::new(name)?;
        if self.categories.find_by_name(&category.name).await?.is_some() {
            return Err(ConflictError::CategoryNameTaken.into());
        }
        self.categories.create(category).await
    }

    /// Look up a category by id.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when no category with `id` exists.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, TutorHubError> {
        self.categories
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Category detail with its lesson count and newest lessons.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when no category with `id` exists.
    pub async fn get_category_view(&self, id: CategoryId) -> Result<CategoryView, TutorHubError> {
        let category = self.get_category(id).await?;
        let mut lessons = self.lessons.list_by_category(id).await?;
        lessons.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let lesson_count = lessons.len();
        let preview = lessons
            .iter()
            .take(PREVIEW_LESSONS)
            .map(LessonSummary::listed)
            .collect();
        Ok(CategoryView {
            category,
            lesson_count,
            lessons: Some(preview),
        })
    }

    /// List categories, each with its lesson count.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn list_categories(
        &self,
        q: Option<&TextPattern>,
        sort: CategorySort,
        page: &PageRequest,
    ) -> Result<Page<CategoryView>, TutorHubError> {
        let all = self.categories.get_all().await?;
        let matching: Vec<Category> = all
            .into_iter()
            .filter(|c| q.is_none_or(|q| q.is_match(&c.name)))
            .collect();
        let page = paginate(matching, page, |a, b| sort.compare(a, b));

        let mut views = Vec::with_capacity(page.data.len());
        for category in page.data {
            let lesson_count = self.lessons.count_by_category(category.id).await?;
            views.push(CategoryView {
                category,
                lesson_count,
                lessons: None,
            });
        }
        Ok(Page {
            data: views,
            total: page.total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::Validation`] for a bad name,
    /// [`TutorHubError::NotFound`] for an unknown id and
    /// [`ConflictError::CategoryNameTaken`] when another category has the name.
    #[tracing::instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        name: Option<&str>,
    ) -> Result<Category, TutorHubError> {
        let name = validate_name(name)?;
        let mut category = self.get_category(id).await?;
        if let Some(existing) = self.categories.find_by_name(&name).await? {
            if existing.id != id {
                return Err(ConflictError::CategoryNameTaken.into());
            }
        }
        category.rename(Some(&name))?;
        self.categories.update(category).await
    }

    /// Delete a category that no lesson references.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictError::CategoryInUse`] when lessons still reference
    /// it and [`TutorHubError::NotFound`] when nothing was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), TutorHubError> {
        let lessons = self.lessons.count_by_category(id).await?;
        if lessons > 0 {
            return Err(ConflictError::CategoryInUse { lessons }.into());
        }
        if self.categories.delete(id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// Lessons filed under a category, enriched with teacher summaries.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when no category with `id` exists.
    pub async fn category_lessons(
        &self,
        id: CategoryId,
        filter: &LessonFilter,
        page: &PageRequest,
    ) -> Result<(Category, Page<LessonView>), TutorHubError> {
        let category = self.get_category(id).await?;
        let lessons = self.lessons.list_by_category(id).await?;
        let matching: Vec<_> = lessons.into_iter().filter(|l| filter.matches(l)).collect();
        let page = paginate(matching, page, |a, b| LessonSort::CreatedAt.compare(a, b));
        let views = enrich_lessons(page.data, &self.teachers, &self.categories).await?;
        Ok((
            category,
            Page {
                data: views,
                total: page.total,
                page: page.page,
                limit: page.limit,
            },
        ))
    }
}
