//! Teacher service: registration, search and profile maintenance.

use std::cmp::Ordering;

use tutorhub_domain::error::{ConflictError, NotFoundError, TutorHubError, ValidationError};
use tutorhub_domain::id::TeacherId;
use tutorhub_domain::identity::Identity;
use tutorhub_domain::profile::Profile;
use tutorhub_domain::query::{Page, PageRequest, TextPattern, cmp_f64, eq_ignore_case, paginate};
use tutorhub_domain::slug;
use tutorhub_domain::teacher::{NewTeacher, Teacher, TeacherPatch, name_matches_words};

use crate::ports::{PasswordHasher, TeacherRepository};
use crate::services::student_service::ProfileSort;

/// Search criteria for [`TeacherService::list_teachers`].
#[derive(Debug, Clone, Default)]
pub struct TeacherFilter {
    pub q: Option<TextPattern>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub area: Option<String>,
    pub teaches: Option<TextPattern>,
}

impl TeacherFilter {
    fn matches(&self, teacher: &Teacher) -> bool {
        let p = &teacher.profile;
        self.q.as_ref().is_none_or(|q| q.any(teacher.search_texts()))
            && self.city.as_ref().is_none_or(|c| eq_ignore_case(c, p.city()))
            && self.state.as_ref().is_none_or(|s| eq_ignore_case(s, p.state()))
            && self
                .area
                .as_ref()
                .is_none_or(|a| eq_ignore_case(a, teacher.area.as_deref()))
            && self
                .teaches
                .as_ref()
                .is_none_or(|t| t.any(p.wants_to_teach.iter().map(String::as_str)))
    }
}

fn compare(sort: ProfileSort, a: &Teacher, b: &Teacher) -> Ordering {
    match sort {
        ProfileSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        ProfileSort::Name => a.profile.name.to_lowercase().cmp(&b.profile.name.to_lowercase()),
        ProfileSort::HourlyRate => cmp_f64(a.profile.hourly_rate, b.profile.hourly_rate),
        ProfileSort::CreatedAt | ProfileSort::AverageRating => a.created_at.cmp(&b.created_at),
    }
}

fn not_found(id: impl ToString) -> TutorHubError {
    NotFoundError {
        entity: "Teacher",
        id: id.to_string(),
    }
    .into()
}

/// Application service for teacher profiles.
pub struct TeacherService<R, H> {
    repo: R,
    hasher: H,
}

impl<R: TeacherRepository, H: PasswordHasher> TeacherService<R, H> {
    /// Create a new service backed by the given repository and hasher.
    pub fn new(repo: R, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// Register a teacher. New teachers are public with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] without a name or email,
    /// [`ConflictError::EmailTaken`] for a registered email, or a storage
    /// error.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_teacher(&self, input: NewTeacher) -> Result<Teacher, TutorHubError> {
        let NewTeacher { email, mut patch } = input;
        let profile = Profile::new(
            patch.profile.name.as_deref().unwrap_or_default(),
            email.as_deref().unwrap_or_default(),
        )?;
        if self.repo.find_by_email(&profile.email).await?.is_some() {
            return Err(ConflictError::EmailTaken.into());
        }

        let password = patch.profile.take_password();
        let requested_slug = patch.profile.slug.take();
        let mut teacher = Teacher::new(profile);
        patch.apply(&mut teacher);

        let base = slug::slugify(requested_slug.as_deref().unwrap_or(&teacher.profile.name));
        teacher.profile.slug = Some(self.unique_slug(&base, None).await?);
        if let Some(password) = password {
            teacher.password_hash = Some(self.hasher.hash(&password).await?);
        }

        tracing::info!(teacher_id = %teacher.id, "teacher registered");
        self.repo.create(teacher).await
    }

    /// Look up a teacher by id.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when no teacher with `id` exists.
    pub async fn get_teacher(&self, id: TeacherId) -> Result<Teacher, TutorHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    /// Search teachers.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_teachers(
        &self,
        filter: &TeacherFilter,
        sort: ProfileSort,
        page: &PageRequest,
    ) -> Result<Page<Teacher>, TutorHubError> {
        let all = self.repo.get_all().await?;
        let matching: Vec<Teacher> = all.into_iter().filter(|t| filter.matches(t)).collect();
        Ok(paginate(matching, page, |a, b| compare(sort, a, b)))
    }

    /// The caller's own teacher profile.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::Forbidden`] for student tokens and
    /// [`TutorHubError::NotFound`] when the profile does not exist.
    pub async fn me(&self, caller: &Identity) -> Result<Teacher, TutorHubError> {
        let id = caller.require_teacher()?;
        self.get_teacher(id).await
    }

    /// Update the caller's own profile.
    ///
    /// # Errors
    ///
    /// See [`TeacherService::me`] and [`TeacherService::update_teacher`].
    pub async fn update_me(
        &self,
        caller: &Identity,
        patch: TeacherPatch,
    ) -> Result<Teacher, TutorHubError> {
        let id = caller.require_teacher()?;
        self.update_teacher(id, patch).await
    }

    /// Apply a partial update. `email` and `balance` never change here.
    ///
    /// An explicit slug is slugified and made unique; otherwise a renamed
    /// teacher, or one without a slug, gets a slug derived from the name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoFieldsToUpdate`] for an empty patch,
    /// [`TutorHubError::NotFound`] for an unknown id, or a storage error.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_teacher(
        &self,
        id: TeacherId,
        mut patch: TeacherPatch,
    ) -> Result<Teacher, TutorHubError> {
        let password = patch.profile.take_password();
        let requested_slug = patch.profile.slug.take();
        if !patch.has_changes() && password.is_none() && requested_slug.is_none() {
            return Err(ValidationError::NoFieldsToUpdate.into());
        }

        let mut teacher = self.get_teacher(id).await?;
        let previous_name = teacher.profile.name.clone();
        patch.apply(&mut teacher);

        let slug_source = match requested_slug {
            Some(requested) => Some(requested),
            None if teacher.profile.name != previous_name => Some(teacher.profile.name.clone()),
            None if teacher.profile.slug.as_deref().is_none_or(str::is_empty) => {
                Some(teacher.profile.name.clone())
            }
            None => None,
        };
        if let Some(source) = slug_source {
            let base = slug::slugify(&source);
            teacher.profile.slug = Some(self.unique_slug(&base, Some(id)).await?);
        }
        if let Some(password) = password {
            teacher.password_hash = Some(self.hasher.hash(&password).await?);
        }
        teacher.touch();
        self.repo.update(teacher).await
    }

    /// Replace the avatar URL.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown id.
    pub async fn set_avatar(&self, id: TeacherId, url: String) -> Result<Teacher, TutorHubError> {
        let mut teacher = self.get_teacher(id).await?;
        teacher.profile.avatar_url = Some(url);
        teacher.touch();
        self.repo.update(teacher).await
    }

    /// Delete a teacher.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when nothing was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_teacher(&self, id: TeacherId) -> Result<(), TutorHubError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// Public profile lookup by slug.
    ///
    /// Falls back to the first public teacher whose name contains the slug
    /// words in order, then to a public teacher without a slug whose
    /// slugified name equals it. A match without a slug is assigned one.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when nothing matches.
    pub async fn get_by_slug(&self, requested: &str) -> Result<Teacher, TutorHubError> {
        let exact = self
            .repo
            .find_by_slug(requested)
            .await?
            .filter(|t| t.profile.is_public());
        let found = match exact {
            Some(teacher) => Some(teacher),
            None => self.fuzzy_slug_match(requested).await?,
        };
        let mut teacher = found.ok_or_else(|| not_found(requested))?;

        if teacher.profile.slug.as_deref().is_none_or(str::is_empty) {
            let base = slug::slugify(&teacher.profile.name);
            teacher.profile.slug = Some(self.unique_slug(&base, Some(teacher.id)).await?);
            tracing::debug!(teacher_id = %teacher.id, "assigned missing slug on lookup");
            teacher = self.repo.update(teacher).await?;
        }
        Ok(teacher)
    }

    async fn fuzzy_slug_match(&self, requested: &str) -> Result<Option<Teacher>, TutorHubError> {
        let mut public: Vec<Teacher> = self
            .repo
            .get_all()
            .await?
            .into_iter()
            .filter(|t| t.profile.is_public())
            .collect();
        public.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let words: Vec<&str> = requested
            .split(|c: char| c == '-' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .collect();
        if let Some(pos) = public
            .iter()
            .position(|t| name_matches_words(&t.profile.name, &words))
        {
            return Ok(Some(public.swap_remove(pos)));
        }

        let wanted = slug::slugify(requested);
        Ok(public.into_iter().find(|t| {
            t.profile.slug.as_deref().is_none_or(str::is_empty)
                && slug::slugify(&t.profile.name) == wanted
        }))
    }

    async fn unique_slug(&self, base: &str, owner: Option<TeacherId>) -> Result<String, TutorHubError> {
        let mut attempt = 1;
        loop {
            let candidate = slug::candidate(base, attempt);
            if !self.repo.slug_exists(&candidate, owner).await? {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryTeachers, PlainHasher};
    use serde_json::json;
    use tutorhub_domain::error::ForbiddenError;
    use tutorhub_domain::id::UserId;
    use tutorhub_domain::identity::UserKind;

    fn make_service() -> (TeacherService<InMemoryTeachers, PlainHasher>, InMemoryTeachers) {
        let repo = InMemoryTeachers::default();
        (TeacherService::new(repo.clone(), PlainHasher), repo)
    }

    fn new_teacher(body: serde_json::Value) -> NewTeacher {
        serde_json::from_value(body).unwrap()
    }

    fn patch(body: serde_json::Value) -> TeacherPatch {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn should_create_public_teacher_with_zero_balance() {
        let (svc, _) = make_service();
        let teacher = svc
            .create_teacher(new_teacher(json!({
                "name": "Rui Costa", "email": "rui@example.com",
                "hourly_rate": "90", "balance": 500
            })))
            .await
            .unwrap();
        assert!(teacher.profile.is_public());
        assert!(teacher.balance.abs() < f64::EPSILON);
        assert_eq!(teacher.profile.hourly_rate, Some(90.0));
        assert_eq!(teacher.profile.slug.as_deref(), Some("rui-costa"));
    }

    #[tokio::test]
    async fn should_rederive_slug_when_name_changes() {
        let (svc, _) = make_service();
        let rui = svc
            .create_teacher(new_teacher(json!({"name": "Rui", "email": "rui@example.com"})))
            .await
            .unwrap();
        let updated = svc
            .update_teacher(rui.id, patch(json!({"name": "Rui Barbosa"})))
            .await
            .unwrap();
        assert_eq!(updated.profile.slug.as_deref(), Some("rui-barbosa"));
    }

    #[tokio::test]
    async fn should_keep_slug_when_other_fields_change() {
        let (svc, _) = make_service();
        let rui = svc
            .create_teacher(new_teacher(json!({
                "name": "Rui", "email": "rui@example.com", "slug": "prof-rui"
            })))
            .await
            .unwrap();
        let updated = svc
            .update_teacher(rui.id, patch(json!({"bio": "Physics"})))
            .await
            .unwrap();
        assert_eq!(updated.profile.slug.as_deref(), Some("prof-rui"));
    }

    #[tokio::test]
    async fn should_ignore_balance_and_email_when_updating() {
        let (svc, _) = make_service();
        let rui = svc
            .create_teacher(new_teacher(json!({"name": "Rui", "email": "rui@example.com"})))
            .await
            .unwrap();
        let result = svc
            .update_teacher(rui.id, patch(json!({"balance": 10, "email": "x@y.z"})))
            .await;
        assert!(matches!(
            result,
            Err(TutorHubError::Validation(ValidationError::NoFieldsToUpdate))
        ));
    }

    #[tokio::test]
    async fn should_filter_by_area_ignoring_case() {
        let (svc, _) = make_service();
        svc.create_teacher(new_teacher(json!({
            "name": "Rui", "email": "rui@example.com", "area": "Exatas"
        })))
        .await
        .unwrap();
        svc.create_teacher(new_teacher(json!({
            "name": "Eva", "email": "eva@example.com", "area": "Humanas"
        })))
        .await
        .unwrap();
        let filter = TeacherFilter {
            area: Some("exatas".to_string()),
            ..TeacherFilter::default()
        };
        let page = svc
            .list_teachers(&filter, ProfileSort::Name, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].profile.name, "Rui");
    }

    #[tokio::test]
    async fn should_forbid_student_token_on_teacher_me() {
        let (svc, _) = make_service();
        let caller = Identity {
            user_id: UserId::new(),
            email: "s@example.com".to_string(),
            name: "S".to_string(),
            kind: UserKind::Student,
        };
        assert!(matches!(
            svc.me(&caller).await,
            Err(TutorHubError::Forbidden(ForbiddenError::WrongKind(
                UserKind::Teacher
            )))
        ));
    }

    #[tokio::test]
    async fn should_find_teacher_by_name_words_when_slug_unknown() {
        let (svc, _) = make_service();
        svc.create_teacher(new_teacher(json!({
            "name": "Maria da Silva", "email": "maria@example.com", "slug": "mds"
        })))
        .await
        .unwrap();
        let found = svc.get_by_slug("maria-silva").await.unwrap();
        assert_eq!(found.profile.name, "Maria da Silva");
    }

    #[tokio::test]
    async fn should_assign_slug_when_found_without_one() {
        let (svc, repo) = make_service();
        let mut legacy = Teacher::new(Profile::new("Joana Prado", "joana@example.com").unwrap());
        legacy.profile.slug = None;
        let id = legacy.id;
        repo.store.lock().unwrap().insert(id, legacy);

        let found = svc.get_by_slug("joana-prado").await.unwrap();
        assert_eq!(found.profile.slug.as_deref(), Some("joana-prado"));
        let stored = repo.store.lock().unwrap().get(&id).cloned().unwrap();
        assert_eq!(stored.profile.slug.as_deref(), Some("joana-prado"));
    }

    #[tokio::test]
    async fn should_not_expose_private_teacher_by_slug() {
        let (svc, _) = make_service();
        svc.create_teacher(new_teacher(json!({
            "name": "Rui", "email": "rui@example.com", "visibility": "private"
        })))
        .await
        .unwrap();
        assert!(matches!(
            svc.get_by_slug("rui").await,
            Err(TutorHubError::NotFound(_))
        ));
    }
}
