//! Student service: registration, search and profile maintenance.

use std::cmp::Ordering;

use tutorhub_domain::error::{ConflictError, NotFoundError, TutorHubError, ValidationError};
use tutorhub_domain::id::{StudentId, UserId};
use tutorhub_domain::identity::Identity;
use tutorhub_domain::profile::{Profile, Visibility};
use tutorhub_domain::query::{Page, PageRequest, TextPattern, cmp_f64, eq_ignore_case, paginate};
use tutorhub_domain::slug;
use tutorhub_domain::student::{NewStudent, Student, StudentPatch};

use crate::ports::{PasswordHasher, StudentRepository};

/// Sort keys accepted when listing profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    HourlyRate,
    AverageRating,
}

impl ProfileSort {
    /// Parse a `sort` parameter; unknown keys fall back to `created_at`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("updated_at") => Self::UpdatedAt,
            Some("name") => Self::Name,
            Some("hourly_rate") => Self::HourlyRate,
            Some("average_rating") => Self::AverageRating,
            _ => Self::CreatedAt,
        }
    }
}

/// Search criteria for [`StudentService::list_students`].
#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub q: Option<TextPattern>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub teaches: Option<TextPattern>,
    pub learns: Option<TextPattern>,
    pub specialization: Option<TextPattern>,
    pub modality: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    /// Include private profiles (`visibility=all`).
    pub include_private: bool,
}

impl StudentFilter {
    fn matches(&self, student: &Student) -> bool {
        let p = &student.profile;
        if !self.include_private && !p.is_public() {
            return false;
        }
        if let Some(q) = &self.q {
            let extra = student.wants_to_learn.iter().map(String::as_str);
            if !q.any(p.search_texts().chain(extra)) {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if !eq_ignore_case(city, p.city()) {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if !eq_ignore_case(state, p.state()) {
                return false;
            }
        }
        if let Some(teaches) = &self.teaches {
            if !teaches.any(p.wants_to_teach.iter().map(String::as_str)) {
                return false;
            }
        }
        if let Some(learns) = &self.learns {
            if !learns.any(student.wants_to_learn.iter().map(String::as_str)) {
                return false;
            }
        }
        if let Some(spec) = &self.specialization {
            if !spec.any(p.specializations.iter().map(String::as_str)) {
                return false;
            }
        }
        if let Some(modality) = &self.modality {
            if !p
                .modalities
                .iter()
                .any(|m| eq_ignore_case(modality, Some(m)))
            {
                return false;
            }
        }
        let rate_ok = match (p.hourly_rate, self.min_price, self.max_price) {
            (_, None, None) => true,
            (None, _, _) => false,
            (Some(rate), min, max) => {
                min.is_none_or(|min| rate >= min) && max.is_none_or(|max| rate <= max)
            }
        };
        if !rate_ok {
            return false;
        }
        self.min_rating
            .is_none_or(|min| student.average_rating.is_some_and(|avg| avg >= min))
    }
}

fn compare(sort: ProfileSort, a: &Student, b: &Student) -> Ordering {
    match sort {
        ProfileSort::CreatedAt => a.created_at.cmp(&b.created_at),
        ProfileSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        ProfileSort::Name => a.profile.name.to_lowercase().cmp(&b.profile.name.to_lowercase()),
        ProfileSort::HourlyRate => cmp_f64(a.profile.hourly_rate, b.profile.hourly_rate),
        ProfileSort::AverageRating => cmp_f64(a.average_rating, b.average_rating),
    }
}

fn not_found(id: StudentId) -> TutorHubError {
    NotFoundError {
        entity: "Student",
        id: id.to_string(),
    }
    .into()
}

/// Whether a profile was found or had to be provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Existing,
    Created,
}

/// Application service for student profiles.
pub struct StudentService<R, H> {
    repo: R,
    hasher: H,
}

impl<R: StudentRepository, H: PasswordHasher> StudentService<R, H> {
    /// Create a new service backed by the given repository and hasher.
    pub fn new(repo: R, hasher: H) -> Self {
        Self { repo, hasher }
    }

    /// Register a student.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] without a name or email,
    /// [`ConflictError::EmailTaken`] for a registered email, or a storage
    /// error.
    #[tracing::instrument(skip(self, input))]
    pub async fn create_student(&self, input: NewStudent) -> Result<Student, TutorHubError> {
        let NewStudent { email, mut patch } = input;
        let profile = Profile::new(
            patch.profile.name.as_deref().unwrap_or_default(),
            email.as_deref().unwrap_or_default(),
        )?;
        if self.repo.find_by_email(&profile.email).await?.is_some() {
            return Err(ConflictError::EmailTaken.into());
        }

        let password = patch.profile.take_password();
        let requested_slug = patch.profile.slug.take();
        let mut student = Student::new(profile);
        patch.apply(&mut student);

        let base = slug::slugify(requested_slug.as_deref().unwrap_or(&student.profile.name));
        student.profile.slug = Some(self.unique_slug(&base, None).await?);
        if let Some(password) = password {
            student.password_hash = Some(self.hasher.hash(&password).await?);
        }

        tracing::info!(student_id = %student.id, "student registered");
        self.repo.create(student).await
    }

    /// Look up a student by id.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when no student with `id` exists.
    pub async fn get_student(&self, id: StudentId) -> Result<Student, TutorHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    /// Search students.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_students(
        &self,
        filter: &StudentFilter,
        sort: ProfileSort,
        page: &PageRequest,
    ) -> Result<Page<Student>, TutorHubError> {
        let all = self.repo.get_all().await?;
        let matching: Vec<Student> = all.into_iter().filter(|s| filter.matches(s)).collect();
        Ok(paginate(matching, page, |a, b| compare(sort, a, b)))
    }

    /// Fetch a profile, provisioning a skeleton when the caller asks for
    /// their own missing profile.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when the profile is missing and
    /// belongs to somebody else.
    pub async fn get_or_provision(
        &self,
        caller: &Identity,
        id: StudentId,
    ) -> Result<(Student, Provisioned), TutorHubError> {
        if let Some(student) = self.repo.get_by_id(id).await? {
            return Ok((student, Provisioned::Existing));
        }
        let is_self = caller.user_id == UserId::from(id) && caller.require_student().is_ok();
        if !is_self {
            return Err(not_found(id));
        }
        let student = self.provision(caller).await?;
        Ok((student, Provisioned::Created))
    }

    /// The caller's own profile, provisioned from the token claims if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::Forbidden`] for teacher tokens.
    pub async fn me(&self, caller: &Identity) -> Result<Student, TutorHubError> {
        let id = caller.require_student()?;
        let (student, _) = self.get_or_provision(caller, id).await?;
        Ok(student)
    }

    /// Update the caller's own profile.
    ///
    /// # Errors
    ///
    /// See [`StudentService::me`] and [`StudentService::update_student`].
    pub async fn update_me(
        &self,
        caller: &Identity,
        patch: StudentPatch,
    ) -> Result<Student, TutorHubError> {
        let student = self.me(caller).await?;
        self.update_student(student.id, patch).await
    }

    /// Give the caller's profile a fresh unique slug and make it public.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when the caller has no profile.
    #[tracing::instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn publish_me(&self, caller: &Identity) -> Result<Student, TutorHubError> {
        let id = StudentId::from(caller.user_id);
        let mut student = self.get_student(id).await?;
        let source = student
            .profile
            .slug
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| student.profile.name.clone());
        let slug = self.unique_slug(&slug::slugify(&source), Some(id)).await?;
        student.profile.slug = Some(slug);
        student.profile.visibility = Visibility::Public;
        student.touch();
        self.repo.update(student).await
    }

    /// Public profile lookup by slug; private profiles are hidden.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when no public profile uses `slug`.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Student, TutorHubError> {
        self.repo
            .find_by_slug(slug)
            .await?
            .filter(|s| s.profile.is_public())
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Student",
                    id: slug.to_string(),
                }
                .into()
            })
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoFieldsToUpdate`] for an empty patch,
    /// [`TutorHubError::NotFound`] for an unknown id, or a storage error.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_student(
        &self,
        id: StudentId,
        mut patch: StudentPatch,
    ) -> Result<Student, TutorHubError> {
        let password = patch.profile.take_password();
        let requested_slug = patch.profile.slug.take();
        if !patch.has_changes() && password.is_none() && requested_slug.is_none() {
            return Err(ValidationError::NoFieldsToUpdate.into());
        }

        let mut student = self.get_student(id).await?;
        patch.apply(&mut student);
        if let Some(requested) = requested_slug {
            let base = slug::slugify(&requested);
            student.profile.slug = Some(self.unique_slug(&base, Some(id)).await?);
        }
        if let Some(password) = password {
            student.password_hash = Some(self.hasher.hash(&password).await?);
        }
        student.touch();
        self.repo.update(student).await
    }

    /// Replace the avatar URL.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] for an unknown id.
    pub async fn set_avatar(&self, id: StudentId, url: String) -> Result<Student, TutorHubError> {
        let mut student = self.get_student(id).await?;
        student.profile.avatar_url = Some(url);
        student.touch();
        self.repo.update(student).await
    }

    /// Delete a student.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when nothing was deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_student(&self, id: StudentId) -> Result<(), TutorHubError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    /// Endorse one of a student's skills.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySkill`] or [`TutorHubError::NotFound`].
    pub async fn endorse(&self, id: StudentId, skill: &str) -> Result<Student, TutorHubError> {
        let mut student = self.get_student(id).await?;
        student.profile.endorse(skill)?;
        student.touch();
        self.repo.update(student).await
    }

    /// Leave a review on a student's profile and return the new average.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScoreOutOfRange`] or [`TutorHubError::NotFound`].
    pub async fn review(
        &self,
        id: StudentId,
        score: u8,
        comment: Option<String>,
        author: Option<UserId>,
    ) -> Result<f64, TutorHubError> {
        let mut student = self.get_student(id).await?;
        let average = student.add_review(score, comment, author)?;
        student.touch();
        self.repo.update(student).await?;
        Ok(average)
    }

    /// Number of students and one of them, for the database health check.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn health_check(&self) -> Result<(usize, Option<Student>), TutorHubError> {
        let count = self.repo.count().await?;
        let sample = if count > 0 {
            self.repo.get_all().await?.into_iter().next()
        } else {
            None
        };
        Ok((count, sample))
    }

    async fn provision(&self, caller: &Identity) -> Result<Student, TutorHubError> {
        let profile = Profile::new(&caller.name, &caller.email)?;
        let mut student = Student::with_id(caller.user_id.into(), profile);
        let base = slug::slugify(&student.profile.name);
        student.profile.slug = Some(self.unique_slug(&base, None).await?);
        tracing::info!(student_id = %student.id, "provisioned student profile from token");
        self.repo.create(student).await
    }

    async fn unique_slug(&self, base: &str, owner: Option<StudentId>) -> Result<String, TutorHubError> {
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
