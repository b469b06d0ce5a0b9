//! Profile: the public-facing fields shared by students and teachers.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::input::{lenient_number, string_list, trimmed};

/// Whether a profile shows up in public listings and slug lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub street: Option<String>,
    pub complement: Option<String>,
}

/// A named skill and how many times it was endorsed.
///
/// Clients may send a bare string, which becomes a skill with no
/// endorsements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub name: String,
    pub endorsements: u32,
}

impl Skill {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endorsements: 0,
        }
    }
}

impl<'de> Deserialize<'de> for Skill {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Name(String),
            Full {
                name: String,
                #[serde(default)]
                endorsements: u32,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Name(name) => Self::new(name.trim()),
            Raw::Full { name, endorsements } => Self {
                name: name.trim().to_string(),
                endorsements,
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Availability {
    pub timezone: Option<String>,
    pub days: Vec<String>,
    pub hours: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: Option<String>,
    pub role: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: Option<String>,
    pub course: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub title: Option<String>,
    pub issuer: Option<String>,
    pub year: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
}

/// Fields every profile carries, flattened into [`Student`](crate::student::Student)
/// and [`Teacher`](crate::teacher::Teacher).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<Address>,
    pub slug: Option<String>,
    pub headline: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub specializations: Vec<String>,
    pub wants_to_teach: Vec<String>,
    pub skills: Vec<Skill>,
    pub modalities: Vec<String>,
    pub hourly_rate: Option<f64>,
    pub availability: Option<Availability>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub languages: Vec<String>,
    pub projects: Vec<Project>,
    pub links: BTreeMap<String, String>,
    pub visibility: Visibility,
}

impl Profile {
    /// Start a profile from its two mandatory fields.
    ///
    /// The email is trimmed and lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] when either is blank.
    pub fn new(name: &str, email: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() {
            return Err(ValidationError::MissingFields(&["name", "email"]));
        }
        Ok(Self {
            name: name.to_string(),
            email,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility != Visibility::Private
    }

    /// Add one endorsement to `skill`, appending the skill if it is new.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySkill`] when `skill` is blank.
    pub fn endorse(&mut self, skill: &str) -> Result<(), ValidationError> {
        let skill = skill.trim();
        if skill.is_empty() {
            return Err(ValidationError::EmptySkill);
        }
        match self.skills.iter_mut().find(|s| s.name == skill) {
            Some(existing) => existing.endorsements += 1,
            None => self.skills.push(Skill {
                name: skill.to_string(),
                endorsements: 1,
            }),
        }
        Ok(())
    }

    /// Texts searched by a free-text `q` filter.
    pub fn search_texts(&self) -> impl Iterator<Item = &str> {
        [self.name.as_str(), self.email.as_str()]
            .into_iter()
            .chain(self.bio.as_deref())
            .chain(self.headline.as_deref())
            .chain(self.specializations.iter().map(String::as_str))
            .chain(self.wants_to_teach.iter().map(String::as_str))
            .chain(self.skills.iter().map(|s| s.name.as_str()))
    }

    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.city.as_deref())
    }

    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.state.as_deref())
    }
}

/// Normalised form of an email address used for lookups and uniqueness.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Partial update of the shared profile fields.
///
/// Absent and `null` fields leave the stored value untouched. `slug` and
/// `password` are carried here but applied by the services, which need the
/// repository and the password hasher to do so.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "trimmed")]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "trimmed")]
    pub slug: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<Address>,
    pub headline: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub specializations: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list")]
    pub wants_to_teach: Option<Vec<String>>,
    pub skills: Option<Vec<Skill>>,
    #[serde(default, deserialize_with = "string_list")]
    pub modalities: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub hourly_rate: Option<f64>,
    pub availability: Option<Availability>,
    pub experiences: Option<Vec<Experience>>,
    pub education: Option<Vec<Education>>,
    pub certifications: Option<Vec<Certification>>,
    #[serde(default, deserialize_with = "string_list")]
    pub languages: Option<Vec<String>>,
    pub projects: Option<Vec<Project>>,
    pub links: Option<BTreeMap<String, String>>,
    pub visibility: Option<Visibility>,
}

impl ProfilePatch {
    /// Take the password out of the patch, ignoring blank values.
    pub fn take_password(&mut self) -> Option<String> {
        self.password.take().filter(|p| !p.is_empty())
    }

    /// Whether applying this patch would change any plain field.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.phone.is_some()
            || self.tax_id.is_some()
            || self.bio.is_some()
            || self.birth_date.is_some()
            || self.address.is_some()
            || self.headline.is_some()
            || self.avatar_url.is_some()
            || self.banner_url.is_some()
            || self.specializations.is_some()
            || self.wants_to_teach.is_some()
            || self.skills.is_some()
            || self.modalities.is_some()
            || self.hourly_rate.is_some()
            || self.availability.is_some()
            || self.experiences.is_some()
            || self.education.is_some()
            || self.certifications.is_some()
            || self.languages.is_some()
            || self.projects.is_some()
            || self.links.is_some()
            || self.visibility.is_some()
    }

    /// Copy every present plain field onto `profile`.
    pub fn apply(self, profile: &mut Profile) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut profile.name, self.name);
        set_opt(&mut profile.phone, self.phone);
        set_opt(&mut profile.tax_id, self.tax_id);
        set_opt(&mut profile.bio, self.bio);
        set_opt(&mut profile.birth_date, self.birth_date);
        set_opt(&mut profile.address, self.address);
        set_opt(&mut profile.headline, self.headline);
        set_opt(&mut profile.avatar_url, self.avatar_url);
        set_opt(&mut profile.banner_url, self.banner_url);
        set(&mut profile.specializations, self.specializations);
        set(&mut profile.wants_to_teach, self.wants_to_teach);
        set(&mut profile.skills, self.skills);
        set(&mut profile.modalities, self.modalities);
        set_opt(&mut profile.hourly_rate, self.hourly_rate);
        set_opt(&mut profile.availability, self.availability);
        set(&mut profile.experiences, self.experiences);
        set(&mut profile.education, self.education);
        set(&mut profile.certifications, self.certifications);
        set(&mut profile.languages, self.languages);
        set(&mut profile.projects, self.projects);
        set(&mut profile.links, self.links);
        set(&mut profile.visibility, self.visibility);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile() -> Profile {
        Profile::new("Ana Lima", " ANA@Example.com ").unwrap()
    }

    #[test]
    fn should_normalize_email_when_creating_profile() {
        let p = profile();
        assert_eq!(p.email, "ana@example.com");
        assert_eq!(p.visibility, Visibility::Public);
    }

    #[test]
    fn should_require_name_and_email() {
        assert_eq!(
            Profile::new("  ", "a@b.c"),
            Err(ValidationError::MissingFields(&["name", "email"]))
        );
    }

    #[test]
    fn should_accept_skills_as_strings_or_objects() {
        let skills: Vec<Skill> =
            serde_json::from_value(json!(["rust", {"name": "sql", "endorsements": 3}])).unwrap();
        assert_eq!(skills[0], Skill::new("rust"));
        assert_eq!(skills[1].endorsements, 3);
    }

    #[test]
    fn should_increment_existing_skill_when_endorsed() {
        let mut p = profile();
        p.endorse("rust").unwrap();
        p.endorse("rust").unwrap();
        p.endorse("go").unwrap();
        assert_eq!(p.skills.len(), 2);
        assert_eq!(p.skills[0].endorsements, 2);
        assert_eq!(p.skills[1].endorsements, 1);
    }

    #[test]
    fn should_reject_blank_skill_when_endorsing() {
        assert_eq!(profile().endorse(" "), Err(ValidationError::EmptySkill));
    }

    #[test]
    fn should_normalize_list_fields_when_patch_is_parsed() {
        let patch: ProfilePatch = serde_json::from_value(json!({
            "specializations": "math, physics",
            "hourly_rate": "75",
            "visibility": "private",
            "unknown": true
        }))
        .unwrap();
        assert!(patch.has_changes());

        let mut p = profile();
        patch.apply(&mut p);
        assert_eq!(p.specializations, vec!["math", "physics"]);
        assert_eq!(p.hourly_rate, Some(75.0));
        assert!(!p.is_public());
        assert_eq!(p.name, "Ana Lima");
    }

    #[test]
    fn should_report_no_changes_when_only_slug_and_password_are_sent() {
        let mut patch: ProfilePatch =
            serde_json::from_value(json!({"slug": "x", "password": ""})).unwrap();
        assert!(!patch.has_changes());
        assert_eq!(patch.take_password(), None);
    }

    #[test]
    fn should_search_skill_names_and_bio() {
        let mut p = profile();
        p.bio = Some("Loves chess".to_string());
        p.skills.push(Skill::new("piano"));
        let texts: Vec<&str> = p.search_texts().collect();
        assert!(texts.contains(&"Loves chess"));
        assert!(texts.contains(&"piano"));
    }
}
