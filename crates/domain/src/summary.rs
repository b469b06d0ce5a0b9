//! Read models: records enriched with summaries of what they reference.

use serde::Serialize;
use serde_json::Value;

use crate::booking::Booking;
use crate::category::Category;
use crate::chat::{Conversation, LastMessage};
use crate::id::{CategoryId, ConversationId, LessonId, UserId};
use crate::identity::UserKind;
use crate::lesson::{Lesson, LessonStatus};
use crate::rating::{Rating, RatingStats};
use crate::student::Student;
use crate::teacher::Teacher;
use crate::time::Timestamp;

/// Fields that a public profile page must never show.
pub const CONTACT_FIELDS: [&str; 3] = ["tax_id", "phone", "email"];

/// Serialize a profile for anonymous readers, dropping [`CONTACT_FIELDS`].
///
/// # Errors
///
/// Fails only if `record` cannot be serialized.
pub fn public_profile<T: Serialize>(record: &T) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        for field in CONTACT_FIELDS {
            map.remove(field);
        }
    }
    Ok(value)
}

/// A short description of a student or teacher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<UserKind>,
}

impl PersonSummary {
    #[must_use]
    pub fn student(student: &Student) -> Self {
        Self {
            id: student.id.into(),
            name: student.profile.name.clone(),
            email: student.profile.email.clone(),
            bio: None,
            phone: None,
            academic_background: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn teacher(teacher: &Teacher) -> Self {
        Self {
            id: teacher.id.into(),
            name: teacher.profile.name.clone(),
            email: teacher.profile.email.clone(),
            bio: None,
            phone: None,
            academic_background: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn with_bio(mut self, bio: Option<&String>) -> Self {
        self.bio = bio.cloned();
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: Option<&String>) -> Self {
        self.phone = phone.cloned();
        self
    }

    #[must_use]
    pub fn with_academic_background(mut self, background: Option<&String>) -> Self {
        self.academic_background = background.cloned();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: UserKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonSummary {
    pub id: LessonId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LessonStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
}

impl LessonSummary {
    /// Summary used inside bookings and ratings.
    #[must_use]
    pub fn described(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            price: lesson.price,
            status: None,
            created_at: None,
        }
    }

    /// Summary used inside a category detail.
    #[must_use]
    pub fn listed(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title.clone(),
            description: None,
            price: lesson.price,
            status: Some(lesson.status),
            created_at: Some(lesson.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub teacher: Option<PersonSummary>,
    pub category: Option<CategorySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: Category,
    pub lesson_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lessons: Option<Vec<LessonSummary>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub student: Option<PersonSummary>,
    pub teacher: Option<PersonSummary>,
    pub lesson: Option<LessonSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub student: Option<Student>,
    pub teacher: Option<Teacher>,
    pub lesson: Option<Lesson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingView {
    #[serde(flatten)]
    pub rating: Rating,
    pub student: Option<PersonSummary>,
    pub teacher: Option<PersonSummary>,
    pub lesson: Option<LessonSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingDetail {
    #[serde(flatten)]
    pub rating: Rating,
    pub student: Option<Student>,
    pub teacher: Option<Teacher>,
    pub lesson: Option<Lesson>,
}

/// Rating aggregate for a teacher or lesson plus the subject record.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectStats<T> {
    #[serde(flatten)]
    pub stats: RatingStats,
    #[serde(flatten)]
    pub subject: T,
}

/// Teacher subject of [`SubjectStats`].
#[derive(Debug, Clone, Serialize)]
pub struct TeacherSubject {
    pub teacher: Teacher,
}

/// Lesson subject of [`SubjectStats`].
#[derive(Debug, Clone, Serialize)]
pub struct LessonSubject {
    pub lesson: Lesson,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub id: ConversationId,
    pub members: [UserId; 2],
    pub other: Option<PersonSummary>,
    pub last_message: Option<LastMessage>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ConversationView {
    #[must_use]
    pub fn new(conversation: Conversation, other: Option<PersonSummary>) -> Self {
        Self {
            id: conversation.id,
            members: conversation.members,
            other,
            last_message: conversation.last_message,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}
