//! In-memory port implementations shared by the service tests.
//!
//! Every repository is a cloneable handle onto a `Mutex<HashMap>`, so a test
//! can hand the same store to several services.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tutorhub_domain::booking::Booking;
use tutorhub_domain::category::Category;
use tutorhub_domain::chat::{Conversation, Message};
use tutorhub_domain::error::{AuthError, ConflictError, TutorHubError, UpstreamError};
use tutorhub_domain::id::{
    BookingId, CategoryId, ConversationId, LessonId, RatingId, StudentId, TeacherId, UserId,
};
use tutorhub_domain::identity::Identity;
use tutorhub_domain::lesson::{Lesson, LessonStatusChange};
use tutorhub_domain::postal::{PostalAddress, PostalCode};
use tutorhub_domain::rating::Rating;
use tutorhub_domain::student::Student;
use tutorhub_domain::teacher::Teacher;
use tutorhub_domain::time::Timestamp;

use crate::ports::{
    BookingRepository, CategoryRepository, ChatRepository, LessonRepository, PasswordHasher,
    PostalCodeLookup, RatingRepository, StudentRepository, TeacherRepository, TokenIssuer,
};

type Store<K, V> = Arc<Mutex<HashMap<K, V>>>;

#[derive(Clone, Default)]
pub struct InMemoryStudents {
    pub store: Store<StudentId, Student>,
}

impl InMemoryStudents {
    fn check_unique(store: &HashMap<StudentId, Student>, student: &Student) -> Result<(), TutorHubError> {
        for other in store.values().filter(|s| s.id != student.id) {
            if other.profile.email == student.profile.email {
                return Err(ConflictError::EmailTaken.into());
            }
            if other.profile.slug.is_some() && other.profile.slug == student.profile.slug {
                return Err(ConflictError::SlugTaken.into());
            }
        }
        Ok(())
    }
}

impl StudentRepository for InMemoryStudents {
    fn create(&self, student: Student) -> impl Future<Output = Result<Student, TutorHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = Self::check_unique(&store, &student).map(|()| {
            store.insert(student.id, student.clone());
            student
        });
        async { result }
    }

    fn get_by_id(
        &self,
        id: StudentId,
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store.values().find(|s| s.profile.email == email).cloned();
        async { Ok(result) }
    }

    fn find_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Student>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store
            .values()
            .find(|s| s.profile.slug.as_deref() == Some(slug))
            .cloned();
        async { Ok(result) }
    }

    fn slug_exists(
        &self,
        slug: &str,
        except: Option<StudentId>,
    ) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store
            .values()
            .any(|s| Some(s.id) != except && s.profile.slug.as_deref() == Some(slug));
        async move { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Student>, TutorHubError>> + Send {
        let result: Vec<Student> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn count(&self) -> impl Future<Output = Result<usize, TutorHubError>> + Send {
        let result = self.store.lock().unwrap().len();
        async move { Ok(result) }
    }

    fn update(&self, mut student: Student) -> impl Future<Output = Result<Student, TutorHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = Self::check_unique(&store, &student).map(|()| {
            if student.password_hash.is_none() {
                student.password_hash = store.get(&student.id).and_then(|s| s.password_hash.clone());
            }
            store.insert(student.id, student.clone());
            student
        });
        async { result }
    }

    fn delete(&self, id: StudentId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id).is_some();
        async move { Ok(removed) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTeachers {
    pub store: Store<TeacherId, Teacher>,
}

impl InMemoryTeachers {
    fn check_unique(store: &HashMap<TeacherId, Teacher>, teacher: &Teacher) -> Result<(), TutorHubError> {
        for other in store.values().filter(|t| t.id != teacher.id) {
            if other.profile.email == teacher.profile.email {
                return Err(ConflictError::EmailTaken.into());
            }
            if other.profile.slug.is_some() && other.profile.slug == teacher.profile.slug {
                return Err(ConflictError::SlugTaken.into());
            }
        }
        Ok(())
    }
}

impl TeacherRepository for InMemoryTeachers {
    fn create(&self, teacher: Teacher) -> impl Future<Output = Result<Teacher, TutorHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = Self::check_unique(&store, &teacher).map(|()| {
            store.insert(teacher.id, teacher.clone());
            teacher
        });
        async { result }
    }

    fn get_by_id(
        &self,
        id: TeacherId,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store.values().find(|t| t.profile.email == email).cloned();
        async { Ok(result) }
    }

    fn find_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Teacher>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store
            .values()
            .find(|t| t.profile.slug.as_deref() == Some(slug))
            .cloned();
        async { Ok(result) }
    }

    fn slug_exists(
        &self,
        slug: &str,
        except: Option<TeacherId>,
    ) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store
            .values()
            .any(|t| Some(t.id) != except && t.profile.slug.as_deref() == Some(slug));
        async move { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Teacher>, TutorHubError>> + Send {
        let result: Vec<Teacher> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn update(&self, mut teacher: Teacher) -> impl Future<Output = Result<Teacher, TutorHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = Self::check_unique(&store, &teacher).map(|()| {
            if teacher.password_hash.is_none() {
                teacher.password_hash = store.get(&teacher.id).and_then(|t| t.password_hash.clone());
            }
            store.insert(teacher.id, teacher.clone());
            teacher
        });
        async { result }
    }

    fn delete(&self, id: TeacherId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id).is_some();
        async move { Ok(removed) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCategories {
    pub store: Store<CategoryId, Category>,
}

impl CategoryRepository for InMemoryCategories {
    fn create(&self, category: Category) -> impl Future<Output = Result<Category, TutorHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = if store.values().any(|c| c.has_name(&category.name)) {
            Err(ConflictError::CategoryNameTaken.into())
        } else {
            store.insert(category.id, category.clone());
            Ok(category)
        };
        async { result }
    }

    fn get_by_id(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, TutorHubError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Category>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store.values().find(|c| c.has_name(name)).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Category>, TutorHubError>> + Send {
        let result: Vec<Category> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn update(&self, category: Category) -> impl Future<Output = Result<Category, TutorHubError>> + Send {
        self.store.lock().unwrap().insert(category.id, category.clone());
        async { Ok(category) }
    }

    fn delete(&self, id: CategoryId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id).is_some();
        async move { Ok(removed) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryLessons {
    pub store: Store<LessonId, Lesson>,
    pub status_log: Arc<Mutex<Vec<LessonStatusChange>>>,
}

impl LessonRepository for InMemoryLessons {
    fn create(&self, lesson: Lesson) -> impl Future<Output = Result<Lesson, TutorHubError>> + Send {
        self.store.lock().unwrap().insert(lesson.id, lesson.clone());
        async { Ok(lesson) }
    }

    fn get_by_id(
        &self,
        id: LessonId,
    ) -> impl Future<Output = Result<Option<Lesson>, TutorHubError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Lesson>, TutorHubError>> + Send {
        let result: Vec<Lesson> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn list_by_category(
        &self,
        category: CategoryId,
    ) -> impl Future<Output = Result<Vec<Lesson>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result: Vec<Lesson> = store
            .values()
            .filter(|l| l.category_id == Some(category))
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn count_by_category(
        &self,
        category: CategoryId,
    ) -> impl Future<Output = Result<usize, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store
            .values()
            .filter(|l| l.category_id == Some(category))
            .count();
        async move { Ok(result) }
    }

    fn update(&self, lesson: Lesson) -> impl Future<Output = Result<Lesson, TutorHubError>> + Send {
        self.store.lock().unwrap().insert(lesson.id, lesson.clone());
        async { Ok(lesson) }
    }

    fn delete(&self, id: LessonId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id).is_some();
        async move { Ok(removed) }
    }

    fn record_status_change(
        &self,
        change: LessonStatusChange,
    ) -> impl Future<Output = Result<(), TutorHubError>> + Send {
        self.status_log.lock().unwrap().push(change);
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBookings {
    pub store: Store<BookingId, Booking>,
}

impl InMemoryBookings {
    fn check_slots(store: &HashMap<BookingId, Booking>, booking: &Booking) -> Result<(), TutorHubError> {
        if !booking.status.is_active() {
            return Ok(());
        }
        let clashes = store.values().filter(|b| {
            b.id != booking.id && b.status.is_active() && b.scheduled_at == booking.scheduled_at
        });
        for other in clashes {
            if other.teacher_id == booking.teacher_id {
                return Err(ConflictError::TeacherSchedule.into());
            }
            if other.student_id == booking.student_id {
                return Err(ConflictError::StudentSchedule.into());
            }
        }
        Ok(())
    }
}

impl BookingRepository for InMemoryBookings {
    fn create(&self, booking: Booking) -> impl Future<Output = Result<Booking, TutorHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = Self::check_slots(&store, &booking).map(|()| {
            store.insert(booking.id, booking.clone());
            booking
        });
        async { result }
    }

    fn get_by_id(
        &self,
        id: BookingId,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Booking>, TutorHubError>> + Send {
        let result: Vec<Booking> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn list_by_lesson(
        &self,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Vec<Booking>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result: Vec<Booking> = store
            .values()
            .filter(|b| b.lesson_id == lesson)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn find_active_for_teacher(
        &self,
        teacher: TeacherId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store
            .values()
            .find(|b| b.teacher_id == teacher && b.scheduled_at == at && b.status.is_active())
            .cloned();
        async { Ok(result) }
    }

    fn find_active_for_student(
        &self,
        student: StudentId,
        at: Timestamp,
    ) -> impl Future<Output = Result<Option<Booking>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store
            .values()
            .find(|b| b.student_id == student && b.scheduled_at == at && b.status.is_active())
            .cloned();
        async { Ok(result) }
    }

    fn update(&self, booking: Booking) -> impl Future<Output = Result<Booking, TutorHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = Self::check_slots(&store, &booking).map(|()| {
            store.insert(booking.id, booking.clone());
            booking
        });
        async { result }
    }

    fn delete(&self, id: BookingId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id).is_some();
        async move { Ok(removed) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRatings {
    pub store: Store<RatingId, Rating>,
}

impl RatingRepository for InMemoryRatings {
    fn create(&self, rating: Rating) -> impl Future<Output = Result<Rating, TutorHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let taken = store
            .values()
            .any(|r| r.student_id == rating.student_id && r.lesson_id == rating.lesson_id);
        let result = if taken {
            Err(ConflictError::AlreadyRated.into())
        } else {
            store.insert(rating.id, rating.clone());
            Ok(rating)
        };
        async { result }
    }

    fn get_by_id(
        &self,
        id: RatingId,
    ) -> impl Future<Output = Result<Option<Rating>, TutorHubError>> + Send {
        let result = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_student_lesson(
        &self,
        student: StudentId,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Option<Rating>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result = store
            .values()
            .find(|r| r.student_id == student && r.lesson_id == lesson)
            .cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send {
        let result: Vec<Rating> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(result) }
    }

    fn list_by_teacher(
        &self,
        teacher: TeacherId,
    ) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result: Vec<Rating> = store
            .values()
            .filter(|r| r.teacher_id == teacher)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn list_by_lesson(
        &self,
        lesson: LessonId,
    ) -> impl Future<Output = Result<Vec<Rating>, TutorHubError>> + Send {
        let store = self.store.lock().unwrap();
        let result: Vec<Rating> = store
            .values()
            .filter(|r| r.lesson_id == lesson)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn update(&self, rating: Rating) -> impl Future<Output = Result<Rating, TutorHubError>> + Send {
        self.store.lock().unwrap().insert(rating.id, rating.clone());
        async { Ok(rating) }
    }

    fn delete(&self, id: RatingId) -> impl Future<Output = Result<bool, TutorHubError>> + Send {
        let removed = self.store.lock().unwrap().remove(&id).is_some();
        async move { Ok(removed) }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryChats {
    pub conversations: Store<ConversationId, Conversation>,
    pub messages: Arc<Mutex<Vec<Message>>>,
}

impl ChatRepository for InMemoryChats {
    fn create_conversation(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<Conversation, TutorHubError>> + Send {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        async { Ok(conversation) }
    }

    fn get_conversation(
        &self,
        id: ConversationId,
    ) -> impl Future<Output = Result<Option<Conversation>, TutorHubError>> + Send {
        let result = self.conversations.lock().unwrap().get(&id).cloned();
        async { Ok(result) }
    }

    fn find_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> impl Future<Output = Result<Option<Conversation>, TutorHubError>> + Send {
        let store = self.conversations.lock().unwrap();
        let result = store
            .values()
            .find(|c| c.has_member(a) && c.has_member(b))
            .cloned();
        async { Ok(result) }
    }

    fn list_for_member(
        &self,
        member: UserId,
    ) -> impl Future<Output = Result<Vec<Conversation>, TutorHubError>> + Send {
        let store = self.conversations.lock().unwrap();
        let mut result: Vec<Conversation> =
            store.values().filter(|c| c.has_member(member)).cloned().collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        async { Ok(result) }
    }

    fn update_conversation(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<Conversation, TutorHubError>> + Send {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        async { Ok(conversation) }
    }

    fn append_message(
        &self,
        message: Message,
    ) -> impl Future<Output = Result<Message, TutorHubError>> + Send {
        self.messages.lock().unwrap().push(message.clone());
        async { Ok(message) }
    }

    fn list_messages(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<Vec<Message>, TutorHubError>> + Send {
        let messages = self.messages.lock().unwrap();
        let mut result: Vec<Message> = messages
            .iter()
            .filter(|m| m.conversation_id == conversation)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        async { Ok(result) }
    }
}

/// Reversible "hash" so tests can check what got stored.
#[derive(Clone, Copy, Default)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> impl Future<Output = Result<String, TutorHubError>> + Send {
        let encoded = format!("plain${password}");
        async move { Ok(encoded) }
    }

    fn verify(&self, password: &str, encoded: &str) -> impl Future<Output = bool> + Send {
        let matches = encoded.strip_prefix("plain$") == Some(password);
        async move { matches }
    }
}

/// Token issuer whose tokens are the JSON-encoded identity.
#[derive(Clone, Copy, Default)]
pub struct JsonTokens;

impl TokenIssuer for JsonTokens {
    fn issue(&self, identity: &Identity) -> Result<String, TutorHubError> {
        serde_json::to_string(identity).map_err(|err| TutorHubError::Internal(Box::new(err)))
    }

    fn verify(&self, token: &str) -> Result<Identity, TutorHubError> {
        serde_json::from_str(token).map_err(|_| AuthError::InvalidToken.into())
    }
}

/// Postal directory answering from a fixed table, or failing every lookup
/// when `failure` is set.
#[derive(Clone, Default)]
pub struct StaticPostal {
    pub known: Store<String, PostalAddress>,
    pub failure: Option<UpstreamError>,
    pub lookups: Arc<Mutex<usize>>,
}

impl PostalCodeLookup for StaticPostal {
    fn lookup(
        &self,
        code: &PostalCode,
    ) -> impl Future<Output = Result<Option<PostalAddress>, TutorHubError>> + Send {
        *self.lookups.lock().unwrap() += 1;
        let result = match &self.failure {
            Some(err) => Err(err.clone().into()),
            None => Ok(self.known.lock().unwrap().get(code.as_str()).cloned()),
        };
        async move { result }
    }
}
