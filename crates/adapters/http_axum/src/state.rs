//! Shared application state for axum handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tutorhub_app::ports::{
    BookingRepository, CategoryRepository, ChatRepository, LessonRepository, PasswordHasher,
    PostalCodeLookup, RatingRepository, StudentRepository, TeacherRepository, TokenIssuer,
};
use tutorhub_app::services::address_service::AddressService;
use tutorhub_app::services::auth_service::AuthService;
use tutorhub_app::services::booking_service::BookingService;
use tutorhub_app::services::category_service::CategoryService;
use tutorhub_app::services::chat_service::ChatService;
use tutorhub_app::services::lesson_service::LessonService;
use tutorhub_app::services::rating_service::RatingService;
use tutorhub_app::services::student_service::StudentService;
use tutorhub_app::services::teacher_service::TeacherService;

/// The set of adapter types the HTTP layer is wired to.
///
/// Grouping them as associated types keeps handler signatures to a single
/// type parameter.
pub trait Backend: Send + Sync + 'static {
    type Students: StudentRepository + Clone + Send + Sync + 'static;
    type Teachers: TeacherRepository + Clone + Send + Sync + 'static;
    type Categories: CategoryRepository + Clone + Send + Sync + 'static;
    type Lessons: LessonRepository + Clone + Send + Sync + 'static;
    type Bookings: BookingRepository + Clone + Send + Sync + 'static;
    type Ratings: RatingRepository + Send + Sync + 'static;
    type Chats: ChatRepository + Send + Sync + 'static;
    type Hasher: PasswordHasher + Clone + Send + Sync + 'static;
    type Tokens: TokenIssuer + Send + Sync + 'static;
    type Postal: PostalCodeLookup + Send + Sync + 'static;
}

/// Repository instances handed to [`AppState::new`].
pub struct Repositories<B: Backend> {
    pub students: B::Students,
    pub teachers: B::Teachers,
    pub categories: B::Categories,
    pub lessons: B::Lessons,
    pub bookings: B::Bookings,
    pub ratings: B::Ratings,
    pub chats: B::Chats,
}

/// Where avatars are written and how their public URLs are built.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub root: PathBuf,
    /// Base for public URLs; derived from the request `Host` when unset.
    pub public_base_url: Option<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("uploads"),
            public_base_url: None,
        }
    }
}

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<B: Backend> {
    pub auth: Arc<AuthService<B::Students, B::Teachers, B::Hasher, B::Tokens>>,
    pub students: Arc<StudentService<B::Students, B::Hasher>>,
    pub teachers: Arc<TeacherService<B::Teachers, B::Hasher>>,
    pub categories: Arc<CategoryService<B::Categories, B::Lessons, B::Teachers>>,
    pub lessons: Arc<LessonService<B::Lessons, B::Teachers, B::Categories>>,
    pub bookings: Arc<BookingService<B::Bookings, B::Students, B::Teachers, B::Lessons>>,
    pub ratings:
        Arc<RatingService<B::Ratings, B::Students, B::Teachers, B::Lessons, B::Bookings>>,
    pub chats: Arc<ChatService<B::Chats, B::Students, B::Teachers>>,
    pub addresses: Arc<AddressService<B::Postal>>,
    pub uploads: Arc<UploadSettings>,
}

impl<B: Backend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            students: Arc::clone(&self.students),
            teachers: Arc::clone(&self.teachers),
            categories: Arc::clone(&self.categories),
            lessons: Arc::clone(&self.lessons),
            bookings: Arc::clone(&self.bookings),
            ratings: Arc::clone(&self.ratings),
            chats: Arc::clone(&self.chats),
            addresses: Arc::clone(&self.addresses),
            uploads: Arc::clone(&self.uploads),
        }
    }
}

impl<B: Backend> AppState<B> {
    /// Build every service from one set of repositories.
    pub fn new(
        repos: Repositories<B>,
        hasher: B::Hasher,
        tokens: B::Tokens,
        postal: B::Postal,
        uploads: UploadSettings,
    ) -> Self {
        let Repositories {
            students,
            teachers,
            categories,
            lessons,
            bookings,
            ratings,
            chats,
        } = repos;

        Self {
            auth: Arc::new(AuthService::new(
                students.clone(),
                teachers.clone(),
                hasher.clone(),
                tokens,
            )),
            students: Arc::new(StudentService::new(students.clone(), hasher.clone())),
            teachers: Arc::new(TeacherService::new(teachers.clone(), hasher)),
            categories: Arc::new(CategoryService::new(
                categories.clone(),
                lessons.clone(),
                teachers.clone(),
            )),
            lessons: Arc::new(LessonService::new(
                lessons.clone(),
                teachers.clone(),
                categories,
            )),
            bookings: Arc::new(BookingService::new(
                bookings.clone(),
                students.clone(),
                teachers.clone(),
                lessons.clone(),
            )),
            ratings: Arc::new(RatingService::new(
                ratings,
                students.clone(),
                teachers.clone(),
                lessons,
                bookings,
            )),
            chats: Arc::new(ChatService::new(chats, students, teachers)),
            addresses: Arc::new(AddressService::new(postal)),
            uploads: Arc::new(uploads),
        }
    }
}
