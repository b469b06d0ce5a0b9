//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod booking_repo;
pub mod catalog_repo;
pub mod chat_repo;
pub mod credentials;
pub mod postal;
pub mod profile_repo;
pub mod rating_repo;

pub use booking_repo::BookingRepository;
pub use catalog_repo::{CategoryRepository, LessonRepository};
pub use chat_repo::ChatRepository;
pub use credentials::{PasswordHasher, TokenIssuer};
pub use postal::PostalCodeLookup;
pub use profile_repo::{StudentRepository, TeacherRepository};
pub use rating_repo::RatingRepository;
