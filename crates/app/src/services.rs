//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod address_service;
pub mod auth_service;
pub mod booking_service;
pub mod category_service;
pub mod chat_service;
pub mod lesson_service;
pub mod rating_service;
pub mod student_service;
pub mod teacher_service;
