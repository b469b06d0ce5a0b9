//! # tutorhub-domain
//!
//! Pure domain model for the tutorhub tutoring marketplace.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Profiles** (students and teachers) and their partial updates
//! - Define **Categories** and **Lessons** published by teachers
//! - Define **Bookings** and the rules that keep a lesson's status in sync
//! - Define **Ratings** and their aggregates
//! - Define **Conversations** and **Messages**
//! - Postal codes and the addresses they resolve to
//! - Lenient input parsing, slugs, pagination and text search helpers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod identity;
pub mod input;
pub mod query;
pub mod slug;

pub mod booking;
pub mod category;
pub mod chat;
pub mod lesson;
pub mod postal;
pub mod profile;
pub mod rating;
pub mod student;
pub mod summary;
pub mod teacher;
