//! # tutorhub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `StudentRepository`, `TeacherRepository`: profiles
//!   - `CategoryRepository`, `LessonRepository`: the lesson catalog
//!   - `BookingRepository`: appointments and slot lookups
//!   - `RatingRepository`: lesson ratings
//!   - `ChatRepository`: conversations and messages
//!   - `PasswordHasher`, `TokenIssuer`: credentials
//!   - `PostalCodeLookup`: the external postal code directory
//! - Provide one **service** per resource that validates input, checks
//!   references and then reads or writes through the ports
//! - Keep lesson status in step with its bookings
//!
//! ## Dependency rule
//! Depends on `tutorhub-domain` only. Never imports adapter crates.
//! Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
