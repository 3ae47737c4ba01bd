//! Domain model for profiles, conferences and announcements.
//!
//! # Responsibility
//! - Define canonical entities used by services and the entity store.
//! - Keep seat accounting and defaulting rules next to the data they guard.
//!
//! # Invariants
//! - Conferences are keyed under their organizer's user id.
//! - Seat counters never leave `0..=max_attendees`.

pub mod announcement;
pub mod conference;
pub mod key;
pub mod profile;
