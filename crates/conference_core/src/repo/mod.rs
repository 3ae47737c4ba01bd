//! Entity store abstractions and SQLite persistence.
//!
//! # Responsibility
//! - Define the keyed, transactional entity store contract used by services.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Conference writes enforce `Conference::validate()` before persistence.
//! - Reads reject invalid persisted state instead of masking it.

pub mod conference_repo;
pub mod profile_repo;
pub mod store;
