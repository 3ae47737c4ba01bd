//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate entity store calls into use-case level APIs.
//! - Keep the API facade decoupled from storage details.

pub mod announcement_service;
pub mod conference_service;
pub mod profile_service;
pub mod registration_service;
