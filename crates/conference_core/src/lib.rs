//! Core domain logic for conference management.
//! Profiles, conferences and seat registration over a transactional store.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod queue;
pub mod repo;
pub mod service;

pub use api::{ApiError, ApiErrorKind, ApiResult, AuthUser, ConferenceApi, WrappedBoolean};
pub use cache::{CacheClient, InMemoryCache};
pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LogLevel,
    LoggingError,
};
pub use model::announcement::{Announcement, RECENT_ANNOUNCEMENTS_KEY};
pub use model::conference::{Conference, ConferenceForm, ConferenceValidationError};
pub use model::key::{ConferenceKey, KeyParseError, UserId};
pub use model::profile::{default_display_name_from_email, Profile, TeeShirtSize};
pub use queue::{QueueError, SqliteTaskOutbox, Task, TaskId, TaskQueue};
pub use repo::conference_repo::ConferenceQuery;
pub use repo::store::{EntityStore, RepoError, RepoResult, SqliteEntityStore};
pub use service::announcement_service::AnnouncementService;
pub use service::conference_service::{ConferenceService, ConferenceServiceError};
pub use service::profile_service::{ProfileForm, ProfileService};
pub use service::registration_service::{RegistrationOutcome, RegistrationService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
