//! Conference API facade.
//!
//! # Responsibility
//! - Expose the externally callable operations with caller identity checks.
//! - Translate service results and registration outcomes into boundary
//!   errors carrying a kind and a human-readable reason.
//!
//! # Invariants
//! - Operations that need an identity fail with `Unauthorized` before any
//!   store access when none, or one with a blank user id, is supplied.
//! - Registration outcomes are translated only after the transaction ended.

use crate::cache::CacheClient;
use crate::model::announcement::Announcement;
use crate::model::conference::{Conference, ConferenceForm};
use crate::model::key::{ConferenceKey, UserId};
use crate::model::profile::Profile;
use crate::queue::TaskQueue;
use crate::repo::conference_repo::ConferenceQuery;
use crate::repo::store::{RepoError, SqliteEntityStore};
use crate::service::announcement_service::AnnouncementService;
use crate::service::conference_service::{ConferenceService, ConferenceServiceError};
use crate::service::profile_service::{ProfileForm, ProfileService};
use crate::service::registration_service::{RegistrationOutcome, RegistrationService};
use log::warn;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const AUTHORIZATION_REQUIRED: &str = "Authorization required";

/// Already-authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
}

impl AuthUser {
    pub fn new(user_id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

/// Boundary error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// No caller identity.
    Unauthorized,
    /// Referenced entity is absent.
    NotFound,
    /// Domain rule violation.
    Conflict,
    /// Unexpected fault inside a registration transaction.
    Forbidden,
    /// Form input rejected by validation.
    BadRequest,
    /// Store failure outside the registration engine.
    Internal,
}

/// Error returned by every API operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub reason: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    fn unauthorized() -> Self {
        Self::new(ApiErrorKind::Unauthorized, AUTHORIZATION_REQUIRED)
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.reason)
    }
}

impl Error for ApiError {}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::new(ApiErrorKind::BadRequest, err.to_string()),
            other => Self::new(ApiErrorKind::Internal, other.to_string()),
        }
    }
}

impl From<ConferenceServiceError> for ApiError {
    fn from(value: ConferenceServiceError) -> Self {
        match value {
            ConferenceServiceError::Validation(err) => {
                Self::new(ApiErrorKind::BadRequest, err.to_string())
            }
            ConferenceServiceError::NotFound(key) => {
                Self::new(ApiErrorKind::NotFound, format!("No Conference found with key: {key}"))
            }
            ConferenceServiceError::Repo(err) => err.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Boolean result envelope for registration calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedBoolean {
    pub success: bool,
}

/// Conference API bound to one store connection and its collaborators.
pub struct ConferenceApi<'a> {
    conn: &'a Connection,
    cache: &'a dyn CacheClient,
    queue: &'a dyn TaskQueue,
}

impl<'a> ConferenceApi<'a> {
    pub fn new(conn: &'a Connection, cache: &'a dyn CacheClient, queue: &'a dyn TaskQueue) -> Self {
        Self { conn, cache, queue }
    }

    /// Creates or updates the caller's profile.
    pub fn save_profile(&self, identity: Option<&AuthUser>, form: &ProfileForm) -> ApiResult<Profile> {
        let user = require_identity(identity)?;
        Ok(self
            .profiles()
            .upsert(&user.user_id, &user.email, form)?)
    }

    /// Returns the caller's stored profile, if any.
    pub fn get_profile(&self, identity: Option<&AuthUser>) -> ApiResult<Option<Profile>> {
        let user = require_identity(identity)?;
        Ok(self.profiles().get(&user.user_id)?)
    }

    /// Creates a conference organized by the caller.
    pub fn create_conference(
        &self,
        identity: Option<&AuthUser>,
        form: &ConferenceForm,
    ) -> ApiResult<Conference> {
        let user = require_identity(identity)?;
        Ok(self
            .conferences()
            .create(&user.user_id, &user.email, form)?)
    }

    /// Runs an attribute query; results are ordered by name.
    pub fn query_conferences(&self, query: &ConferenceQuery) -> ApiResult<Vec<Conference>> {
        Ok(self.conferences().query(query)?)
    }

    /// Lists conferences organized by the caller.
    pub fn get_conferences_created(&self, identity: Option<&AuthUser>) -> ApiResult<Vec<Conference>> {
        let user = require_identity(identity)?;
        Ok(self.conferences().list_by_owner(&user.user_id)?)
    }

    /// Books a seat for the caller.
    pub fn register_for_conference(
        &self,
        identity: Option<&AuthUser>,
        websafe_key: &str,
    ) -> ApiResult<WrappedBoolean> {
        let user = require_identity(identity)?;
        let key = parse_key(websafe_key)?;
        let outcome = self
            .registrations()
            .register(&user.user_id, &user.email, &key);
        outcome_to_result(outcome, websafe_key)
    }

    /// Releases the caller's seat.
    pub fn unregister_from_conference(
        &self,
        identity: Option<&AuthUser>,
        websafe_key: &str,
    ) -> ApiResult<WrappedBoolean> {
        let user = require_identity(identity)?;
        let key = parse_key(websafe_key)?;
        let outcome = self
            .registrations()
            .unregister(&user.user_id, &user.email, &key);
        outcome_to_result(outcome, websafe_key)
    }

    /// Lists the conferences the caller is registered for, in registration order.
    pub fn get_conferences_to_attend(&self, identity: Option<&AuthUser>) -> ApiResult<Vec<Conference>> {
        let user = require_identity(identity)?;
        let profile = self
            .profiles()
            .get(&user.user_id)?
            .ok_or_else(|| ApiError::new(ApiErrorKind::NotFound, "Profile doesn't exist."))?;
        Ok(self
            .conferences()
            .get_many(&profile.conference_keys_to_attend)?)
    }

    /// Returns the cached announcement, if one is live.
    pub fn get_announcement(&self) -> Option<Announcement> {
        AnnouncementService::new(self.cache).get()
    }

    /// Loads one conference by websafe key.
    pub fn get_conference(&self, websafe_key: &str) -> ApiResult<Conference> {
        let key = parse_key(websafe_key)?;
        Ok(self.conferences().get_by_key(&key)?)
    }

    fn store(&self) -> SqliteEntityStore<'a> {
        SqliteEntityStore::new(self.conn)
    }

    fn profiles(&self) -> ProfileService<SqliteEntityStore<'a>> {
        ProfileService::new(self.store())
    }

    fn conferences(&self) -> ConferenceService<SqliteEntityStore<'a>, &'a dyn TaskQueue> {
        ConferenceService::new(self.store(), self.queue)
    }

    fn registrations(&self) -> RegistrationService<SqliteEntityStore<'a>> {
        RegistrationService::new(self.store())
    }
}

/// A blank user id is no identity.
fn require_identity(identity: Option<&AuthUser>) -> ApiResult<&AuthUser> {
    identity
        .filter(|user| !user.user_id.trim().is_empty())
        .ok_or_else(ApiError::unauthorized)
}

/// Malformed keys cannot name an existing conference and read as not found.
fn parse_key(websafe_key: &str) -> ApiResult<ConferenceKey> {
    ConferenceKey::parse_websafe(websafe_key).map_err(|err| {
        warn!("event=key_parse module=api status=error error={}", err);
        ApiError::new(
            ApiErrorKind::NotFound,
            format!("No Conference found with key: {websafe_key}"),
        )
    })
}

/// Maps a finished registration attempt to the boundary result.
pub fn outcome_to_result(outcome: RegistrationOutcome, websafe_key: &str) -> ApiResult<WrappedBoolean> {
    match outcome {
        RegistrationOutcome::Success => Ok(WrappedBoolean { success: true }),
        RegistrationOutcome::NotFound => Err(ApiError::new(
            ApiErrorKind::NotFound,
            format!("No Conference found with key: {websafe_key}"),
        )),
        RegistrationOutcome::AlreadyRegistered => Err(ApiError::new(
            ApiErrorKind::Conflict,
            "You have already registered",
        )),
        RegistrationOutcome::SoldOut => Err(ApiError::new(
            ApiErrorKind::Conflict,
            "There are no seats available",
        )),
        RegistrationOutcome::NotRegistered => {
            Err(ApiError::new(ApiErrorKind::Conflict, "You are not registered"))
        }
        RegistrationOutcome::UnknownError => {
            Err(ApiError::new(ApiErrorKind::Forbidden, "Unknown exception"))
        }
    }
}
