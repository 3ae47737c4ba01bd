//! Conference use-case service.
//!
//! # Responsibility
//! - Create conferences under their organizer inside one transaction.
//! - List, query and load conferences.
//! - Hand the confirmation email to the task queue after commit.
//!
//! # Invariants
//! - A new conference starts with `seats_available == max_attendees`.
//! - Queue failures never fail conference creation.
//! - Query results are sorted by name in memory after an unsorted, filtered
//!   fetch; ties are broken by key.

use crate::model::conference::{Conference, ConferenceForm, ConferenceValidationError};
use crate::model::key::ConferenceKey;
use crate::queue::{Task, TaskQueue, EMAIL_QUEUE, SEND_CONFIRMATION_EMAIL_TASK};
use crate::repo::conference_repo::ConferenceQuery;
use crate::repo::store::{EntityStore, RepoError, RepoResult};
use crate::service::profile_service::load_or_default_profile;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for conference use-cases.
#[derive(Debug)]
pub enum ConferenceServiceError {
    /// Form input violates conference invariants.
    Validation(ConferenceValidationError),
    /// No conference exists under the key.
    NotFound(ConferenceKey),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ConferenceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "No Conference found with key: {key}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConferenceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ConferenceServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Conference service facade.
pub struct ConferenceService<S: EntityStore, Q: TaskQueue> {
    store: S,
    queue: Q,
}

impl<S: EntityStore, Q: TaskQueue> ConferenceService<S, Q> {
    pub fn new(store: S, queue: Q) -> Self {
        Self { store, queue }
    }

    /// Creates a conference owned by `owner_user_id`.
    ///
    /// The id allocation, the organizer Profile (created with defaults when
    /// missing) and the conference are committed together. The confirmation
    /// email task is enqueued afterwards on a best-effort basis.
    pub fn create(
        &self,
        owner_user_id: &str,
        owner_email: &str,
        form: &ConferenceForm,
    ) -> Result<Conference, ConferenceServiceError> {
        let started_at = Instant::now();
        let conference = self.store.run_in_transaction(|store| {
            let key = store.allocate_conference_id(owner_user_id)?;
            let profile = load_or_default_profile(store, owner_user_id, owner_email)?;
            let conference =
                Conference::from_form(key, Some(profile.display_name.clone()), form)?;

            store.save_profile(&profile)?;
            store.save_conference(&conference)?;
            Ok(conference)
        })?;

        info!(
            "event=conference_create module=service status=ok owner={} conference_id={} duration_ms={}",
            owner_user_id,
            conference.key.id(),
            started_at.elapsed().as_millis()
        );

        let task = Task::new(EMAIL_QUEUE, SEND_CONFIRMATION_EMAIL_TASK)
            .param("email", owner_email)
            .param("conference_key", conference.key.to_websafe())
            .param("conference_info", describe(&conference));
        if let Err(err) = self.queue.enqueue(&task) {
            warn!(
                "event=task_enqueue module=service status=error queue={} task={} conference_id={} error={}",
                EMAIL_QUEUE,
                SEND_CONFIRMATION_EMAIL_TASK,
                conference.key.id(),
                err
            );
        }

        Ok(conference)
    }

    /// Loads one conference or fails with `NotFound`.
    pub fn get_by_key(&self, key: &ConferenceKey) -> Result<Conference, ConferenceServiceError> {
        self.store
            .get_conference(key)?
            .ok_or_else(|| ConferenceServiceError::NotFound(key.clone()))
    }

    /// Loads several conferences in key order, skipping missing ones.
    pub fn get_many(&self, keys: &[ConferenceKey]) -> RepoResult<Vec<Conference>> {
        self.store.get_conferences(keys)
    }

    /// Lists conferences created by `owner_user_id`, by name ascending.
    pub fn list_by_owner(&self, owner_user_id: &str) -> RepoResult<Vec<Conference>> {
        self.store.list_conferences_by_owner(owner_user_id)
    }

    /// Runs an attribute query and sorts the result by name ascending.
    pub fn query(&self, query: &ConferenceQuery) -> RepoResult<Vec<Conference>> {
        let mut conferences = self.store.query_conferences(query)?;
        sort_by_name(&mut conferences);
        Ok(conferences)
    }
}

/// Sorts by name, then by key for a deterministic order among equal names.
pub fn sort_by_name(conferences: &mut [Conference]) {
    conferences.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)));
}

fn describe(conference: &Conference) -> String {
    let mut info = conference.name.clone();
    if let Some(city) = conference.city.as_deref() {
        info.push_str(&format!(" in {city}"));
    }
    if let Some(start) = conference.start_date {
        info.push_str(&format!(" starting {start}"));
    }
    info.push_str(&format!(" ({} seats)", conference.max_attendees));
    info
}
