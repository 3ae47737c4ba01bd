//! Seat registration engine.
//!
//! # Responsibility
//! - Book and release conference seats for one user atomically.
//! - Report every business result as a [`RegistrationOutcome`] value.
//!
//! # Invariants
//! - The conference seat counter and the user's registration list change in
//!   the same transaction, or neither changes.
//! - Rejections (`NotFound`, `AlreadyRegistered`, `SoldOut`, `NotRegistered`)
//!   write nothing.
//! - Store faults, including lock timeouts and failed commits, roll back and
//!   surface as `UnknownError`.

use crate::model::key::ConferenceKey;
use crate::repo::store::EntityStore;
use crate::service::profile_service::load_or_default_profile;
use log::{error, info};
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Result of one register/unregister attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Success,
    NotFound,
    AlreadyRegistered,
    SoldOut,
    NotRegistered,
    UnknownError,
}

impl RegistrationOutcome {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Stable token used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::AlreadyRegistered => "already_registered",
            Self::SoldOut => "sold_out",
            Self::NotRegistered => "not_registered",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl Display for RegistrationOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration engine over an entity store.
pub struct RegistrationService<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> RegistrationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Books one seat of `key` for `user_id`.
    ///
    /// `email` seeds the user's Profile when it does not exist yet; the new
    /// Profile is only persisted when the booking succeeds.
    pub fn register(&self, user_id: &str, email: &str, key: &ConferenceKey) -> RegistrationOutcome {
        let started_at = Instant::now();
        let result = self.store.run_in_transaction(|store| {
            let Some(mut conference) = store.get_conference(key)? else {
                return Ok(RegistrationOutcome::NotFound);
            };
            let mut profile = load_or_default_profile(store, user_id, email)?;

            if profile.is_registered_for(key) {
                return Ok(RegistrationOutcome::AlreadyRegistered);
            }
            if conference.book_seats(1).is_err() {
                return Ok(RegistrationOutcome::SoldOut);
            }

            profile.add_conference_key(key.clone());
            store.save_profile(&profile)?;
            store.save_conference(&conference)?;
            Ok(RegistrationOutcome::Success)
        });

        finish("conference_register", user_id, key, result, started_at)
    }

    /// Releases the seat `user_id` holds for `key`.
    pub fn unregister(
        &self,
        user_id: &str,
        email: &str,
        key: &ConferenceKey,
    ) -> RegistrationOutcome {
        let started_at = Instant::now();
        let result = self.store.run_in_transaction(|store| {
            let Some(mut conference) = store.get_conference(key)? else {
                return Ok(RegistrationOutcome::NotFound);
            };
            let mut profile = load_or_default_profile(store, user_id, email)?;

            if !profile.remove_conference_key(key) {
                return Ok(RegistrationOutcome::NotRegistered);
            }
            conference.give_back_seats(1);

            store.save_profile(&profile)?;
            store.save_conference(&conference)?;
            Ok(RegistrationOutcome::Success)
        });

        finish("conference_unregister", user_id, key, result, started_at)
    }
}

fn finish<E: Display>(
    event: &str,
    user_id: &str,
    key: &ConferenceKey,
    result: Result<RegistrationOutcome, E>,
    started_at: Instant,
) -> RegistrationOutcome {
    match result {
        Ok(outcome) => {
            let status = if outcome.is_success() { "ok" } else { "rejected" };
            info!(
                "event={} module=service status={} outcome={} user_id={} conference_id={} duration_ms={}",
                event,
                status,
                outcome,
                user_id,
                key.id(),
                started_at.elapsed().as_millis()
            );
            outcome
        }
        Err(err) => {
            error!(
                "event={} module=service status=error outcome={} user_id={} conference_id={} duration_ms={} error={}",
                event,
                RegistrationOutcome::UnknownError,
                user_id,
                key.id(),
                started_at.elapsed().as_millis(),
                err
            );
            RegistrationOutcome::UnknownError
        }
    }
}
