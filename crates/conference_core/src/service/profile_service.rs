//! Profile use-case service.
//!
//! # Responsibility
//! - Provide get-or-create and upsert semantics for a user's Profile.
//!
//! # Invariants
//! - `get_or_create` never writes; callers persist as part of their own
//!   transaction.
//! - `upsert` only overwrites fields the form actually supplies.

use crate::model::profile::{Profile, TeeShirtSize};
use crate::repo::store::{EntityStore, RepoResult};
use log::info;
use serde::{Deserialize, Serialize};

/// Caller-editable profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    pub display_name: Option<String>,
    pub tee_shirt_size: Option<TeeShirtSize>,
}

/// Profile service facade over an entity store.
pub struct ProfileService<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> ProfileService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the stored profile, if any.
    pub fn get(&self, user_id: &str) -> RepoResult<Option<Profile>> {
        self.store.get_profile(user_id)
    }

    /// Loads the stored profile or builds an unsaved default one.
    pub fn get_or_create(&self, user_id: &str, email: &str) -> RepoResult<Profile> {
        load_or_default_profile(&self.store, user_id, email)
    }

    /// Creates or updates the caller's profile and persists it immediately.
    pub fn upsert(&self, user_id: &str, email: &str, form: &ProfileForm) -> RepoResult<Profile> {
        let existing = self.store.get_profile(user_id)?;
        let created = existing.is_none();
        let mut profile = existing.unwrap_or_else(|| Profile::new_default(user_id, email));
        profile.update(form.display_name.as_deref(), form.tee_shirt_size);

        self.store.save_profile(&profile)?;
        info!(
            "event=profile_save module=service status=ok user_id={} created={}",
            user_id, created
        );
        Ok(profile)
    }
}

/// Store-level get-or-default used inside larger transactions.
pub(crate) fn load_or_default_profile<S: EntityStore>(
    store: &S,
    user_id: &str,
    email: &str,
) -> RepoResult<Profile> {
    Ok(store
        .get_profile(user_id)?
        .unwrap_or_else(|| Profile::new_default(user_id, email)))
}
