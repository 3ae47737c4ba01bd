//! Profile domain model.
//!
//! # Responsibility
//! - Hold per-user attendee data and the ordered registration key list.
//! - Provide the defaulting rules used when a Profile is created lazily.
//!
//! # Invariants
//! - `user_id` maps to at most one Profile.
//! - `conference_keys_to_attend` never contains duplicates; order is
//!   registration order.

use crate::model::key::{ConferenceKey, UserId};
use serde::{Deserialize, Serialize};

/// Tee-shirt size preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeeShirtSize {
    #[default]
    NotSpecified,
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
    Xxxl,
}

impl TeeShirtSize {
    /// Storage token for this size.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::NotSpecified => "not_specified",
            Self::Xs => "xs",
            Self::S => "s",
            Self::M => "m",
            Self::L => "l",
            Self::Xl => "xl",
            Self::Xxl => "xxl",
            Self::Xxxl => "xxxl",
        }
    }

    /// Parses a storage token produced by [`TeeShirtSize::as_db_str`].
    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "not_specified" => Some(Self::NotSpecified),
            "xs" => Some(Self::Xs),
            "s" => Some(Self::S),
            "m" => Some(Self::M),
            "l" => Some(Self::L),
            "xl" => Some(Self::Xl),
            "xxl" => Some(Self::Xxl),
            "xxxl" => Some(Self::Xxxl),
            _ => None,
        }
    }
}

/// Attendee profile keyed by the externally issued user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub main_email: String,
    pub tee_shirt_size: TeeShirtSize,
    /// Registration order is preserved; membership is the attendance relation.
    pub conference_keys_to_attend: Vec<ConferenceKey>,
}

impl Profile {
    /// Builds the Profile used when a user has never saved one.
    ///
    /// The display name is derived from `email`, see
    /// [`default_display_name_from_email`].
    pub fn new_default(user_id: impl Into<UserId>, email: impl Into<String>) -> Self {
        let main_email = email.into();
        Self {
            user_id: user_id.into(),
            display_name: default_display_name_from_email(&main_email),
            main_email,
            tee_shirt_size: TeeShirtSize::NotSpecified,
            conference_keys_to_attend: Vec::new(),
        }
    }

    /// Applies mutable profile fields.
    ///
    /// Blank display names and `None` sizes leave the current value in place.
    pub fn update(&mut self, display_name: Option<&str>, tee_shirt_size: Option<TeeShirtSize>) {
        if let Some(name) = display_name.map(str::trim).filter(|name| !name.is_empty()) {
            self.display_name = name.to_string();
        }
        if let Some(size) = tee_shirt_size {
            self.tee_shirt_size = size;
        }
    }

    pub fn is_registered_for(&self, key: &ConferenceKey) -> bool {
        self.conference_keys_to_attend.contains(key)
    }

    /// Appends `key` to the registration list.
    ///
    /// Returns `false` and leaves the list untouched when already present.
    pub fn add_conference_key(&mut self, key: ConferenceKey) -> bool {
        if self.is_registered_for(&key) {
            return false;
        }
        self.conference_keys_to_attend.push(key);
        true
    }

    /// Removes `key` from the registration list, returning whether it was present.
    pub fn remove_conference_key(&mut self, key: &ConferenceKey) -> bool {
        let before = self.conference_keys_to_attend.len();
        self.conference_keys_to_attend
            .retain(|existing| existing != key);
        before != self.conference_keys_to_attend.len()
    }
}

/// Derives a display name from the local part of an email address.
///
/// `lemoncake@example.com` becomes `lemoncake`. An address without `@`
/// yields the whole trimmed input.
pub fn default_display_name_from_email(email: &str) -> String {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, _)) => local.to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{default_display_name_from_email, Profile, TeeShirtSize};
    use crate::model::key::ConferenceKey;

    #[test]
    fn display_name_defaults_to_email_local_part() {
        assert_eq!(default_display_name_from_email("a@example.com"), "a");
        assert_eq!(default_display_name_from_email("first.last@x@y"), "first.last");
        assert_eq!(default_display_name_from_email("no-at-sign"), "no-at-sign");
        assert_eq!(default_display_name_from_email(""), "");
    }

    #[test]
    fn update_ignores_blank_name_and_missing_size() {
        let mut profile = Profile::new_default("u1", "lemon@example.com");
        profile.update(Some("   "), None);
        assert_eq!(profile.display_name, "lemon");
        assert_eq!(profile.tee_shirt_size, TeeShirtSize::NotSpecified);

        profile.update(Some(" Lemon Cake "), Some(TeeShirtSize::Xl));
        assert_eq!(profile.display_name, "Lemon Cake");
        assert_eq!(profile.tee_shirt_size, TeeShirtSize::Xl);
    }

    #[test]
    fn conference_keys_behave_as_ordered_set() {
        let mut profile = Profile::new_default("u1", "u1@example.com");
        let first = ConferenceKey::new("owner", 1);
        let second = ConferenceKey::new("owner", 2);

        assert!(profile.add_conference_key(first.clone()));
        assert!(profile.add_conference_key(second.clone()));
        assert!(!profile.add_conference_key(first.clone()));
        assert_eq!(profile.conference_keys_to_attend, vec![first.clone(), second.clone()]);

        assert!(profile.remove_conference_key(&first));
        assert!(!profile.remove_conference_key(&first));
        assert_eq!(profile.conference_keys_to_attend, vec![second]);
    }

    #[test]
    fn tee_shirt_size_db_tokens_are_stable() {
        for size in [
            TeeShirtSize::NotSpecified,
            TeeShirtSize::Xs,
            TeeShirtSize::M,
            TeeShirtSize::Xxxl,
        ] {
            assert_eq!(TeeShirtSize::from_db_str(size.as_db_str()), Some(size));
        }
        assert_eq!(TeeShirtSize::from_db_str("XL"), None);
    }
}
