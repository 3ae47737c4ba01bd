//! Conference entity key and its websafe string form.
//!
//! # Responsibility
//! - Identify a conference by `(owner user id, owner-scoped numeric id)`.
//! - Encode/decode the opaque websafe string handed to API callers.
//!
//! # Invariants
//! - `ConferenceKey::parse_websafe(key.to_websafe()) == Ok(key)` for every key.
//! - The owner id is the conference's transactional parent (its organizer
//!   Profile).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Externally issued, opaque user identifier.
pub type UserId = String;

// Greedy owner capture so owner ids may contain `/` or `:`. Any owner and
// any `i64` id encode, so every key parses back.
static RAW_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Profile:(?s)(.*)/Conference:(-?[0-9]+)$").expect("valid conference key regex")
});

/// Failure to decode a websafe conference key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    /// Input is not URL-safe base64.
    Encoding(String),
    /// Decoded bytes are not UTF-8.
    NotUtf8,
    /// Decoded text does not follow the `Profile:<owner>/Conference:<id>` grammar.
    Grammar(String),
    /// Numeric id does not fit into the id space.
    IdOutOfRange(String),
}

impl Display for KeyParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encoding(value) => write!(f, "conference key `{value}` is not websafe base64"),
            Self::NotUtf8 => write!(f, "conference key does not decode to UTF-8"),
            Self::Grammar(value) => write!(f, "malformed conference key `{value}`"),
            Self::IdOutOfRange(value) => write!(f, "conference id `{value}` is out of range"),
        }
    }
}

impl Error for KeyParseError {}

/// Key of one conference entity, scoped under its organizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConferenceKey {
    owner_user_id: UserId,
    id: i64,
}

impl ConferenceKey {
    /// Builds a key from its parts. Ids are allocated by the entity store.
    pub fn new(owner_user_id: impl Into<UserId>, id: i64) -> Self {
        Self {
            owner_user_id: owner_user_id.into(),
            id,
        }
    }

    /// User id of the organizer Profile this conference belongs to.
    pub fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    /// Numeric id, unique within the owner's id space only.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Encodes this key into its opaque websafe string.
    pub fn to_websafe(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.raw_form())
    }

    /// Decodes a websafe string produced by [`ConferenceKey::to_websafe`].
    pub fn parse_websafe(value: &str) -> Result<Self, KeyParseError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(value.trim())
            .map_err(|_| KeyParseError::Encoding(value.to_string()))?;
        let raw = String::from_utf8(bytes).map_err(|_| KeyParseError::NotUtf8)?;
        let captures = RAW_KEY_RE
            .captures(&raw)
            .ok_or_else(|| KeyParseError::Grammar(raw.clone()))?;

        let owner = &captures[1];
        let id_text = &captures[2];
        let id = id_text
            .parse::<i64>()
            .map_err(|_| KeyParseError::IdOutOfRange(id_text.to_string()))?;
        Ok(Self::new(owner, id))
    }

    fn raw_form(&self) -> String {
        format!("Profile:{}/Conference:{}", self.owner_user_id, self.id)
    }
}

impl Display for ConferenceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_websafe())
    }
}

impl FromStr for ConferenceKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_websafe(s)
    }
}

impl Serialize for ConferenceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_websafe())
    }
}

impl<'de> Deserialize<'de> for ConferenceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse_websafe(&value).map_err(D::Error::custom)
    }
}
