//! Entity store contract and its SQLite implementation.
//!
//! # Responsibility
//! - Expose key-addressed get/get-many/save for profiles and conferences.
//! - Allocate conference ids scoped to the organizer.
//! - Run caller work inside one atomic transaction.
//!
//! # Invariants
//! - Each `save_*` call is atomic on its own (entity row plus child rows).
//! - Work passed to `run_in_transaction` commits fully or not at all.
//! - SQLite transactions are started `IMMEDIATE`, so concurrent writers
//!   serialize on the database write lock before reading any entity.

use crate::db::DbError;
use crate::model::conference::{Conference, ConferenceValidationError};
use crate::model::key::{ConferenceKey, UserId};
use crate::model::profile::Profile;
use crate::repo::conference_repo::{self, ConferenceQuery};
use crate::repo::profile_repo;
use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity store error.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite failure, including lock timeouts.
    Db(DbError),
    /// Entity rejected before persistence.
    Validation(ConferenceValidationError),
    /// Persisted row cannot be converted into a valid entity.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entity data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ConferenceValidationError> for RepoError {
    fn from(value: ConferenceValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Keyed, transactional persistence for profiles and conferences.
pub trait EntityStore {
    /// Loads one profile by user id.
    fn get_profile(&self, user_id: &str) -> RepoResult<Option<Profile>>;
    /// Loads several profiles; absent ids are omitted from the map.
    fn get_profiles(&self, user_ids: &[UserId]) -> RepoResult<BTreeMap<UserId, Profile>>;
    /// Inserts or replaces one profile, including its registration list.
    fn save_profile(&self, profile: &Profile) -> RepoResult<()>;
    /// Loads one conference by key.
    fn get_conference(&self, key: &ConferenceKey) -> RepoResult<Option<Conference>>;
    /// Loads several conferences in request order; absent keys are skipped.
    fn get_conferences(&self, keys: &[ConferenceKey]) -> RepoResult<Vec<Conference>>;
    /// Inserts or replaces one conference, including its topics.
    fn save_conference(&self, conference: &Conference) -> RepoResult<()>;
    /// Allocates the next conference key under `owner_user_id`.
    fn allocate_conference_id(&self, owner_user_id: &str) -> RepoResult<ConferenceKey>;
    /// Lists conferences whose parent is `owner_user_id`, by name ascending.
    fn list_conferences_by_owner(&self, owner_user_id: &str) -> RepoResult<Vec<Conference>>;
    /// Returns conferences matching every filter in `query`, unordered.
    fn query_conferences(&self, query: &ConferenceQuery) -> RepoResult<Vec<Conference>>;
    /// Runs `work` atomically.
    ///
    /// `Ok` commits every write issued by `work`; `Err` rolls all of them
    /// back. Calls must not nest.
    fn run_in_transaction<T, F>(&self, work: F) -> RepoResult<T>
    where
        F: FnOnce(&Self) -> RepoResult<T>;
}

/// SQLite-backed entity store bound to one connection.
#[derive(Clone, Copy)]
pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    /// Wraps a migrated connection (see `db::open_db`).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn get_profile(&self, user_id: &str) -> RepoResult<Option<Profile>> {
        profile_repo::load_profile(self.conn, user_id)
    }

    fn get_profiles(&self, user_ids: &[UserId]) -> RepoResult<BTreeMap<UserId, Profile>> {
        let mut profiles = BTreeMap::new();
        for user_id in user_ids {
            if profiles.contains_key(user_id) {
                continue;
            }
            if let Some(profile) = profile_repo::load_profile(self.conn, user_id)? {
                profiles.insert(user_id.clone(), profile);
            }
        }
        Ok(profiles)
    }

    fn save_profile(&self, profile: &Profile) -> RepoResult<()> {
        with_savepoint(self.conn, "save_profile", |conn| {
            profile_repo::upsert_profile(conn, profile)
        })
    }

    fn get_conference(&self, key: &ConferenceKey) -> RepoResult<Option<Conference>> {
        conference_repo::load_conference(self.conn, key)
    }

    fn get_conferences(&self, keys: &[ConferenceKey]) -> RepoResult<Vec<Conference>> {
        let mut conferences = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(conference) = conference_repo::load_conference(self.conn, key)? {
                conferences.push(conference);
            }
        }
        Ok(conferences)
    }

    fn save_conference(&self, conference: &Conference) -> RepoResult<()> {
        conference.validate()?;
        with_savepoint(self.conn, "save_conference", |conn| {
            conference_repo::upsert_conference(conn, conference)
        })
    }

    fn allocate_conference_id(&self, owner_user_id: &str) -> RepoResult<ConferenceKey> {
        conference_repo::allocate_id(self.conn, owner_user_id)
    }

    fn list_conferences_by_owner(&self, owner_user_id: &str) -> RepoResult<Vec<Conference>> {
        conference_repo::list_by_owner(self.conn, owner_user_id)
    }

    fn query_conferences(&self, query: &ConferenceQuery) -> RepoResult<Vec<Conference>> {
        conference_repo::query(self.conn, query)
    }

    fn run_in_transaction<T, F>(&self, work: F) -> RepoResult<T>
    where
        F: FnOnce(&Self) -> RepoResult<T>,
    {
        // Dropping `tx` without commit rolls back.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let value = work(self)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Runs `work` inside a named savepoint so multi-statement entity writes stay
/// atomic both inside and outside an enclosing transaction.
fn with_savepoint<T>(
    conn: &Connection,
    name: &str,
    work: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    conn.execute_batch(&format!("SAVEPOINT {name};"))?;
    match work(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name};"))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) =
                conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name};"))
            {
                warn!(
                    "event=savepoint_rollback module=repo status=error savepoint={} error={} cause={}",
                    name, rollback_err, err
                );
            }
            Err(err)
        }
    }
}
