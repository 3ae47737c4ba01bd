//! Profile row mapping for the SQLite entity store.
//!
//! # Invariants
//! - The registration list is stored in `profile_registrations` with a dense
//!   `position` so load order equals registration order.
//! - Upserts replace the whole registration list.

use crate::model::key::ConferenceKey;
use crate::model::profile::{Profile, TeeShirtSize};
use crate::repo::store::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

pub(crate) fn load_profile(conn: &Connection, user_id: &str) -> RepoResult<Option<Profile>> {
    let row = conn
        .query_row(
            "SELECT
                user_id,
                display_name,
                main_email,
                tee_shirt_size
             FROM profiles
             WHERE user_id = ?1;",
            [user_id],
            |row| {
                Ok((
                    row.get::<_, String>("user_id")?,
                    row.get::<_, String>("display_name")?,
                    row.get::<_, String>("main_email")?,
                    row.get::<_, String>("tee_shirt_size")?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, display_name, main_email, size_text)) = row else {
        return Ok(None);
    };

    let tee_shirt_size = TeeShirtSize::from_db_str(&size_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid tee shirt size `{size_text}` in profiles.tee_shirt_size"
        ))
    })?;
    let conference_keys_to_attend = load_registration_keys(conn, &user_id)?;

    Ok(Some(Profile {
        user_id,
        display_name,
        main_email,
        tee_shirt_size,
        conference_keys_to_attend,
    }))
}

pub(crate) fn upsert_profile(conn: &Connection, profile: &Profile) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO profiles (
            user_id,
            display_name,
            main_email,
            tee_shirt_size
        ) VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(user_id) DO UPDATE SET
            display_name = excluded.display_name,
            main_email = excluded.main_email,
            tee_shirt_size = excluded.tee_shirt_size,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            profile.user_id.as_str(),
            profile.display_name.as_str(),
            profile.main_email.as_str(),
            profile.tee_shirt_size.as_db_str(),
        ],
    )?;

    conn.execute(
        "DELETE FROM profile_registrations WHERE user_id = ?1;",
        [profile.user_id.as_str()],
    )?;
    for (position, key) in profile.conference_keys_to_attend.iter().enumerate() {
        conn.execute(
            "INSERT INTO profile_registrations (user_id, position, conference_key)
             VALUES (?1, ?2, ?3);",
            params![profile.user_id.as_str(), position as i64, key.to_websafe()],
        )?;
    }

    Ok(())
}

fn load_registration_keys(conn: &Connection, user_id: &str) -> RepoResult<Vec<ConferenceKey>> {
    let mut stmt = conn.prepare(
        "SELECT conference_key
         FROM profile_registrations
         WHERE user_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([user_id])?;
    let mut keys = Vec::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        let key = ConferenceKey::parse_websafe(&text).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid key `{text}` in profile_registrations.conference_key: {err}"
            ))
        })?;
        keys.push(key);
    }
    Ok(keys)
}
