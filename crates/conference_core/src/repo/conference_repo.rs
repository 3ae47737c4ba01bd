//! Conference row mapping, id allocation and attribute queries.
//!
//! # Invariants
//! - Ids are allocated from `conference_id_sequences`, one sequence per owner.
//! - Topics are stored in `conference_topics` in form order.
//! - `query` applies filters only; ordering is the caller's concern.

use crate::model::conference::Conference;
use crate::model::key::ConferenceKey;
use crate::repo::store::{RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};

const CONFERENCE_SELECT_SQL: &str = "SELECT
    owner_user_id,
    conference_id,
    name,
    description,
    organizer_display_name,
    city,
    start_date,
    end_date,
    month,
    max_attendees,
    seats_available
FROM conferences";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Attribute filters for conference queries. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceQuery {
    /// Exact city match.
    pub city: Option<String>,
    /// Exact start month (1-12).
    pub month: Option<u32>,
    /// Conference must list this topic.
    pub topic: Option<String>,
    /// Inclusive lower bound on `seats_available`.
    pub min_seats_available: Option<u32>,
}

pub(crate) fn allocate_id(conn: &Connection, owner_user_id: &str) -> RepoResult<ConferenceKey> {
    let id: i64 = conn.query_row(
        "INSERT INTO conference_id_sequences (owner_user_id, last_id)
         VALUES (?1, 1)
         ON CONFLICT(owner_user_id) DO UPDATE SET last_id = last_id + 1
         RETURNING last_id;",
        [owner_user_id],
        |row| row.get(0),
    )?;
    Ok(ConferenceKey::new(owner_user_id, id))
}

pub(crate) fn load_conference(
    conn: &Connection,
    key: &ConferenceKey,
) -> RepoResult<Option<Conference>> {
    let mut stmt = conn.prepare(&format!(
        "{CONFERENCE_SELECT_SQL}
         WHERE owner_user_id = ?1
           AND conference_id = ?2;"
    ))?;
    let mut rows = stmt.query(params![key.owner_user_id(), key.id()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_conference_row(conn, row)?));
    }
    Ok(None)
}

pub(crate) fn upsert_conference(conn: &Connection, conference: &Conference) -> RepoResult<()> {
    let key = &conference.key;
    conn.execute(
        "INSERT INTO conferences (
            owner_user_id,
            conference_id,
            name,
            description,
            organizer_display_name,
            city,
            start_date,
            end_date,
            month,
            max_attendees,
            seats_available
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(owner_user_id, conference_id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            organizer_display_name = excluded.organizer_display_name,
            city = excluded.city,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            month = excluded.month,
            max_attendees = excluded.max_attendees,
            seats_available = excluded.seats_available,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            key.owner_user_id(),
            key.id(),
            conference.name.as_str(),
            conference.description.as_deref(),
            conference.organizer_display_name.as_deref(),
            conference.city.as_deref(),
            conference.start_date.map(format_date),
            conference.end_date.map(format_date),
            conference.month,
            conference.max_attendees,
            conference.seats_available,
        ],
    )?;

    conn.execute(
        "DELETE FROM conference_topics
         WHERE owner_user_id = ?1
           AND conference_id = ?2;",
        params![key.owner_user_id(), key.id()],
    )?;
    for (position, topic) in conference.topics.iter().enumerate() {
        conn.execute(
            "INSERT INTO conference_topics (owner_user_id, conference_id, position, topic)
             VALUES (?1, ?2, ?3, ?4);",
            params![key.owner_user_id(), key.id(), position as i64, topic.as_str()],
        )?;
    }

    Ok(())
}

pub(crate) fn list_by_owner(conn: &Connection, owner_user_id: &str) -> RepoResult<Vec<Conference>> {
    let mut stmt = conn.prepare(&format!(
        "{CONFERENCE_SELECT_SQL}
         WHERE owner_user_id = ?1
         ORDER BY name ASC, conference_id ASC;"
    ))?;
    let mut rows = stmt.query([owner_user_id])?;
    let mut conferences = Vec::new();
    while let Some(row) = rows.next()? {
        conferences.push(parse_conference_row(conn, row)?);
    }
    Ok(conferences)
}

pub(crate) fn query(conn: &Connection, query: &ConferenceQuery) -> RepoResult<Vec<Conference>> {
    let mut sql = format!("{CONFERENCE_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(city) = query.city.as_ref() {
        sql.push_str(" AND city = ?");
        bind_values.push(Value::Text(city.clone()));
    }

    if let Some(month) = query.month {
        sql.push_str(" AND month = ?");
        bind_values.push(Value::Integer(i64::from(month)));
    }

    if let Some(topic) = query.topic.as_ref() {
        sql.push_str(
            " AND EXISTS (
                SELECT 1
                FROM conference_topics ct
                WHERE ct.owner_user_id = conferences.owner_user_id
                  AND ct.conference_id = conferences.conference_id
                  AND ct.topic = ?
            )",
        );
        bind_values.push(Value::Text(topic.clone()));
    }

    if let Some(min_seats) = query.min_seats_available {
        sql.push_str(" AND seats_available >= ?");
        bind_values.push(Value::Integer(i64::from(min_seats)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut conferences = Vec::new();
    while let Some(row) = rows.next()? {
        conferences.push(parse_conference_row(conn, row)?);
    }
    Ok(conferences)
}

fn parse_conference_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Conference> {
    let key = ConferenceKey::new(
        row.get::<_, String>("owner_user_id")?,
        row.get::<_, i64>("conference_id")?,
    );

    let start_date = parse_optional_date(row.get("start_date")?, "start_date")?;
    let end_date = parse_optional_date(row.get("end_date")?, "end_date")?;
    let topics = load_topics(conn, &key)?;

    let conference = Conference {
        name: row.get("name")?,
        description: row.get("description")?,
        organizer_display_name: row.get("organizer_display_name")?,
        topics,
        city: row.get("city")?,
        start_date,
        end_date,
        month: row.get("month")?,
        max_attendees: row.get("max_attendees")?,
        seats_available: row.get("seats_available")?,
        key,
    };
    conference
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("conference {}: {err}", conference.key)))?;
    Ok(conference)
}

fn load_topics(conn: &Connection, key: &ConferenceKey) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT topic
         FROM conference_topics
         WHERE owner_user_id = ?1
           AND conference_id = ?2
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query(params![key.owner_user_id(), key.id()])?;
    let mut topics = Vec::new();
    while let Some(row) = rows.next()? {
        topics.push(row.get(0)?);
    }
    Ok(topics)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_optional_date(value: Option<String>, column: &str) -> RepoResult<Option<NaiveDate>> {
    value
        .map(|text| {
            NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|_| {
                RepoError::InvalidData(format!("invalid date `{text}` in conferences.{column}"))
            })
        })
        .transpose()
}
