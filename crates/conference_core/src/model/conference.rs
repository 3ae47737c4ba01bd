//! Conference domain model.
//!
//! # Responsibility
//! - Define the conference entity and the form it is created from.
//! - Own seat accounting helpers used by the registration engine.
//!
//! # Invariants
//! - `0 <= seats_available <= max_attendees`.
//! - `month` is derived from `start_date` and never set independently.
//! - `end_date` is not earlier than `start_date` when both are set.

use crate::model::key::ConferenceKey;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures for conference state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConferenceValidationError {
    /// Name is empty after trim.
    BlankName,
    /// `end_date` precedes `start_date`.
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    /// Seat counter exceeds capacity.
    SeatsExceedCapacity {
        seats_available: u32,
        max_attendees: u32,
    },
}

impl Display for ConferenceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "conference name must not be blank"),
            Self::EndBeforeStart { start, end } => {
                write!(f, "conference end date {end} is before start date {start}")
            }
            Self::SeatsExceedCapacity {
                seats_available,
                max_attendees,
            } => write!(
                f,
                "seats available {seats_available} exceeds max attendees {max_attendees}"
            ),
        }
    }
}

impl Error for ConferenceValidationError {}

/// Seat booking failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotEnoughSeats {
    pub requested: u32,
    pub available: u32,
}

impl Display for NotEnoughSeats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requested {} seats but only {} available",
            self.requested, self.available
        )
    }
}

impl Error for NotEnoughSeats {}

/// Caller-supplied conference attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConferenceForm {
    pub name: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub city: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_attendees: u32,
}

/// Conference entity, child of its organizer's Profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conference {
    /// Serialized as the websafe key string.
    #[serde(rename = "websafeKey")]
    pub key: ConferenceKey,
    pub name: String,
    pub description: Option<String>,
    /// Copied from the organizer Profile at creation time.
    pub organizer_display_name: Option<String>,
    pub topics: Vec<String>,
    pub city: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// 1-12, derived from `start_date`.
    pub month: Option<u32>,
    pub max_attendees: u32,
    pub seats_available: u32,
}

impl Conference {
    /// Builds a new conference from form input with all seats open.
    pub fn from_form(
        key: ConferenceKey,
        organizer_display_name: Option<String>,
        form: &ConferenceForm,
    ) -> Result<Self, ConferenceValidationError> {
        let conference = Self {
            key,
            name: form.name.trim().to_string(),
            description: normalize_optional_text(form.description.as_deref()),
            organizer_display_name,
            topics: normalize_topics(&form.topics),
            city: normalize_optional_text(form.city.as_deref()),
            start_date: form.start_date,
            end_date: form.end_date,
            month: form.start_date.map(|date| date.month()),
            max_attendees: form.max_attendees,
            seats_available: form.max_attendees,
        };
        conference.validate()?;
        Ok(conference)
    }

    /// User id of the organizer that owns this conference.
    pub fn organizer_user_id(&self) -> &str {
        self.key.owner_user_id()
    }

    /// Validates entity invariants.
    pub fn validate(&self) -> Result<(), ConferenceValidationError> {
        if self.name.trim().is_empty() {
            return Err(ConferenceValidationError::BlankName);
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ConferenceValidationError::EndBeforeStart { start, end });
            }
        }
        if self.seats_available > self.max_attendees {
            return Err(ConferenceValidationError::SeatsExceedCapacity {
                seats_available: self.seats_available,
                max_attendees: self.max_attendees,
            });
        }
        Ok(())
    }

    /// Takes `count` seats, refusing to go below zero.
    pub fn book_seats(&mut self, count: u32) -> Result<(), NotEnoughSeats> {
        if count > self.seats_available {
            return Err(NotEnoughSeats {
                requested: count,
                available: self.seats_available,
            });
        }
        self.seats_available -= count;
        Ok(())
    }

    /// Returns `count` seats, capped at `max_attendees`.
    pub fn give_back_seats(&mut self, count: u32) {
        self.seats_available = self
            .seats_available
            .saturating_add(count)
            .min(self.max_attendees);
    }
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Trims topics, drops blanks and keeps the first occurrence of duplicates.
pub fn normalize_topics(topics: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(topics.len());
    for topic in topics {
        let trimmed = topic.trim();
        if trimmed.is_empty() || normalized.iter().any(|seen| seen == trimmed) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}
