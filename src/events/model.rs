use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const LISTING_EMPTY_MESSAGE: &str = "Nie znaleziono żadnych wydarzeń.";
pub const EVENT_NOT_FOUND_MESSAGE: &str = "Nie znaleziono wydarzenia";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDateTime,
    pub description: String,
    pub image: String,
    pub event_type: EventType,
    pub phone: String,
    pub email: String,
    pub location: String,
}

impl Event {
    pub fn new(id: String, draft: ValidEventDraft) -> Self {
        Self {
            id,
            title: draft.title,
            date: draft.date,
            description: draft.description,
            image: draft.image.uri,
            event_type: draft.event_type,
            phone: draft.phone,
            email: draft.email,
            location: draft.location,
        }
    }
}

#[derive(strum::EnumString, strum::Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Sport,
    Culture,
    Health,
}

impl EventType {
    /// Polish label shown on event cards
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Sport => "Sport",
            EventType::Culture => "Kultura",
            EventType::Health => "Zdrowie",
        }
    }
}

/// A file picked in the form. Only the declared media type is checked, the
/// bytes behind `uri` are never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub file_name: String,
    pub media_type: String,
    pub uri: String,
}

impl ImageArtifact {
    pub fn new(file_name: &str, media_type: &str, uri: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            media_type: media_type.to_string(),
            uri: uri.to_string(),
        }
    }
}

/// Raw form input, kept exactly as typed until validation succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub date: String,
    pub description: String,
    pub image: Vec<ImageArtifact>,
    pub event_type: String,
    pub phone: String,
    pub email: String,
    pub location: String,
}

impl EventDraft {
    pub fn is_empty(&self) -> bool {
        *self == EventDraft::default()
    }

    /// Updates one text field. Images are set with [`EventDraft::image`] directly.
    pub fn set(&mut self, field: DraftField, value: &str) {
        let target = match field {
            DraftField::Title => &mut self.title,
            DraftField::Date => &mut self.date,
            DraftField::Description => &mut self.description,
            DraftField::Type => &mut self.event_type,
            DraftField::Phone => &mut self.phone,
            DraftField::Email => &mut self.email,
            DraftField::Location => &mut self.location,
            DraftField::Image => return,
        };

        *target = value.to_string();
    }
}

/// A draft that passed every rule of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEventDraft {
    pub title: String,
    pub date: NaiveDateTime,
    pub description: String,
    pub image: ImageArtifact,
    pub event_type: EventType,
    pub phone: String,
    pub email: String,
    pub location: String,
}

#[derive(strum::Display, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    Title,
    Date,
    Description,
    Image,
    Type,
    Phone,
    Email,
    Location,
}

/// Accepts what a datetime-local input produces, with or without seconds,
/// and RFC 3339 timestamps (offset dropped).
pub fn parse_event_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|date| date.naive_local())
        })
}
