use super::model::{parse_event_date, Event, EventType};
use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

// Older exports carry the field as "desctription", both spellings map to `description`
#[derive(Debug, Deserialize)]
pub struct EventRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDateTime,
    #[serde(alias = "desctription")]
    pub description: String,
    pub image: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub phone: String,
    pub email: String,
    pub location: String,
}

impl EventRecord {
    pub fn to_model(self) -> Event {
        Event {
            id: self.id,
            title: self.title,
            date: self.date,
            description: self.description,
            image: self.image,
            event_type: self.event_type,
            phone: self.phone,
            email: self.email,
            location: self.location,
        }
    }
}

pub fn parse_events(json: &str) -> serde_json::Result<Vec<Event>> {
    let records = serde_json::from_str::<Vec<EventRecord>>(json)?;

    Ok(records.into_iter().map(EventRecord::to_model).collect())
}

fn deserialize_id<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(d)? {
        Value::String(s) if !s.is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        unknown => Err(de::Error::custom(format!("invalid event id: {}", unknown))),
    }
}

fn deserialize_date<'de, D>(d: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;

    parse_event_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid event date: {}", raw)))
}
