use super::api::{EventRepository, RepositoryError};
use crate::draft::validation::validate_event;
use crate::events::dto::parse_events;
use crate::events::model::{Event, ValidEventDraft};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

const BUNDLED_EVENTS: &str = include_str!("../../data/events.json");

/// Event store kept in process memory. Every call waits `latency` first so
/// callers see the same suspension a remote service would cause.
pub struct InMemoryEventRepository {
    events: RwLock<Vec<Event>>,
    latency: Duration,
}

impl InMemoryEventRepository {
    /// Store holding `events` as given. Seeds read from JSON go through
    /// [`InMemoryEventRepository::with_bundled_events`] or
    /// [`InMemoryEventRepository::from_seed_file`], which check them first.
    pub fn new(events: Vec<Event>, latency: Duration) -> Self {
        Self {
            events: RwLock::new(events),
            latency,
        }
    }

    pub fn with_bundled_events(latency: Duration) -> Result<Self, RepositoryError> {
        let events = parse_seed(BUNDLED_EVENTS)?;

        Ok(Self::new(events, latency))
    }

    #[instrument(skip(path, latency), fields(path = %path.display()))]
    pub async fn from_seed_file(path: &Path, latency: Duration) -> Result<Self, RepositoryError> {
        let json = tokio::fs::read_to_string(path).await.map_err(|err| {
            error!("Failed to read seed file: {}", err);
            RepositoryError::Unavailable(err.to_string())
        })?;
        let events = parse_seed(&json)?;

        info!("Loaded {} events", events.len());

        Ok(Self::new(events, latency))
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

/// Seed events must hold to the same rules as created ones
fn parse_seed(json: &str) -> Result<Vec<Event>, RepositoryError> {
    let events = parse_events(json).map_err(|err| {
        error!("Seed parse failed: {:?}", err);
        RepositoryError::InvalidResponse(err.to_string())
    })?;

    for event in &events {
        validate_event(event).map_err(|errors| {
            error!(id = %event.id, "Seed event is invalid: {}", errors);
            RepositoryError::InvalidResponse(format!("event {}: {}", event.id, errors))
        })?;
    }

    Ok(events)
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    #[instrument(skip(self))]
    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError> {
        self.wait().await;

        let events = self.events.read().await.clone();

        debug!("Listing {} events", events.len());

        Ok(events)
    }

    #[instrument(skip(self))]
    async fn get_event(&self, id: &str) -> Result<Option<Event>, RepositoryError> {
        self.wait().await;

        let event = self
            .events
            .read()
            .await
            .iter()
            .find(|event| event.id == id)
            .cloned();

        if event.is_none() {
            debug!("No event with this id");
        }

        Ok(event)
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    async fn create_event(&self, draft: &ValidEventDraft) -> Result<Event, RepositoryError> {
        self.wait().await;

        let event = Event::new(Uuid::new_v4().to_string(), draft.clone());

        self.events.write().await.push(event.clone());

        info!(id = %event.id, "Created event");

        Ok(event)
    }
}
