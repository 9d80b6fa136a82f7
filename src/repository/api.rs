use crate::events::model::{Event, ValidEventDraft};
use async_trait::async_trait;
use thiserror::Error;

/// Remote store of events. Transport, auth and encoding live behind this
/// trait; the catalog only awaits the calls.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError>;

    /// `Ok(None)` when no event has this id
    async fn get_event(&self, id: &str) -> Result<Option<Event>, RepositoryError>;

    /// Persists the draft and returns it with its assigned id. Never retried
    /// by callers, a repeated call creates a second event.
    async fn create_event(&self, draft: &ValidEventDraft) -> Result<Event, RepositoryError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("write rejected: {0}")]
    Rejected(String),
}
