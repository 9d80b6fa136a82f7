use super::validation::{validate_draft, ValidationErrors};
use crate::events::model::{DraftField, Event, EventDraft, ImageArtifact, ValidEventDraft};
use crate::events::routes::{Route, EVENTS_KEY};
use crate::fetch::controller::FetchController;
use crate::repository::api::{EventRepository, RepositoryError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const SUBMIT_FAILED_MESSAGE: &str = "Nie udało się dodać wydarzenia. Spróbuj ponownie.";

/// Moves the user between views. Resolving routes is up to the host.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    Editing,
    Submitting,
    Failed(String),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("draft is invalid: {0}")]
    Invalid(ValidationErrors),
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("{}", SUBMIT_FAILED_MESSAGE)]
    Repository(#[source] RepositoryError),
}

#[derive(Debug)]
struct FormState {
    draft: EventDraft,
    errors: ValidationErrors,
    status: SubmitStatus,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            draft: EventDraft::default(),
            errors: ValidationErrors::default(),
            status: SubmitStatus::Editing,
        }
    }
}

/// State behind the "add event" form: the draft being typed, the errors of
/// the last validation and whether a submission is running.
pub struct EventForm {
    state: Mutex<FormState>,
    repository: Arc<dyn EventRepository>,
    navigator: Arc<dyn Navigator>,
    listing: Option<FetchController<Event>>,
}

impl EventForm {
    pub fn new(repository: Arc<dyn EventRepository>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            state: Mutex::new(FormState::default()),
            repository,
            navigator,
            listing: None,
        }
    }

    /// After a successful create the listing cached here is marked stale
    pub fn with_listing(mut self, listing: FetchController<Event>) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn set_field(&self, field: DraftField, value: &str) {
        self.lock().draft.set(field, value);
    }

    pub fn select_images(&self, images: Vec<ImageArtifact>) {
        self.lock().draft.image = images;
    }

    pub fn draft(&self) -> EventDraft {
        self.lock().draft.clone()
    }

    pub fn errors(&self) -> ValidationErrors {
        self.lock().errors.clone()
    }

    pub fn status(&self) -> SubmitStatus {
        self.lock().status.clone()
    }

    /// Whether the submit action should be disabled
    pub fn is_submitting(&self) -> bool {
        self.lock().status == SubmitStatus::Submitting
    }

    /// Validates without submitting. The errors are kept on the form.
    pub fn validate(&self) -> Result<ValidEventDraft, ValidationErrors> {
        let mut state = self.lock();
        let result = validate_draft(&state.draft);

        state.errors = result.as_ref().err().cloned().unwrap_or_default();

        result
    }

    /// Validates the draft and, when valid, creates the event. On success
    /// the form is cleared and the user is sent to the listing. On any
    /// failure the draft is left as it was.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<Event, SubmitError> {
        let valid = {
            let mut state = self.lock();

            if state.status == SubmitStatus::Submitting {
                warn!("Submit ignored, previous submission still running");
                return Err(SubmitError::AlreadySubmitting);
            }

            match validate_draft(&state.draft) {
                Ok(valid) => {
                    state.errors = ValidationErrors::default();
                    state.status = SubmitStatus::Submitting;
                    valid
                }
                Err(errors) => {
                    info!("Draft has {} invalid fields", errors.len());
                    state.errors = errors.clone();
                    return Err(SubmitError::Invalid(errors));
                }
            }
        };

        let in_flight = InFlight { form: self };
        let created = self.repository.create_event(&valid).await;

        in_flight.finish(created)
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the submit action when a submission ends, including when the
/// submitting future is dropped before the repository answers.
struct InFlight<'a> {
    form: &'a EventForm,
}

impl InFlight<'_> {
    fn finish(self, created: Result<Event, RepositoryError>) -> Result<Event, SubmitError> {
        let form = self.form;

        match created {
            Ok(event) => {
                *form.lock() = FormState::default();

                info!(id = %event.id, "Event created");

                if let Some(listing) = &form.listing {
                    listing.invalidate(EVENTS_KEY);
                }

                form.navigator.navigate(Route::Listing);

                Ok(event)
            }
            Err(err) => {
                warn!("Create failed: {}", err);

                form.lock().status = SubmitStatus::Failed(SUBMIT_FAILED_MESSAGE.to_string());

                Err(SubmitError::Repository(err))
            }
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.form.lock();

        if state.status == SubmitStatus::Submitting {
            state.status = SubmitStatus::Editing;
        }
    }
}
