use crate::events::model::Event;
use crate::events::routes::{event_key, Route, EVENTS_KEY};
use crate::fetch::controller::{Fetch, FetchConfig, FetchController};
use crate::fetch::state::FetchState;
use crate::fetch::view::FetchView;
use crate::repository::api::EventRepository;
use std::sync::Arc;
use tracing::instrument;

/// Reads of the listing and detail views, cached under `events` and
/// `events/{id}`.
pub struct EventCatalog {
    repository: Arc<dyn EventRepository>,
    events: FetchController<Event>,
}

impl EventCatalog {
    pub fn new(repository: Arc<dyn EventRepository>, config: FetchConfig) -> Self {
        Self {
            repository,
            events: FetchController::new(config),
        }
    }

    pub fn repository(&self) -> Arc<dyn EventRepository> {
        Arc::clone(&self.repository)
    }

    pub fn controller(&self) -> &FetchController<Event> {
        &self.events
    }

    pub fn view(&self) -> FetchView<Event> {
        FetchView::new(self.events.clone())
    }

    /// Starts the listing read without waiting for it
    pub fn request_listing(&self) -> Fetch<Event> {
        let repository = self.repository();

        self.events.request(EVENTS_KEY, move || {
            let repository = Arc::clone(&repository);
            async move { repository.list_events().await }
        })
    }

    /// Starts the detail read of `id` without waiting for it
    pub fn request_event(&self, id: &str) -> Fetch<Event> {
        let repository = self.repository();
        let id = id.to_string();

        self.events.request(&event_key(&id), move || {
            let repository = Arc::clone(&repository);
            let id = id.clone();
            async move { repository.get_event(&id).await }
        })
    }

    pub fn revalidate_listing(&self) -> Fetch<Event> {
        let repository = self.repository();

        self.events.revalidate(EVENTS_KEY, move || {
            let repository = Arc::clone(&repository);
            async move { repository.list_events().await }
        })
    }

    #[instrument(skip(self))]
    pub async fn list_events(&self) -> FetchState<Event> {
        self.request_listing().await
    }

    #[instrument(skip(self))]
    pub async fn event_detail(&self, id: &str) -> FetchState<Event> {
        self.request_event(id).await
    }

    pub fn listing_state(&self) -> FetchState<Event> {
        self.events.state(EVENTS_KEY)
    }

    pub fn event_state(&self, id: &str) -> FetchState<Event> {
        self.events.state(&event_key(id))
    }

    /// Loads the data `route` shows into `view`. `None` when the route reads
    /// nothing or another route was opened on the view meanwhile.
    #[instrument(skip(self, view), fields(route = %route))]
    pub async fn open(
        &self,
        view: &FetchView<Event>,
        route: &Route,
    ) -> Option<FetchState<Event>> {
        let repository = self.repository();

        match route {
            Route::Listing => {
                view.load(EVENTS_KEY, move || {
                    let repository = Arc::clone(&repository);
                    async move { repository.list_events().await }
                })
                .await
            }
            Route::EventDetail(id) => {
                let id = id.clone();

                view.load(&event_key(&id), move || {
                    let repository = Arc::clone(&repository);
                    let id = id.clone();
                    async move { repository.get_event(&id).await }
                })
                .await
            }
            Route::AddEvent => {
                view.clear();
                None
            }
        }
    }
}
