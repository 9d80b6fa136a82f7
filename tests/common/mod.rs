#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use wydarzenia::draft::form::Navigator;
use wydarzenia::events::model::{
    DraftField, Event, EventDraft, EventType, ImageArtifact, ValidEventDraft,
};
use wydarzenia::events::routes::Route;
use wydarzenia::repository::api::{EventRepository, RepositoryError};

/// Holds calls until opened. Opening lets every current and future call through.
pub struct Gate(watch::Sender<bool>);

impl Gate {
    pub fn closed() -> Arc<Self> {
        let (sender, _) = watch::channel(false);
        Arc::new(Gate(sender))
    }

    pub fn opened() -> Arc<Self> {
        let gate = Gate::closed();
        gate.open();
        gate
    }

    pub fn open(&self) {
        self.0.send_replace(true);
    }

    pub async fn pass(&self) {
        let mut receiver = self.0.subscribe();
        let _ = receiver.wait_for(|open| *open).await;
    }
}

pub struct StubRepository {
    pub events: Mutex<Vec<Event>>,
    pub gate: Arc<Gate>,
    pub fail_reads: AtomicBool,
    pub fail_creates: AtomicBool,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

impl StubRepository {
    pub fn new(events: Vec<Event>, gate: Arc<Gate>) -> Self {
        Self {
            events: Mutex::new(events),
            gate,
            fail_reads: AtomicBool::new(false),
            fail_creates: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn read_result(&self) -> Result<(), RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventRepository for StubRepository {
    async fn list_events(&self) -> Result<Vec<Event>, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        self.read_result()?;

        Ok(self.events.lock().unwrap().clone())
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, RepositoryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await;
        self.read_result()?;

        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .find(|event| event.id == id)
            .cloned())
    }

    async fn create_event(&self, draft: &ValidEventDraft) -> Result<Event, RepositoryError> {
        let number = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.gate.pass().await;

        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(RepositoryError::Rejected("service unavailable".to_string()));
        }

        let event = Event::new(format!("created-{}", number), draft.clone());
        self.events.lock().unwrap().push(event.clone());

        Ok(event)
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

pub fn png() -> ImageArtifact {
    ImageArtifact::new("bieg.png", "image/png", "blob:bieg")
}

pub fn valid_draft() -> EventDraft {
    EventDraft {
        title: "Bieg".to_string(),
        date: "2025-01-01T10:00".to_string(),
        description: "Opis wydarzenia testowego".to_string(),
        image: vec![png()],
        event_type: "sport".to_string(),
        phone: "123456789".to_string(),
        email: "a@b.pl".to_string(),
        location: "Warszawa, ul. Testowa 1".to_string(),
    }
}

pub fn fill(form: &wydarzenia::draft::form::EventForm, draft: &EventDraft) {
    form.set_field(DraftField::Title, &draft.title);
    form.set_field(DraftField::Date, &draft.date);
    form.set_field(DraftField::Description, &draft.description);
    form.set_field(DraftField::Type, &draft.event_type);
    form.set_field(DraftField::Phone, &draft.phone);
    form.set_field(DraftField::Email, &draft.email);
    form.set_field(DraftField::Location, &draft.location);
    form.select_images(draft.image.clone());
}

pub fn sample_event(id: &str, title: &str) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        date: NaiveDate::from_ymd_opt(2025, 5, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap(),
        description: "Piknik rodzinny w parku miejskim.".to_string(),
        image: "https://example.com/piknik.jpg".to_string(),
        event_type: EventType::Health,
        phone: "+48 600 700 800".to_string(),
        email: "piknik@example.com".to_string(),
        location: "Poznań, Park Cytadela".to_string(),
    }
}
