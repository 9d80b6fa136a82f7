use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use wydarzenia::catalog::EventCatalog;
use wydarzenia::config::env_loader::load_config;
use wydarzenia::config::model::{Config, RepositoryConfig};
use wydarzenia::draft::form::{EventForm, Navigator};
use wydarzenia::events::model::{
    DraftField, Event, ImageArtifact, EVENT_NOT_FOUND_MESSAGE, LISTING_EMPTY_MESSAGE,
};
use wydarzenia::events::routes::Route;
use wydarzenia::fetch::state::FetchState;
use wydarzenia::repository::api::{EventRepository, RepositoryError};
use wydarzenia::repository::memory::InMemoryEventRepository;
use wydarzenia::tracing::setup_loki;

struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        info!("Navigating to {}", route);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let loki = setup_loki(config.loki_url.as_deref()).await;
    let result = run(config).await;

    if let Err(err) = &result {
        error!("Catalog demo failed: {}", err);
    }

    if let Some((controller, handle)) = loki {
        controller.shutdown().await;
        let _ = handle.await;
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let repository = build_repository(&config.repository_config).await?;
    let catalog = EventCatalog::new(Arc::clone(&repository), config.fetch_config.clone());
    let limit = config.debug_config.event_limit.unwrap_or(usize::MAX);

    let listing = catalog.list_events().await;
    print_listing(&listing, limit);

    if let Some(first) = listing.data().and_then(|events| events.first()) {
        match catalog.event_detail(&first.id).await {
            FetchState::Ready { data } => data.iter().for_each(print_event),
            FetchState::Empty => info!("{}", EVENT_NOT_FOUND_MESSAGE),
            other => warn!("Detail not available: {:?}", other),
        }
    }

    let form = EventForm::new(Arc::clone(&repository), Arc::new(LogNavigator))
        .with_listing(catalog.controller().clone());

    form.set_field(DraftField::Title, "Bieg");
    form.set_field(DraftField::Date, "2025-01-01T10:00");
    form.set_field(DraftField::Description, "Opis wydarzenia testowego");
    form.set_field(DraftField::Type, "sport");
    form.set_field(DraftField::Phone, "123456789");
    form.set_field(DraftField::Email, "a@b.pl");
    form.set_field(DraftField::Location, "Warszawa, ul. Testowa 1");
    form.select_images(vec![ImageArtifact::new(
        "bieg.png",
        "image/png",
        "https://images.unsplash.com/photo-1461896836934-ffe607ba8211",
    )]);

    let created = form.submit().await?;
    info!("Added '{}' with id {}", created.title, created.id);

    print_listing(&catalog.list_events().await, limit);

    Ok(())
}

async fn build_repository(
    config: &RepositoryConfig,
) -> Result<Arc<dyn EventRepository>, RepositoryError> {
    let repository = match &config.seed_file {
        Some(path) => InMemoryEventRepository::from_seed_file(path, config.latency).await?,
        None => InMemoryEventRepository::with_bundled_events(config.latency)?,
    };

    Ok(Arc::new(repository))
}

fn print_listing(state: &FetchState<Event>, limit: usize) {
    match state {
        FetchState::Ready { data } => data.iter().take(limit).for_each(print_event),
        FetchState::Empty => info!("{}", LISTING_EMPTY_MESSAGE),
        FetchState::Failed { reason } => warn!("Listing failed: {}", reason),
        FetchState::Idle | FetchState::Loading { .. } => info!("Listing not settled yet"),
    }
}

fn print_event(event: &Event) {
    info!(
        "[{}] {} ({}, {})",
        event.event_type.label(),
        event.title,
        event.date.format("%d.%m.%Y %H:%M"),
        event.location
    );
}
