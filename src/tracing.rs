use std::io;
use tokio::task::JoinHandle;
use tracing::{info, warn, Level};
use tracing_loki::url::Url;
use tracing_loki::{BackgroundTask, BackgroundTaskController};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter, fmt};

fn build_loki_layer(
    base_url: Url,
) -> Result<
    (
        tracing_loki::Layer,
        BackgroundTaskController,
        BackgroundTask,
    ),
    tracing_loki::Error,
> {
    tracing_loki::builder()
        .label("service", "wydarzenia")?
        .build_controller_url(base_url)
}

/// Logs to stdout, and to Loki as well when `loki_url` answers.
pub async fn setup_loki(
    loki_url: Option<&str>,
) -> Option<(BackgroundTaskController, JoinHandle<()>)> {
    let filter = filter::Targets::new()
        .with_target("wydarzenia", Level::TRACE)
        .with_default(Level::WARN);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stdout));

    match loki_url {
        None => {
            registry.init();
            warn!("Loki URL not provided. Continuing without it.");
        }
        Some(raw_url) => match raw_url.parse::<Url>() {
            Err(err) => {
                registry.init();
                warn!("Invalid Loki URL '{}' ({}). Continuing without it.", raw_url, err);
            }
            Ok(base_url) => match reqwest::get(base_url.clone()).await {
                Ok(_) => match build_loki_layer(base_url) {
                    Ok((layer, controller, task)) => {
                        registry.with(layer).init();
                        let handle = tokio::spawn(task);

                        info!("Loki initialized");

                        return Some((controller, handle));
                    }
                    Err(err) => {
                        registry.init();
                        warn!("Couldn't build Loki layer ({}). Continuing without it.", err);
                    }
                },
                Err(_) => {
                    registry.init();
                    warn!("Couldn't connect to Loki. Continuing without it.");
                }
            },
        },
    };

    None
}
