use crate::config::model::{Config, ConfigError, DebugConfig, RepositoryConfig};
use crate::fetch::controller::FetchConfig;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_STALE_AFTER_MS: u64 = 2000;
const DEFAULT_REPOSITORY_LATENCY_MS: u64 = 1000;
const DEFAULT_RETAINED_KEYS: usize = 64;

pub fn load_config() -> Result<Config, ConfigError> {
    let stale_after_ms =
        load_number_config("EVENTS_STALE_AFTER_MS")?.unwrap_or(DEFAULT_STALE_AFTER_MS);
    let read_retries = load_number_config("EVENTS_READ_RETRIES")?.unwrap_or(0);
    let retained_keys =
        load_number_config("EVENTS_RETAINED_KEYS")?.unwrap_or(DEFAULT_RETAINED_KEYS);
    let latency_ms = load_number_config("EVENTS_REPOSITORY_LATENCY_MS")?
        .unwrap_or(DEFAULT_REPOSITORY_LATENCY_MS);
    let debug_event_limit = load_number_config("DEBUG_EVENT_LIMIT")?;

    Ok(Config {
        debug_config: DebugConfig {
            event_limit: debug_event_limit,
        },
        fetch_config: FetchConfig {
            stale_after: Duration::from_millis(stale_after_ms),
            read_retries,
            retained_keys,
        },
        repository_config: RepositoryConfig {
            latency: Duration::from_millis(latency_ms),
            seed_file: load_string_config("EVENTS_SEED_FILE").map(PathBuf::from),
        },
        loki_url: load_string_config("LOKI_URL"),
    })
}

fn load_string_config(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn load_number_config<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match load_string_config(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                name: name.to_string(),
                expected: "a non-negative integer number",
            }),
        None => Ok(None),
    }
}
