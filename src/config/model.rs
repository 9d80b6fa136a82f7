use crate::fetch::controller::FetchConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug)]
pub struct Config {
    pub debug_config: DebugConfig,
    pub fetch_config: FetchConfig,
    pub repository_config: RepositoryConfig,
    pub loki_url: Option<String>,
}

#[derive(Debug)]
pub struct DebugConfig {
    pub event_limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Delay added to every repository call
    pub latency: Duration,
    /// Bundled sample events are used when unset
    pub seed_file: Option<PathBuf>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid config '{name}'. Expected {expected}.")]
    Invalid { name: String, expected: &'static str },
}
