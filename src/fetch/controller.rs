use super::state::{FetchData, FetchState};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use retry_policies::policies::ExponentialBackoff;
use retry_policies::{RetryDecision, RetryPolicy};
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(2);
const DEFAULT_RETAINED_KEYS: usize = 64;
const MIN_RETRY_INTERVAL: Duration = Duration::from_millis(50);
const MAX_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// A read in progress, or an already settled snapshot. Settles to the state
/// the key reached.
pub type Fetch<T> = BoxFuture<'static, FetchState<T>>;

type PendingRead<T> = Shared<Fetch<T>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// How long a settled result is served without reading again
    pub stale_after: Duration,
    /// Extra attempts after a failed read, spaced by exponential backoff
    pub read_retries: u32,
    /// Keys kept before stale, unwatched entries start being dropped
    pub retained_keys: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            stale_after: DEFAULT_STALE_AFTER,
            read_retries: 0,
            retained_keys: DEFAULT_RETAINED_KEYS,
        }
    }
}

struct CacheEntry<T> {
    state: watch::Sender<FetchState<T>>,
    settled_at: Option<Instant>,
    pending: Option<PendingRead<T>>,
}

impl<T> CacheEntry<T> {
    fn new() -> Self {
        let (state, _) = watch::channel(FetchState::Idle);

        Self {
            state,
            settled_at: None,
            pending: None,
        }
    }

    fn is_fresh(&self, stale_after: Duration) -> bool {
        let failed = matches!(*self.state.borrow(), FetchState::Failed { .. });

        !failed
            && self
                .settled_at
                .is_some_and(|settled_at| settled_at.elapsed() < stale_after)
    }

    /// Nothing reads, watches or would serve this entry any more
    fn is_idle(&self, stale_after: Duration) -> bool {
        self.pending.is_none() && self.state.receiver_count() == 0 && !self.is_fresh(stale_after)
    }
}

/// Keyed read cache. Each key runs at most one read at a time; callers that
/// ask while it runs join it instead of reading again.
///
/// Cloning is cheap and every clone shares the same cache.
pub struct FetchController<T> {
    entries: Arc<Mutex<HashMap<String, CacheEntry<T>>>>,
    config: FetchConfig,
}

impl<T> Clone for FetchController<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            config: self.config.clone(),
        }
    }
}

impl<T> FetchController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(config: FetchConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Current snapshot, `Idle` for a key never requested
    pub fn state(&self, key: &str) -> FetchState<T> {
        self.lock()
            .get(key)
            .map(|entry| entry.state.borrow().clone())
            .unwrap_or(FetchState::Idle)
    }

    /// Receives every snapshot of `key` from now on
    pub fn subscribe(&self, key: &str) -> watch::Receiver<FetchState<T>> {
        let mut entries = self.lock();

        self.entry(&mut entries, key).state.subscribe()
    }

    /// Requests `key`. A fresh settled result is returned as is. Otherwise
    /// the key moves to `Loading` before this returns and the producer runs
    /// in the background, unless a read for the key is already running, in
    /// which case that read is joined.
    #[instrument(skip(self, producer))]
    pub fn request<F, Fut, D, E>(&self, key: &str, producer: F) -> Fetch<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D, E>> + Send + 'static,
        D: FetchData<T> + Send + 'static,
        E: Display + Send + 'static,
    {
        let mut entries = self.lock();
        let entry = self.entry(&mut entries, key);

        if let Some(pending) = &entry.pending {
            debug!("Joining pending read");
            return pending.clone().boxed();
        }

        if entry.is_fresh(self.config.stale_after) {
            debug!("Serving cached result");
            return future::ready(entry.state.borrow().clone()).boxed();
        }

        self.start_read(entry, key, producer)
    }

    /// Reads `key` again even when the cached result is fresh. Data already
    /// shown stays available through `Loading { previous }`.
    #[instrument(skip(self, producer))]
    pub fn revalidate<F, Fut, D, E>(&self, key: &str, producer: F) -> Fetch<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D, E>> + Send + 'static,
        D: FetchData<T> + Send + 'static,
        E: Display + Send + 'static,
    {
        let mut entries = self.lock();
        let entry = self.entry(&mut entries, key);

        if let Some(pending) = &entry.pending {
            debug!("Revalidation joins pending read");
            return pending.clone().boxed();
        }

        self.start_read(entry, key, producer)
    }

    /// Marks `key` stale so the next request reads again
    pub fn invalidate(&self, key: &str) {
        if let Some(entry) = self.lock().get_mut(key) {
            debug!(key, "Invalidated");
            entry.settled_at = None;
        }
    }

    fn start_read<F, Fut, D, E>(
        &self,
        entry: &mut CacheEntry<T>,
        key: &str,
        producer: F,
    ) -> Fetch<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D, E>> + Send + 'static,
        D: FetchData<T> + Send + 'static,
        E: Display + Send + 'static,
    {
        let previous = entry.state.borrow().displayed();

        entry.state.send_replace(FetchState::Loading { previous });

        info!("Reading");

        let entries = Arc::clone(&self.entries);
        let key = key.to_string();
        let retries = self.config.read_retries;

        let read: PendingRead<T> = async move {
            let state = match read_with_retries(&producer, retries).await {
                Ok(data) => FetchState::from_items(data.into_items()),
                Err(err) => {
                    warn!(key = %key, "Read failed: {}", err);
                    FetchState::Failed {
                        reason: err.to_string(),
                    }
                }
            };

            settle(&entries, &key, state.clone());

            state
        }
        .boxed()
        .shared();

        entry.pending = Some(read.clone());

        // Driven by the runtime so the read completes even if every caller
        // stops waiting for it
        tokio::spawn(read.clone().map(|_| ()));

        read.boxed()
    }

    /// Entry of `key`, created on first use. Before a new key is added past
    /// `retained_keys`, entries nobody reads or watches are dropped.
    fn entry<'a>(
        &self,
        entries: &'a mut HashMap<String, CacheEntry<T>>,
        key: &str,
    ) -> &'a mut CacheEntry<T> {
        if !entries.contains_key(key) && entries.len() >= self.config.retained_keys {
            let before = entries.len();

            entries.retain(|_, entry| !entry.is_idle(self.config.stale_after));

            debug!("Evicted {} idle keys", before - entries.len());
        }

        entries
            .entry(key.to_string())
            .or_insert_with(CacheEntry::new)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Pending entries are never evicted, so the key is still present
fn settle<T>(entries: &Mutex<HashMap<String, CacheEntry<T>>>, key: &str, state: FetchState<T>) {
    let mut entries = entries.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(entry) = entries.get_mut(key) {
        entry.pending = None;
        entry.settled_at = Some(Instant::now());
        entry.state.send_replace(state);
    }
}

async fn read_with_retries<F, Fut, D, E>(producer: &F, retries: u32) -> Result<D, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<D, E>>,
    E: Display,
{
    let policy = ExponentialBackoff::builder()
        .retry_bounds(MIN_RETRY_INTERVAL, MAX_RETRY_INTERVAL)
        .build_with_max_retries(retries);
    let started_at = SystemTime::now();
    let mut past_retries = 0;

    loop {
        let err = match producer().await {
            Ok(data) => return Ok(data),
            Err(err) => err,
        };

        match policy.should_retry(started_at, past_retries) {
            RetryDecision::Retry { execute_after } => {
                let delay = execute_after
                    .duration_since(SystemTime::now())
                    .unwrap_or_default();

                warn!(
                    "Read failed due to '{}', retrying in {}ms",
                    err,
                    delay.as_millis()
                );

                tokio::time::sleep(delay).await;
                past_retries += 1;
            }
            RetryDecision::DoNotRetry => return Err(err),
        }
    }
}
