use super::controller::FetchController;
use super::state::{FetchData, FetchState};
use futures::future::{AbortHandle, Abortable};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

struct Following {
    key: String,
    abort: AbortHandle,
}

/// Follows the key one renderer is currently showing. Switching keys stops
/// waiting on the previous key, so a late answer for an old key never
/// replaces what the view shows. The old read still lands in the cache under
/// its own key.
pub struct FetchView<T> {
    controller: FetchController<T>,
    following: Mutex<Option<Following>>,
}

impl<T> FetchView<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(controller: FetchController<T>) -> Self {
        Self {
            controller,
            following: Mutex::new(None),
        }
    }

    pub fn key(&self) -> Option<String> {
        self.lock().as_ref().map(|following| following.key.clone())
    }

    /// State of the key currently followed
    pub fn state(&self) -> FetchState<T> {
        match self.key() {
            Some(key) => self.controller.state(&key),
            None => FetchState::Idle,
        }
    }

    /// Follows `key` and waits for it to settle. Returns `None` when another
    /// key was loaded in the meantime.
    #[instrument(skip(self, producer))]
    pub async fn load<F, Fut, D, E>(&self, key: &str, producer: F) -> Option<FetchState<T>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<D, E>> + Send + 'static,
        D: FetchData<T> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (abort, registration) = AbortHandle::new_pair();

        {
            let mut following = self.lock();

            if let Some(previous) = following.as_ref() {
                if previous.key != key {
                    debug!(previous = %previous.key, "Superseding previous key");
                    previous.abort.abort();
                }
            }

            *following = Some(Following {
                key: key.to_string(),
                abort,
            });
        }

        let fetch = self.controller.request(key, producer);

        match Abortable::new(fetch, registration).await {
            Ok(state) if self.key().as_deref() == Some(key) => Some(state),
            Ok(_) | Err(_) => {
                debug!("Load superseded");
                None
            }
        }
    }

    /// Stops following any key, abandoning a pending load
    pub fn clear(&self) {
        if let Some(previous) = self.lock().take() {
            debug!(previous = %previous.key, "No longer following");
            previous.abort.abort();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Following>> {
        self.following.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
