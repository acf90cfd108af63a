use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, trace};

use crate::domain::TVError;

/// Snapshot of a query as seen by the caller.
#[derive(Debug)]
pub struct QueryState<T> {
    pub data: Option<Arc<T>>,
    /// No data yet and a fetch is running.
    pub is_loading: bool,
    pub is_fetching: bool,
    pub error: Option<String>,
}

struct Entry<T> {
    data: Option<Arc<T>>,
    error: Option<String>,
    fetching: bool,
    fetched_at: Option<Instant>,
    invalidated: bool,
}

impl<T> Entry<T> {
    fn empty() -> Self {
        Entry {
            data: None,
            error: None,
            fetching: false,
            fetched_at: None,
            invalidated: false,
        }
    }

    fn is_stale(&self, stale_time: Duration) -> bool {
        match self.fetched_at {
            None => true,
            Some(at) => self.invalidated || at.elapsed() >= stale_time,
        }
    }

    fn state(&self) -> QueryState<T> {
        QueryState {
            data: self.data.clone(),
            is_loading: self.data.is_none() && self.fetching,
            is_fetching: self.fetching,
            error: self.error.clone(),
        }
    }
}

/// Keyed result cache that runs fetches on worker threads.
///
/// Concurrent queries for the same key share one in-flight fetch. Data older than
/// `stale_time` stays visible while it is refetched in the background. A failed
/// fetch is kept until the key is invalidated, there are no retries.
pub struct QueryClient<K, T> {
    entries: Arc<Mutex<HashMap<K, Entry<T>>>>,
    stale_time: Duration,
}

impl<K, T> QueryClient<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    T: Send + Sync + 'static,
{
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            stale_time,
        }
    }

    pub fn query<F>(&self, key: &K, fetch: F) -> QueryState<T>
    where
        F: FnOnce() -> Result<T, TVError> + Send + 'static,
    {
        let mut entries = self.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);

        let needs_fetch =
            !entry.fetching && entry.error.is_none() && entry.is_stale(self.stale_time);
        if needs_fetch {
            entry.fetching = true;
            entry.invalidated = false;
            self.spawn_fetch(key.clone(), fetch);
        } else if entry.fetching {
            trace!("Query {key:?} already in flight");
        }
        entry.state()
    }

    /// Current state without triggering a fetch.
    pub fn peek(&self, key: &K) -> Option<QueryState<T>> {
        self.lock().get(key).map(Entry::state)
    }

    /// Forces the next `query` for this key to refetch. Clears a stored error.
    pub fn invalidate(&self, key: &K) {
        if let Some(entry) = self.lock().get_mut(key) {
            debug!("Invalidate query {key:?}");
            entry.invalidated = true;
            entry.error = None;
        }
    }

    fn spawn_fetch<F>(&self, key: K, fetch: F)
    where
        F: FnOnce() -> Result<T, TVError> + Send + 'static,
    {
        debug!("Start fetch for {key:?}");
        let entries = Arc::clone(&self.entries);
        thread::spawn(move || {
            let result = fetch();
            let mut entries = match entries.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let entry = entries.entry(key.clone()).or_insert_with(Entry::empty);
            entry.fetching = false;
            entry.fetched_at = Some(Instant::now());
            match result {
                Ok(data) => {
                    debug!("Fetch for {key:?} finished");
                    entry.data = Some(Arc::new(data));
                    entry.error = None;
                }
                Err(e) => {
                    error!("Fetch for {key:?} failed: {e}");
                    entry.error = Some(e.to_string());
                }
            }
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Entry<T>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
