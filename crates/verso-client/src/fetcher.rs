//! Bounded-concurrency batch fetching.
//!
//! A [`Fetcher`] limits the number of simultaneously outstanding network
//! requests with a counting semaphore. Each unit of work acquires a permit,
//! performs one round trip, and releases the permit on every exit path: the
//! permit is owned by the work's scope and dropped on success and on error
//! alike, so a failing item can never starve the batch.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use verso_core::{Error, Result};

use crate::TRACING_TARGET;

/// Default ceiling on simultaneous downloads.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Counting-semaphore fetch limiter, shared by all batch operations of one
/// backend wrapper.
#[derive(Debug, Clone)]
pub struct Fetcher {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl Fetcher {
    /// Creates a fetcher with the given concurrency ceiling.
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Returns the concurrency ceiling.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Acquires one permit, waiting in FIFO order when the ceiling is hit.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|err| {
                Error::unknown()
                    .with_message("fetch semaphore closed")
                    .with_source(err)
            })
    }

    /// Runs `fetch` over every item with at most `limit` in flight.
    ///
    /// Failures are isolated: a failing item is logged at `warn` and dropped
    /// from the result set, never aborting the batch. Successes keep their
    /// association with the originating item; completion order is
    /// unconstrained, so callers wanting input order must re-sort by a
    /// stable key.
    pub async fn fetch_all<R, T, F, Fut>(&self, items: Vec<R>, fetch: F) -> Vec<(R, T)>
    where
        R: std::fmt::Debug + Clone,
        F: Fn(R) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let work = items.into_iter().map(|item| {
            let fetch = &fetch;
            async move {
                let _permit = match self.acquire().await {
                    Ok(permit) => permit,
                    Err(err) => {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            item = ?item,
                            error = %err,
                            "Dropping batch item, no permit"
                        );
                        return None;
                    }
                };
                match fetch(item.clone()).await {
                    Ok(data) => Some((item, data)),
                    Err(err) => {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            item = ?item,
                            error = %err,
                            "Dropping failed batch item"
                        );
                        None
                    }
                }
            }
        });

        futures::future::join_all(work)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use verso_core::FileRef;

    use super::*;

    /// Tracks the number of concurrently running fetches and the high-water
    /// mark across the batch.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InFlight {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn files(n: usize) -> Vec<FileRef> {
        (0..n)
            .map(|i| FileRef::new(format!("posts/{i}.md")).with_id(format!("sha{i}")))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_in_flight_never_exceeds_ceiling() {
        let fetcher = Fetcher::new(10);
        let in_flight = Arc::new(InFlight::default());

        let tracker = Arc::clone(&in_flight);
        let results = fetcher
            .fetch_all(files(25), move |file| {
                let tracker = Arc::clone(&tracker);
                async move {
                    tracker.enter();
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    tracker.exit();
                    Ok(file.path)
                }
            })
            .await;

        assert_eq!(results.len(), 25);
        assert!(in_flight.peak.load(Ordering::SeqCst) <= 10);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ceiling_of_one_serializes_work() {
        let fetcher = Fetcher::new(1);
        let in_flight = Arc::new(InFlight::default());

        let tracker = Arc::clone(&in_flight);
        fetcher
            .fetch_all(files(5), move |file| {
                let tracker = Arc::clone(&tracker);
                async move {
                    tracker.enter();
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    tracker.exit();
                    Ok(file.path)
                }
            })
            .await;

        assert_eq!(in_flight.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failures_are_dropped_not_fatal() {
        let fetcher = Fetcher::new(10);

        let results = fetcher
            .fetch_all(files(25), |file| async move {
                // Induce failures for two specific items.
                if file.path == "posts/3.md" || file.path == "posts/17.md" {
                    Err(verso_core::Error::network().with_message("boom"))
                } else {
                    Ok(format!("data:{}", file.path))
                }
            })
            .await;

        assert_eq!(results.len(), 23);
        let mut paths: Vec<_> = results.iter().map(|(file, _)| file.path.clone()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 23, "each result matches a distinct reference");
        assert!(!paths.contains(&"posts/3.md".to_string()));
        assert!(
            results
                .iter()
                .all(|(file, data)| data == &format!("data:{}", file.path))
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_permit_released_on_error_path() {
        // With a ceiling of 2 and every item failing, the batch still
        // drains; a leaked permit would deadlock here.
        let fetcher = Fetcher::new(2);
        let results = fetcher
            .fetch_all(files(8), |_file| async move {
                Err::<(), _>(verso_core::Error::network())
            })
            .await;
        assert!(results.is_empty());
    }
}
