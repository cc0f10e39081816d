//! Request-scoped loading of backend records.
//!
//! A [`BatchingLoader`] lives exactly as long as the request [`Context`](crate::Context) that
//! owns it. Every field that needs the record for an identifier goes through
//! [`BatchingLoader::load`]: the first caller fetches, callers arriving while that fetch is in
//! flight subscribe to its outcome, and callers arriving after it settled get the memoized
//! outcome. Failures are memoized like successes, so there is no retry within a request.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::broadcast;
use tokio::sync::broadcast::Sender;

use crate::error::FetchError;

type FetchFn<K, V> = Arc<dyn Fn(K) -> BoxFuture<'static, Result<V, FetchError>> + Send + Sync>;

enum Slot<V> {
    InFlight(Sender<Result<V, FetchError>>),
    Settled(Result<V, FetchError>),
}

enum Next<V> {
    Settled(Result<V, FetchError>),
    Wait(broadcast::Receiver<Result<V, FetchError>>),
    Lead(Sender<Result<V, FetchError>>),
}

/// Coalesces loads of the same key into one backend call and remembers the outcome.
pub struct BatchingLoader<K, V>
where
    K: Clone + Eq + Hash,
{
    name: &'static str,
    fetch: FetchFn<K, V>,
    slots: DashMap<K, Slot<V>>,
}

impl<K, V> BatchingLoader<K, V>
where
    K: Clone + Debug + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(name: &'static str, fetch: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        Self {
            name,
            fetch: Arc::new(move |key| fetch(key).boxed()),
            slots: DashMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Load the value for `key`, fetching it at most once for the lifetime of this loader.
    pub async fn load(&self, key: K) -> Result<V, FetchError> {
        loop {
            // The shard lock must be released before awaiting.
            let next = match self.slots.entry(key.clone()) {
                Entry::Occupied(entry) => match entry.get() {
                    Slot::Settled(result) => Next::Settled(result.clone()),
                    Slot::InFlight(sender) => Next::Wait(sender.subscribe()),
                },
                Entry::Vacant(entry) => {
                    let (sender, _receiver) = broadcast::channel(1);
                    entry.insert(Slot::InFlight(sender.clone()));
                    Next::Lead(sender)
                }
            };

            match next {
                Next::Settled(result) => {
                    tracing::trace!(loader = self.name, ?key, "memoized");
                    return result;
                }
                Next::Wait(mut receiver) => {
                    tracing::trace!(loader = self.name, ?key, "coalesced with in-flight fetch");
                    match receiver.recv().await {
                        Ok(result) => return result,
                        // the leading caller was dropped before its fetch settled, try again
                        Err(_) => continue,
                    }
                }
                Next::Lead(sender) => return self.lead(key, sender).await,
            }
        }
    }

    async fn lead(&self, key: K, sender: Sender<Result<V, FetchError>>) -> Result<V, FetchError> {
        tracing::debug!(loader = self.name, ?key, "fetching");
        let guard = InFlightGuard {
            slots: &self.slots,
            key: Some(key.clone()),
        };
        let result = (self.fetch)(key.clone()).await;
        guard.settle(result.clone());
        if let Err(error) = &result {
            tracing::debug!(loader = self.name, ?key, %error, "fetch failed");
        }
        // Nobody may be waiting, in which case there is nothing to notify.
        let _ = sender.send(result.clone());
        result
    }
}

/// Releases an in-flight slot whose leading caller was dropped, so that waiters can take over.
struct InFlightGuard<'a, K, V>
where
    K: Clone + Eq + Hash,
{
    slots: &'a DashMap<K, Slot<V>>,
    key: Option<K>,
}

impl<K, V> InFlightGuard<'_, K, V>
where
    K: Clone + Eq + Hash,
{
    fn settle(mut self, result: Result<V, FetchError>) {
        if let Some(key) = self.key.take() {
            self.slots.insert(key, Slot::Settled(result));
        }
    }
}

impl<K, V> Drop for InFlightGuard<'_, K, V>
where
    K: Clone + Eq + Hash,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.slots
                .remove_if(&key, |_, slot| matches!(slot, Slot::InFlight(_)));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use test_log::test;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Record {
        id: String,
    }

    fn counting_loader(
        calls: Arc<AtomicUsize>,
        delay: Duration,
    ) -> BatchingLoader<String, Arc<Record>> {
        BatchingLoader::new("records", move |id: String| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(Arc::new(Record { id }))
            }
        })
    }

    #[test(tokio::test)]
    async fn it_should_dedupe_in_flight_loads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(calls.clone(), Duration::from_millis(10));

        // The fetch is a little slow, so every load below enters while the first is in flight.
        let results =
            futures::future::join_all((0..10).map(|_| loader.load("EFO_0000305".to_string())))
                .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
        assert_eq!(first.id, "EFO_0000305");
    }

    #[test(tokio::test)]
    async fn it_should_memoize_settled_loads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(calls.clone(), Duration::ZERO);

        let first = loader.load("EFO_0000305".to_string()).await.unwrap();
        let second = loader.load("EFO_0000305".to_string()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test(tokio::test)]
    async fn it_should_fetch_distinct_keys_separately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(calls.clone(), Duration::from_millis(5));

        let (a, b) = futures::join!(
            loader.load("EFO_0000305".to_string()),
            loader.load("EFO_0000311".to_string())
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(a.unwrap().id, "EFO_0000305");
        assert_eq!(b.unwrap().id, "EFO_0000311");
    }

    #[test(tokio::test)]
    async fn it_should_share_failures_without_retrying() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let loader: BatchingLoader<String, Arc<Record>> =
            BatchingLoader::new("records", move |id: String| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Err(FetchError::NotFound {
                        service: "records".to_string(),
                        id,
                    })
                }
            });

        let concurrent =
            futures::future::join_all((0..3).map(|_| loader.load("missing".to_string()))).await;
        let later = loader.load("missing".to_string()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let expected = FetchError::NotFound {
            service: "records".to_string(),
            id: "missing".to_string(),
        };
        for result in concurrent {
            assert_eq!(result.unwrap_err(), expected);
        }
        assert_eq!(later.unwrap_err(), expected);
    }

    #[test(tokio::test)]
    async fn it_should_not_share_records_between_loaders() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first_request = counting_loader(calls.clone(), Duration::ZERO);
        let second_request = counting_loader(calls.clone(), Duration::ZERO);

        first_request.load("EFO_0000305".to_string()).await.unwrap();
        second_request.load("EFO_0000305".to_string()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test(tokio::test)]
    async fn it_should_recover_when_the_leading_load_is_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let loader: BatchingLoader<String, Arc<Record>> =
            BatchingLoader::new("records", move |id: String| {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        futures::future::pending::<()>().await;
                    }
                    Ok(Arc::new(Record { id }))
                }
            });

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            loader.load("EFO_0000305".to_string()),
        )
        .await;
        assert!(abandoned.is_err());

        let record = loader.load("EFO_0000305".to_string()).await.unwrap();
        assert_eq!(record.id, "EFO_0000305");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
