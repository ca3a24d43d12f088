//! Cache-fill-on-miss orchestration.
//!
//! [`CacheResolver`] is the core of the proxy: check the store, and on a
//! miss run one fetch-and-persist for the path while every other caller
//! for that path waits on its outcome.
//!
//! # Single-flight
//!
//! The in-flight registry maps each [`CachePath`] with a running fetch to
//! a `broadcast::Sender` of the shared outcome. The first miss registers
//! an entry and spawns the fill task; later misses for the same path
//! subscribe and wait. The scope is per-path only: misses on distinct
//! paths proceed fully in parallel, contending only on the registry
//! mutex itself (held for map operations, never across an `.await`).
//!
//! # Failure fan-out
//!
//! A failed fetch (or persist) is broadcast to every waiter and is not
//! cached: nothing is written to disk, so each subsequent request retries
//! the fill from scratch.
//!
//! # Cancellation
//!
//! The fill runs in a spawned task, detached from all callers. Cancelling
//! a waiter merely drops its receiver; cancelling the caller that started
//! the flight changes nothing either, since the fetch runs to completion
//! and wakes the remaining waiters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use bytes::Bytes;
use metrics::{counter, histogram};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::path::CachePath;
use super::store::LocalStore;
use crate::origin::Origin;
use crate::{Error, Result, telemetry};

/// Outcome shared between the fill task and all waiters.
type FlightOutcome = Result<Bytes>;

type FlightRegistry = Mutex<HashMap<CachePath, broadcast::Sender<FlightOutcome>>>;

/// Resolves request paths to bytes, filling the local store on miss.
///
/// Cheap to clone; clones share the store, origin, and in-flight
/// registry.
#[derive(Clone)]
pub struct CacheResolver {
    store: Arc<LocalStore>,
    origin: Arc<dyn Origin>,
    inflight: Arc<FlightRegistry>,
}

impl CacheResolver {
    /// Create a resolver over a store and an origin.
    pub fn new(store: Arc<LocalStore>, origin: Arc<dyn Origin>) -> Self {
        Self {
            store,
            origin,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolve a raw request path to its content.
    ///
    /// Validates the path, serves from disk when present, and otherwise
    /// joins or starts the single fetch-and-persist for that path.
    pub async fn resolve(&self, raw_path: &str) -> Result<Bytes> {
        let path = CachePath::parse(raw_path)?;
        self.resolve_path(&path).await
    }

    /// Resolve an already-validated path.
    pub async fn resolve_path(&self, path: &CachePath) -> Result<Bytes> {
        if let Some(bytes) = self.store.read(path).await? {
            counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
            debug!(path = %path, bytes = bytes.len(), "cache hit");
            return Ok(bytes);
        }

        counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        let mut outcome_rx = self.join_flight(path);

        match outcome_rx.recv().await {
            Ok(outcome) => outcome,
            // The sender dropped without broadcasting: the fill task was
            // torn down (runtime shutdown). Surface it as a storage
            // failure; nothing was cached.
            Err(_) => Err(Error::Storage(format!(
                "cache fill for `{path}` was aborted"
            ))),
        }
    }

    /// Subscribe to the in-flight fetch for `path`, starting one if none
    /// is running. Never awaits while holding the registry lock.
    fn join_flight(&self, path: &CachePath) -> broadcast::Receiver<FlightOutcome> {
        let mut inflight = lock_registry(&self.inflight);

        if let Some(sender) = inflight.get(path) {
            counter!(telemetry::WAITERS_COALESCED_TOTAL).increment(1);
            debug!(path = %path, "joining in-flight fetch");
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(1);
        inflight.insert(path.clone(), sender.clone());
        drop(inflight);

        let store = self.store.clone();
        let origin = self.origin.clone();
        let registry = self.inflight.clone();
        let path = path.clone();

        // Detached so caller cancellation cannot abandon the fill while
        // other waiters are parked on it.
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = fill(&store, origin.as_ref(), &path).await;
            histogram!(telemetry::FETCH_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());

            // Remove before broadcasting: a request arriving after the
            // outcome either hits the freshly published file or starts a
            // clean retry of a failed fill.
            lock_registry(&registry).remove(&path);

            match &outcome {
                Ok(bytes) => {
                    info!(path = %path, bytes = bytes.len(), "cache fill complete");
                }
                Err(error) => {
                    warn!(path = %path, error = %error, "cache fill failed");
                }
            }

            // Waiters may all have been cancelled; that is not an error.
            let _ = sender.send(outcome);
        });

        receiver
    }
}

/// One fetch-and-persist cycle. On failure nothing is left on disk, so
/// absence remains the only miss signal.
async fn fill(store: &LocalStore, origin: &dyn Origin, path: &CachePath) -> FlightOutcome {
    // A fill that won registration off a stale miss may find the entry
    // already published; serve it instead of refetching.
    if let Some(bytes) = store.read(path).await? {
        return Ok(bytes);
    }

    let bytes = origin.fetch(path).await?;
    store.write(path, bytes.clone()).await?;
    Ok(bytes)
}

fn lock_registry(
    registry: &FlightRegistry,
) -> std::sync::MutexGuard<'_, HashMap<CachePath, broadcast::Sender<FlightOutcome>>> {
    // A poisoned registry only means a panic elsewhere mid-operation;
    // the map itself is still structurally sound.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
