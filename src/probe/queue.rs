//! Concurrent probe runner.
//!
//! - One tokio task per submitted candidate, capped by a semaphore
//! - Results flow back over a flume channel tagged with a generation
//! - `cancel` aborts in-flight tasks and bumps the generation so anything
//!   that still arrives is recognisably stale

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::cache::OutcomeCache;
use super::source::MediaSource;
use super::{probe, ProbeSettings};
use crate::models::{CandidateAsset, ProbeOutcome};

/// A resolved probe, tagged with the queue generation it was started in.
#[derive(Debug, Clone)]
pub struct ProbeMessage {
    pub generation: u64,
    pub outcome: ProbeOutcome,
}

pub struct ProbeQueue<S: MediaSource> {
    source: Arc<S>,
    settings: ProbeSettings,
    runtime: Handle,
    permits: Arc<Semaphore>,
    result_tx: Sender<ProbeMessage>,
    result_rx: Receiver<ProbeMessage>,
    generation: Arc<AtomicU64>,
    in_flight: Arc<AtomicUsize>,
    /// Submitted in this generation and not yet received.
    outstanding: usize,
    tasks: Vec<JoinHandle<()>>,
    /// URLs already submitted; each candidate is probed at most once.
    submitted: HashSet<String>,
    cache: Option<OutcomeCache>,
}

impl<S: MediaSource> ProbeQueue<S> {
    /// Creates a queue bound to the current tokio runtime.
    pub fn new(source: Arc<S>, settings: ProbeSettings, max_in_flight: usize) -> Result<Self> {
        let runtime = Handle::try_current().context("probe queue needs a tokio runtime")?;
        let (result_tx, result_rx) = flume::unbounded();
        Ok(Self {
            source,
            settings,
            runtime,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            result_tx,
            result_rx,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            outstanding: 0,
            tasks: Vec::new(),
            submitted: HashSet::new(),
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: OutcomeCache) -> Self {
        self.set_cache(cache);
        self
    }

    pub fn set_cache(&mut self, cache: OutcomeCache) {
        self.cache = Some(cache);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Starts probing `candidate`.
    ///
    /// Returns false if it was already submitted in this generation. Cached
    /// outcomes are delivered through the channel without touching the source.
    pub fn submit(&mut self, candidate: &CandidateAsset) -> bool {
        if !self.submitted.insert(candidate.url.clone()) {
            trace!(url = %candidate.url, "already submitted");
            return false;
        }
        let generation = self.generation();
        self.outstanding += 1;

        if let Some(outcome) = self.cache.as_ref().and_then(|c| c.get(&candidate.url)) {
            if self
                .result_tx
                .send(ProbeMessage {
                    generation,
                    outcome,
                })
                .is_err()
            {
                warn!("probe result channel closed");
            }
            return true;
        }

        self.tasks.retain(|t| !t.is_finished());

        let source = Arc::clone(&self.source);
        let permits = Arc::clone(&self.permits);
        let current = Arc::clone(&self.generation);
        let in_flight = Arc::clone(&self.in_flight);
        let tx = self.result_tx.clone();
        let cache = self.cache.clone();
        let settings = self.settings;
        let candidate = candidate.clone();

        in_flight.fetch_add(1, Ordering::SeqCst);
        let task = self.runtime.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };
            if current.load(Ordering::SeqCst) != generation {
                in_flight.fetch_sub(1, Ordering::SeqCst);
                return;
            }

            let outcome = probe(source.as_ref(), &candidate, settings).await;
            if let Some(cache) = &cache {
                cache.insert(outcome.clone());
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);
            if let Err(e) = tx.send(ProbeMessage {
                generation,
                outcome,
            }) {
                warn!(error = ?e, "failed to deliver probe outcome");
            }
        });
        self.tasks.push(task);
        true
    }

    fn received(&mut self, message: &ProbeMessage) {
        if message.generation == self.generation() {
            self.outstanding = self.outstanding.saturating_sub(1);
        }
    }

    /// Drains resolved outcomes without blocking.
    pub fn poll_results(&mut self) -> Vec<ProbeMessage> {
        let mut results = Vec::new();
        while let Ok(message) = self.result_rx.try_recv() {
            self.received(&message);
            results.push(message);
        }
        results
    }

    /// Waits for the next resolved outcome. Returns `None` when nothing
    /// submitted in the current generation is still outstanding.
    pub async fn next_result(&mut self) -> Option<ProbeMessage> {
        if self.outstanding == 0 {
            return None;
        }
        let message = self.result_rx.recv_async().await.ok()?;
        self.received(&message);
        Some(message)
    }

    /// Probes currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Outcomes still expected in the current generation.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding > 0
    }

    /// Aborts running probes and invalidates everything submitted so far.
    pub fn cancel(&mut self) {
        let previous = self.generation.fetch_add(1, Ordering::SeqCst);
        let aborted = self.tasks.len();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        // Tasks that slip past the abort decrement the old counter.
        self.in_flight = Arc::new(AtomicUsize::new(0));
        self.submitted.clear();
        self.outstanding = 0;
        while self.result_rx.try_recv().is_ok() {}
        debug!(previous, aborted, "cancelled probe queue");
    }
}

impl<S: MediaSource> Drop for ProbeQueue<S> {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
