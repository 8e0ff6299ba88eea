//! RouteAnnotator - asynchronous leg travel-time computation
//!
//! Each request runs on its own tokio task and reports back over a channel.
//! Completions are applied to the cache only when drained, and only if they
//! belong to the latest request issued for that leg; anything older is
//! dropped.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::cache::{LegDuration, LegKey, RouteCache, RouteLeg};
use crate::directions::{DirectionsProvider, DirectionsRequest};
use crate::domain::{ScheduledOccurrence, TransportMode};

/// Message sent back by a finished leg task
#[derive(Debug)]
struct LegCompletion {
    date: NaiveDate,
    key: LegKey,
    generation: u64,
    duration: LegDuration,
}

/// Compute one leg, folding every failure into [`LegDuration::Unavailable`]
pub async fn compute_leg(
    provider: &dyn DirectionsProvider,
    request: DirectionsRequest,
    timeout: Duration,
) -> LegDuration {
    debug!(provider = provider.name(), mode = %request.mode, "compute_leg: called");
    match tokio::time::timeout(timeout, provider.route(request)).await {
        Ok(Ok(response)) => match response.first_duration_secs() {
            Some(secs) => LegDuration::from_secs(secs),
            None => {
                debug!("compute_leg: provider returned no routes");
                LegDuration::Unavailable
            }
        },
        Ok(Err(e)) if e.is_quota() => {
            warn!(error = %e, "compute_leg: provider quota exhausted, leg marked unavailable");
            LegDuration::Unavailable
        }
        Ok(Err(e)) => {
            warn!(error = %e, "compute_leg: provider error, leg marked unavailable");
            LegDuration::Unavailable
        }
        Err(_) => {
            warn!(?timeout, "compute_leg: provider timed out, leg marked unavailable");
            LegDuration::Unavailable
        }
    }
}

/// Departure hint sent with transit requests
///
/// Uses the origin's departure time, else its arrival time, else now. The
/// time is read as local wall-clock time on `date`.
pub fn transit_departure(date: NaiveDate, origin: &ScheduledOccurrence) -> DateTime<Utc> {
    origin
        .departure()
        .or(origin.arrival())
        .and_then(|time| Local.from_local_datetime(&date.and_time(time)).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Issues leg computations and owns the leg cache
pub struct RouteAnnotator {
    provider: Arc<dyn DirectionsProvider>,
    timeout: Duration,
    cache: RouteCache,
    generations: HashMap<(NaiveDate, LegKey), u64>,
    next_generation: u64,
    in_flight: usize,
    tx: mpsc::UnboundedSender<LegCompletion>,
    rx: mpsc::UnboundedReceiver<LegCompletion>,
}

impl RouteAnnotator {
    pub fn new(provider: Arc<dyn DirectionsProvider>, timeout: Duration) -> Self {
        Self::with_cache(provider, timeout, RouteCache::new())
    }

    /// Start from a cache restored from storage
    pub fn with_cache(provider: Arc<dyn DirectionsProvider>, timeout: Duration, cache: RouteCache) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            timeout,
            cache,
            generations: HashMap::new(),
            next_generation: 0,
            in_flight: 0,
            tx,
            rx,
        }
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut RouteCache {
        &mut self.cache
    }

    /// Number of issued computations whose completion has not been received
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start computing the leg `origin → destination` on `date`
    ///
    /// The cache entry switches to "computing" immediately. Must be called
    /// from within a tokio runtime.
    pub fn request(
        &mut self,
        date: NaiveDate,
        origin: &ScheduledOccurrence,
        destination: &ScheduledOccurrence,
        mode: TransportMode,
    ) -> u64 {
        let key = LegKey::new(origin.id().clone(), destination.id().clone());
        self.next_generation += 1;
        let generation = self.next_generation;
        debug!(%date, %key, %mode, generation, "request: called");

        self.generations.insert((date, key.clone()), generation);
        self.cache.insert(date, key.clone(), RouteLeg::computing(mode));

        let request = DirectionsRequest {
            origin: origin.location(),
            destination: destination.location(),
            mode,
            departure_time: (mode == TransportMode::Transit).then(|| transit_departure(date, origin)),
        };

        let provider = Arc::clone(&self.provider);
        let timeout = self.timeout;
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let duration = compute_leg(provider.as_ref(), request, timeout).await;
            let _ = tx.send(LegCompletion {
                date,
                key,
                generation,
                duration,
            });
        });

        generation
    }

    /// Apply every completion that has already arrived, without waiting
    ///
    /// Returns the number of completions applied to the cache.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for every issued computation and apply the results
    pub async fn settle(&mut self) -> usize {
        debug!(in_flight = self.in_flight, "settle: called");
        let mut applied = self.drain();
        while self.in_flight > 0 {
            match self.rx.recv().await {
                Some(completion) => {
                    if self.apply(completion) {
                        applied += 1;
                    }
                }
                None => break,
            }
        }
        applied
    }

    fn apply(&mut self, completion: LegCompletion) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        let LegCompletion {
            date,
            key,
            generation,
            duration,
        } = completion;

        let latest = self.generations.get(&(date, key.clone())).copied();
        if latest != Some(generation) {
            debug!(%date, %key, generation, ?latest, "apply: dropping stale completion");
            return false;
        }
        self.generations.remove(&(date, key.clone()));
        debug!(%date, %key, %duration, "apply: leg computed");
        self.cache.complete(date, &key, duration)
    }
}
