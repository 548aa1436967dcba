//! Generic polling synchronizer shared by every dashboard widget.
//!
//! A [`Poller`] keeps one widget's data eventually consistent with a remote
//! resource: it fetches on a fixed interval, compares each result against
//! the last-applied snapshot with a widget-specific comparator, and replaces
//! the snapshot only when something semantically changed. Fetches run on a
//! spawned thread and report back over a channel tagged with a generation
//! token, so responses that arrive after a reconfigure or a teardown are
//! discarded instead of applied.

use crate::error::WastewatchError;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type FetchFn<T> = Arc<dyn Fn() -> Result<T, WastewatchError> + Send + Sync>;
pub type SameFn<T> = fn(&T, &T) -> bool;

/// A widget's data-freshness state. The three phases are mutually
/// exclusive; `Error` keeps any previously fetched data visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No data has ever been received.
    Loading,
    /// Holds last-good data. An empty collection is still `Ready`.
    Ready,
    /// The last fetch failed; the message is shown inline and polling
    /// continues untouched.
    Error,
}

struct Outcome<T> {
    generation: u64,
    result: Result<T, WastewatchError>,
}

pub struct Poller<T> {
    fetch: FetchFn<T>,
    same: SameFn<T>,
    interval: Duration,
    generation: u64,
    tx: Sender<Outcome<T>>,
    rx: Receiver<Outcome<T>>,
    snapshot: Option<Arc<T>>,
    phase: Phase,
    error: Option<String>,
    revision: u64,
    last_request: Option<Instant>,
    in_flight: bool,
    torn_down: bool,
}

impl<T: Send + 'static> Poller<T> {
    /// Issues the initial fetch immediately and arms the interval.
    pub fn new(fetch: FetchFn<T>, same: SameFn<T>, interval: Duration) -> Self {
        let (tx, rx) = channel();
        let mut poller = Self {
            fetch,
            same,
            interval,
            generation: 0,
            tx,
            rx,
            snapshot: None,
            phase: Phase::Loading,
            error: None,
            revision: 0,
            last_request: None,
            in_flight: false,
            torn_down: false,
        };
        poller.request();
        poller
    }

    fn request(&mut self) {
        if self.torn_down {
            return;
        }
        let generation = self.generation;
        let fetch = Arc::clone(&self.fetch);
        let tx = self.tx.clone();
        self.in_flight = true;
        self.last_request = Some(Instant::now());
        std::thread::spawn(move || {
            let result = fetch();
            // The poller may already be gone; a dead channel is fine.
            let _ = tx.send(Outcome { generation, result });
        });
    }

    /// Issues the next fetch once the interval has elapsed. A request
    /// already in flight is never doubled up; the gateway timeout bounds
    /// how long one can hold the slot.
    pub fn tick(&mut self) {
        if self.torn_down || self.in_flight {
            return;
        }
        match self.last_request {
            Some(at) if at.elapsed() < self.interval => {}
            _ => self.request(),
        }
    }

    /// Fetches now regardless of the interval (manual refresh key).
    pub fn force_refresh(&mut self) {
        if !self.torn_down && !self.in_flight {
            self.request();
        }
    }

    /// Applies completed fetches. Returns true when anything a renderer
    /// cares about changed (snapshot, phase, or error message). Results
    /// from an orphaned generation are discarded unapplied.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.rx.try_recv() {
            if self.torn_down || outcome.generation != self.generation {
                continue;
            }
            self.in_flight = false;
            match outcome.result {
                Ok(data) => {
                    if self.error.take().is_some() || self.phase != Phase::Ready {
                        changed = true;
                    }
                    self.phase = Phase::Ready;
                    let replace = match &self.snapshot {
                        Some(previous) => !(self.same)(previous, &data),
                        None => true,
                    };
                    if replace {
                        self.snapshot = Some(Arc::new(data));
                        self.revision += 1;
                        changed = true;
                    }
                }
                Err(err) => {
                    tracing::warn!("fetch failed: {err}");
                    self.phase = Phase::Error;
                    self.error = Some(err.to_string());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Swaps in a fetch closure carrying new query parameters: the current
    /// generation is orphaned, the widget returns to its initial-load
    /// presentation, and exactly one fresh fetch goes out immediately.
    pub fn reconfigure(&mut self, fetch: FetchFn<T>) {
        if self.torn_down {
            return;
        }
        self.generation += 1;
        self.fetch = fetch;
        self.in_flight = false;
        self.error = None;
        self.phase = Phase::Loading;
        self.request();
    }

    /// Stops polling for good. Any response still in flight is discarded
    /// on arrival; no state mutation can happen after this call.
    pub fn shutdown(&mut self) {
        self.torn_down = true;
        self.generation += 1;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The last-applied snapshot. The `Arc` stays pointer-identical across
    /// fetches that returned semantically unchanged data.
    pub fn data(&self) -> Option<&Arc<T>> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Bumped once per applied snapshot replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{same_records, WasteRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn record(id: u64, confidence: u8) -> WasteRecord {
        WasteRecord {
            id,
            type_id: 1,
            type_label: "plastic".to_string(),
            confidence,
            timestamp: "2025-04-03T12:00:00Z".to_string(),
            image: String::new(),
        }
    }

    fn records_poller(
        fetch: FetchFn<Vec<WasteRecord>>,
        interval_ms: u64,
    ) -> Poller<Vec<WasteRecord>> {
        Poller::new(fetch, |a, b| same_records(a, b), Duration::from_millis(interval_ms))
    }

    /// Drains until the predicate holds or the deadline passes.
    fn drain_until<T: Send + 'static>(
        poller: &mut Poller<T>,
        deadline: Duration,
        mut done: impl FnMut(&Poller<T>) -> bool,
    ) {
        let start = Instant::now();
        while start.elapsed() < deadline {
            poller.drain();
            if done(poller) {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn initial_fetch_moves_loading_to_ready() {
        let mut poller = records_poller(Arc::new(|| Ok(vec![record(1, 90)])), 1000);
        assert_eq!(poller.phase(), Phase::Loading);
        assert!(poller.data().is_none());

        drain_until(&mut poller, Duration::from_secs(2), |p| {
            p.phase() == Phase::Ready
        });

        assert_eq!(poller.phase(), Phase::Ready);
        assert_eq!(poller.data().unwrap().len(), 1);
        assert_eq!(poller.revision(), 1);
    }

    #[test]
    fn unchanged_data_keeps_the_snapshot_pointer() {
        let mut poller = records_poller(Arc::new(|| Ok(vec![record(1, 90)])), 1);

        drain_until(&mut poller, Duration::from_secs(2), |p| p.revision() == 1);
        let first = Arc::clone(poller.data().unwrap());

        // Let several more identical fetches complete.
        for _ in 0..3 {
            std::thread::sleep(Duration::from_millis(10));
            poller.tick();
            drain_until(&mut poller, Duration::from_millis(500), |p| {
                p.data().is_some()
            });
        }

        assert!(Arc::ptr_eq(&first, poller.data().unwrap()));
        assert_eq!(poller.revision(), 1);
    }

    #[test]
    fn changed_confidence_replaces_the_snapshot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_fetch = Arc::clone(&calls);
        let mut poller = records_poller(
            Arc::new(move || {
                let confidence = if calls_fetch.fetch_add(1, Ordering::SeqCst) == 0 {
                    90
                } else {
                    95
                };
                Ok(vec![record(1, confidence)])
            }),
            1,
        );

        drain_until(&mut poller, Duration::from_secs(2), |p| p.revision() == 1);
        std::thread::sleep(Duration::from_millis(5));
        poller.tick();
        drain_until(&mut poller, Duration::from_secs(2), |p| p.revision() == 2);

        assert_eq!(poller.revision(), 2);
        assert_eq!(poller.data().unwrap()[0].confidence, 95);
    }

    #[test]
    fn empty_result_is_ready_not_loading_or_error() {
        let mut poller = records_poller(Arc::new(|| Ok(Vec::new())), 1000);

        drain_until(&mut poller, Duration::from_secs(2), |p| {
            p.phase() == Phase::Ready
        });

        assert_eq!(poller.phase(), Phase::Ready);
        assert!(poller.error().is_none());
        assert!(poller.data().unwrap().is_empty());
    }

    #[test]
    fn failure_keeps_prior_data_and_recovers_on_next_tick() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_fetch = Arc::clone(&calls);
        let mut poller = records_poller(
            Arc::new(move || match calls_fetch.fetch_add(1, Ordering::SeqCst) {
                1 => Err(WastewatchError::Http {
                    status: 503,
                    body: "unavailable".to_string(),
                }),
                _ => Ok(vec![record(1, 90)]),
            }),
            1,
        );

        drain_until(&mut poller, Duration::from_secs(2), |p| p.revision() == 1);

        std::thread::sleep(Duration::from_millis(5));
        poller.tick();
        drain_until(&mut poller, Duration::from_secs(2), |p| {
            p.phase() == Phase::Error
        });

        // Last-good data stays visible alongside the error message.
        assert_eq!(poller.phase(), Phase::Error);
        assert!(poller.error().unwrap().contains("503"));
        assert_eq!(poller.data().unwrap().len(), 1);

        // Polling never stops; the next success clears the error.
        std::thread::sleep(Duration::from_millis(5));
        poller.tick();
        drain_until(&mut poller, Duration::from_secs(2), |p| {
            p.phase() == Phase::Ready
        });
        assert!(poller.error().is_none());
        assert_eq!(poller.revision(), 1);
    }

    #[test]
    fn no_mutation_after_teardown() {
        let mut poller = records_poller(
            Arc::new(|| {
                std::thread::sleep(Duration::from_millis(100));
                Ok(vec![record(1, 90)])
            }),
            1000,
        );

        poller.shutdown();
        std::thread::sleep(Duration::from_millis(200));
        let changed = poller.drain();

        assert!(!changed);
        assert!(poller.data().is_none());
        assert_eq!(poller.phase(), Phase::Loading);
        assert_eq!(poller.revision(), 0);
    }

    #[test]
    fn reconfigure_orphans_in_flight_and_fetches_once() {
        let slow_calls = Arc::new(AtomicUsize::new(0));
        let slow_calls_fetch = Arc::clone(&slow_calls);
        let mut poller = records_poller(
            Arc::new(move || {
                slow_calls_fetch.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(100));
                Ok(vec![record(1, 10)])
            }),
            1000,
        );

        let new_calls = Arc::new(AtomicUsize::new(0));
        let new_calls_fetch = Arc::clone(&new_calls);
        let seen_filter = Arc::new(Mutex::new(None));
        let seen_filter_fetch = Arc::clone(&seen_filter);
        poller.reconfigure(Arc::new(move || {
            new_calls_fetch.fetch_add(1, Ordering::SeqCst);
            *seen_filter_fetch.lock().unwrap() = Some("page=2");
            Ok(vec![record(2, 99)])
        }));
        assert_eq!(poller.phase(), Phase::Loading);

        // Wait out both the fresh fetch and the orphaned slow one.
        std::thread::sleep(Duration::from_millis(200));
        drain_until(&mut poller, Duration::from_secs(2), |p| {
            p.phase() == Phase::Ready
        });

        assert_eq!(poller.data().unwrap()[0].id, 2);
        assert_eq!(poller.revision(), 1);
        assert_eq!(new_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen_filter.lock().unwrap(), Some("page=2"));
        assert_eq!(slow_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tick_respects_the_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_fetch = Arc::clone(&calls);
        let mut poller = records_poller(
            Arc::new(move || {
                calls_fetch.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            }),
            60_000,
        );

        drain_until(&mut poller, Duration::from_secs(2), |p| {
            p.phase() == Phase::Ready
        });
        for _ in 0..10 {
            poller.tick();
            poller.drain();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
