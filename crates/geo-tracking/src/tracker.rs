//! Position Sampling Service
//!
//! Idle -> Tracking -> Idle. One background task per tracking session samples
//! the source on a fixed interval and hands each position to the caller's
//! callback. Single-shot queries work in either state.

use crate::config::TrackerConfig;
use crate::error::TrackingError;
use crate::position::GeoPosition;
use crate::source::{PositionSource, SimulatedSource};
use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

type SampleCallback = Arc<dyn Fn(GeoPosition) + Send + Sync>;

thread_local! {
    /// Gate of the session whose callback is running on this thread (0 = none)
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

fn gate_id(gate: &Arc<Mutex<bool>>) -> usize {
    Arc::as_ptr(gate) as usize
}

/// Marks this thread as inside a session's callback until dropped
struct Delivery;

impl Delivery {
    fn enter(gate: &Arc<Mutex<bool>>) -> Self {
        DELIVERING.with(|d| d.set(gate_id(gate)));
        Delivery
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        DELIVERING.with(|d| d.set(0));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wall-clock timestamps that advance with the runtime's monotonic clock
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    wall: DateTime<Utc>,
    mono: Instant,
}

impl SampleClock {
    pub fn new() -> Self {
        Self {
            wall: Utc::now(),
            mono: Instant::now(),
        }
    }

    /// Current time; never earlier than a previous call on the same clock
    pub fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.mono.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.wall + elapsed
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared between the tracker handle and its sampling task
struct Shared {
    config: TrackerConfig,
    source: Arc<dyn PositionSource>,
    clock: SampleClock,
    last_known: Mutex<Option<GeoPosition>>,
}

impl Shared {
    async fn sample(&self) -> Result<GeoPosition, TrackingError> {
        let acquire = self.source.acquire(self.config.enable_high_accuracy);
        let fix = time::timeout(self.config.timeout(), acquire)
            .await
            .map_err(|_| TrackingError::Timeout(self.config.timeout_ms))??;

        let position = GeoPosition::from_fix(fix, self.clock.now());
        let mut last = lock(&self.last_known);
        if last
            .as_ref()
            .map_or(true, |prev| prev.timestamp <= position.timestamp)
        {
            *last = Some(position);
        }
        Ok(position)
    }
}

/// A running tracking session
struct Session {
    stop_tx: watch::Sender<bool>,
    /// Open while callbacks may be delivered
    gate: Arc<Mutex<bool>>,
    _task: JoinHandle<()>,
}

/// Position sampling service for one vehicle
pub struct PositionTracker {
    shared: Arc<Shared>,
    session: Mutex<Option<Session>>,
}

impl PositionTracker {
    /// Tracker backed by the simulated source
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_source(config, Arc::new(SimulatedSource::default()))
    }

    /// Tracker backed by a custom source
    pub fn with_source(config: TrackerConfig, source: Arc<dyn PositionSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                source,
                clock: SampleClock::new(),
                last_known: Mutex::new(None),
            }),
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    /// Take one sample, bounded by the configured timeout
    pub async fn get_current_position(&self) -> Result<GeoPosition, TrackingError> {
        self.shared.sample().await
    }

    /// Start continuous sampling.
    ///
    /// Fires one sample immediately, then one per `update_interval`. Calling
    /// this while already tracking does nothing. `on_sample` runs on the
    /// sampling task and may call [`stop_tracking`](Self::stop_tracking).
    pub fn start_tracking<F>(&self, on_sample: F) -> Result<(), TrackingError>
    where
        F: Fn(GeoPosition) + Send + Sync + 'static,
    {
        let mut session = lock(&self.session);
        if session.is_some() {
            debug!("Tracking already active, ignoring start");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TrackingError::Runtime(e.to_string()))?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let gate = Arc::new(Mutex::new(true));
        let task = runtime.spawn(run_tracking(
            Arc::clone(&self.shared),
            Arc::clone(&gate),
            Arc::new(on_sample),
            stop_rx,
        ));

        *session = Some(Session {
            stop_tx,
            gate,
            _task: task,
        });
        info!(
            "Position tracking started (interval {}ms)",
            self.shared.config.update_interval_ms
        );
        Ok(())
    }

    /// Stop continuous sampling. No callback runs after this returns.
    ///
    /// Blocking: if a callback is running on another thread, this waits for it
    /// to finish. Called from inside the callback, it returns at once and the
    /// loop exits when the callback returns.
    pub fn stop_tracking(&self) {
        let Some(session) = lock(&self.session).take() else {
            return;
        };

        let reentrant = DELIVERING.with(|d| d.get()) == gate_id(&session.gate);
        if !reentrant {
            *lock(&session.gate) = false;
        }
        let _ = session.stop_tx.send(true);
        info!("Position tracking stopped");
    }

    pub fn is_tracking(&self) -> bool {
        lock(&self.session).is_some()
    }

    /// Most recent sample from either mode
    pub fn get_last_known_position(&self) -> Option<GeoPosition> {
        *lock(&self.shared.last_known)
    }
}

impl Drop for PositionTracker {
    fn drop(&mut self) {
        self.stop_tracking();
    }
}

async fn run_tracking(
    shared: Arc<Shared>,
    gate: Arc<Mutex<bool>>,
    on_sample: SampleCallback,
    mut stop_rx: watch::Receiver<bool>,
) {
    let period = shared.config.update_interval().max(Duration::from_millis(1));
    let mut ticker = time::interval(period);
    // A slow sample swallows the ticks it overlapped
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        match shared.sample().await {
            Ok(position) => {
                let open = lock(&gate);
                if !*open {
                    debug!("Discarding sample captured after stop");
                    break;
                }
                let _delivery = Delivery::enter(&gate);
                on_sample(position);
            }
            Err(e) => warn!("Position sample failed: {}", e),
        }
    }

    debug!("Tracking task exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Fix;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn config(update_interval_ms: u64) -> TrackerConfig {
        TrackerConfig {
            update_interval_ms,
            ..Default::default()
        }
    }

    fn collector() -> (Arc<Mutex<Vec<GeoPosition>>>, impl Fn(GeoPosition) + Send + Sync) {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&samples);
        (samples, move |p| sink.lock().unwrap().push(p))
    }

    /// Fails every other acquisition
    struct FlakySource {
        calls: AtomicU64,
    }

    #[async_trait]
    impl PositionSource for FlakySource {
        async fn acquire(&self, _high_accuracy: bool) -> Result<Fix, TrackingError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 1 {
                return Err(TrackingError::Source("no satellites".to_string()));
            }
            Ok(Fix {
                latitude: 1.0,
                longitude: 2.0,
                ..Default::default()
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_known_starts_empty() {
        let tracker = PositionTracker::new(TrackerConfig::default());
        assert!(tracker.get_last_known_position().is_none());
        assert!(!tracker.is_tracking());

        let position = tracker.get_current_position().await.unwrap();
        let last = tracker.get_last_known_position().unwrap();
        assert_eq!(last.latitude, position.latitude);
        assert_eq!(last.longitude, position.longitude);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracking_delivers_ordered_samples() {
        let source = Arc::new(SimulatedSource::new(Duration::from_millis(10)));
        let tracker = PositionTracker::with_source(config(100), source);
        let (samples, on_sample) = collector();

        tracker.start_tracking(on_sample).unwrap();
        assert!(tracker.is_tracking());
        time::sleep(Duration::from_millis(350)).await;
        tracker.stop_tracking();

        let samples = samples.lock().unwrap();
        assert!(samples.len() >= 3, "got {} samples", samples.len());
        for pair in samples.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        assert_eq!(
            tracker.get_last_known_position().map(|p| p.timestamp),
            samples.last().map(|p| p.timestamp)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_noop() {
        let tracker = PositionTracker::with_source(
            config(100),
            Arc::new(SimulatedSource::new(Duration::from_millis(10))),
        );
        let (first, on_first) = collector();
        let (second, on_second) = collector();

        tracker.start_tracking(on_first).unwrap();
        tracker.start_tracking(on_second).unwrap();
        time::sleep(Duration::from_millis(250)).await;
        tracker.stop_tracking();

        assert!(!first.lock().unwrap().is_empty());
        assert!(second.lock().unwrap().is_empty());
        assert!(!tracker.is_tracking());

        // Stop while idle is a no-op
        tracker.stop_tracking();
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_sample_discarded_after_stop() {
        // Samples take longer than the interval
        let tracker = PositionTracker::with_source(
            config(100),
            Arc::new(SimulatedSource::new(Duration::from_millis(200))),
        );
        let (samples, on_sample) = collector();

        tracker.start_tracking(on_sample).unwrap();
        // First sample lands at 200ms, the second is in flight at 250ms
        time::sleep(Duration::from_millis(250)).await;
        tracker.stop_tracking();
        let delivered = samples.lock().unwrap().len();
        assert_eq!(delivered, 1);

        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(samples.lock().unwrap().len(), delivered);

        // The in-flight sample still completed and refreshed the last known position
        let first = samples.lock().unwrap()[0];
        let last = tracker.get_last_known_position().unwrap();
        assert!(last.timestamp > first.timestamp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_can_stop_its_own_session() {
        let tracker = Arc::new(PositionTracker::with_source(
            config(100),
            Arc::new(SimulatedSource::new(Duration::from_millis(10))),
        ));
        let weak = Arc::downgrade(&tracker);
        let count = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&count);

        tracker
            .start_tracking(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                if let Some(tracker) = weak.upgrade() {
                    tracker.stop_tracking();
                }
            })
            .unwrap();

        time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!tracker.is_tracking());

        // The tracker can be started again afterwards
        let (samples, on_sample) = collector();
        tracker.start_tracking(on_sample).unwrap();
        time::sleep(Duration::from_millis(50)).await;
        tracker.stop_tracking();
        assert_eq!(samples.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_errors_do_not_stop_tracking() {
        let tracker = PositionTracker::with_source(
            config(100),
            Arc::new(FlakySource {
                calls: AtomicU64::new(0),
            }),
        );
        let (samples, on_sample) = collector();

        tracker.start_tracking(on_sample).unwrap();
        // Ticks at 0..=500ms: six attempts, every other one fails
        time::sleep(Duration::from_millis(550)).await;
        assert!(tracker.is_tracking());
        tracker.stop_tracking();

        assert_eq!(samples.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_sample_timeout() {
        let tracker = PositionTracker::with_source(
            TrackerConfig::default(),
            Arc::new(SimulatedSource::new(Duration::from_secs(10))),
        );
        let err = tracker.get_current_position().await.unwrap_err();
        assert_eq!(err, TrackingError::Timeout(5000));
        assert!(tracker.get_last_known_position().is_none());
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let tracker = PositionTracker::new(TrackerConfig::default());
        let err = tracker.start_tracking(|_| {}).unwrap_err();
        assert!(matches!(err, TrackingError::Runtime(_)));
        assert!(!tracker.is_tracking());
    }
}
