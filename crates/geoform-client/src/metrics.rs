//! # Metrics Recorder
//!
//! An append-only ring buffer of timing samples with a
//! publish/subscribe notification channel, used to observe the latency
//! of cached vs. live geo fetches.
//!
//! ## Architecture
//!
//! The buffer and the subscriber registry sit behind separate
//! `parking_lot::Mutex`es. Dispatch works from a snapshot of the
//! registry taken before any callback runs, so a subscriber registered
//! *during* a notification never receives that in-flight sample and no
//! lock is held while user code executes.
//!
//! Samples handed to subscribers and returned from [`MetricsRecorder::samples`]
//! are read-only copies; the buffer itself is never shared out.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum number of samples retained; the oldest is dropped when full.
pub const MAX_SAMPLES: usize = 100;

/// Durations above this threshold produce a warning-level log line.
pub const SLOW_OP_THRESHOLD: Duration = Duration::from_millis(1000);

/// What kind of work a sample measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    /// A round trip to the remote geo service.
    NetworkCall,
    /// Rendering work in the consuming UI layer.
    Render,
    /// A user-initiated interaction measured end to end.
    UserAction,
    /// Resource loading (images, fonts, ...).
    Resource,
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkCall => write!(f, "network_call"),
            Self::Render => write!(f, "render"),
            Self::UserAction => write!(f, "user_action"),
            Self::Resource => write!(f, "resource"),
        }
    }
}

/// A single timing observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Operation name (e.g. `get_states`).
    pub name: String,
    /// Elapsed wall-clock time; never negative by construction.
    pub duration: Duration,
    /// When the sample was recorded.
    pub timestamp: DateTime<Utc>,
    /// What kind of work was measured.
    pub category: MetricCategory,
    /// Free-form annotations (e.g. `status: success`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl MetricSample {
    /// Build a sample stamped with the current time and no metadata.
    pub fn new(name: impl Into<String>, duration: Duration, category: MetricCategory) -> Self {
        Self {
            name: name.into(),
            duration,
            timestamp: Utc::now(),
            category,
            metadata: BTreeMap::new(),
        }
    }
}

type SubscriberFn = Arc<dyn Fn(&MetricSample) + Send + Sync>;
type SubscriberRegistry = Arc<Mutex<Vec<(u64, SubscriberFn)>>>;

/// Bounded ring buffer of timing samples with observer notification.
pub struct MetricsRecorder {
    samples: Mutex<VecDeque<MetricSample>>,
    capacity: usize,
    subscribers: SubscriberRegistry,
    next_subscriber_id: AtomicU64,
}

impl fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("capacity", &self.capacity)
            .field("len", &self.samples.lock().len())
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}

impl MetricsRecorder {
    /// Create a recorder with the default capacity of [`MAX_SAMPLES`].
    pub fn new() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }

    /// Create a recorder retaining at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscriber_id: AtomicU64::new(0),
        }
    }

    /// Append a sample, dropping the oldest when the buffer is full, and
    /// synchronously notify every subscriber registered before this call.
    pub fn record(&self, sample: MetricSample) {
        {
            let mut samples = self.samples.lock();
            if samples.len() == self.capacity {
                samples.pop_front();
            }
            samples.push_back(sample.clone());
        }

        // Snapshot before dispatch: subscribers added by a callback must
        // not see this sample, and no lock is held while callbacks run.
        let current: Vec<SubscriberFn> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in current {
            callback(&sample);
        }

        if sample.duration > SLOW_OP_THRESHOLD {
            tracing::warn!(
                name = %sample.name,
                category = %sample.category,
                duration_ms = sample.duration.as_millis() as u64,
                "slow operation detected"
            );
        }
    }

    /// Start a wall-clock timer; stopping it records a
    /// [`MetricCategory::UserAction`] sample.
    pub fn start_timer(&self, name: impl Into<String>) -> RunningTimer<'_> {
        RunningTimer {
            recorder: self,
            name: name.into(),
            started_at: Instant::now(),
        }
    }

    /// Run `op`, record exactly one [`MetricCategory::NetworkCall`]
    /// sample with the outcome as metadata, and hand back the original
    /// result unchanged — success and failure alike.
    pub async fn measure_call<T, E, Fut>(&self, name: impl Into<String>, op: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let name = name.into();
        let started_at = Instant::now();
        let result = op.await;
        let duration = started_at.elapsed();

        let mut metadata = BTreeMap::new();
        match &result {
            Ok(_) => {
                metadata.insert("status".to_string(), "success".to_string());
            }
            Err(e) => {
                metadata.insert("status".to_string(), "error".to_string());
                metadata.insert("error".to_string(), e.to_string());
            }
        }

        self.record(MetricSample {
            name,
            duration,
            timestamp: Utc::now(),
            category: MetricCategory::NetworkCall,
            metadata,
        });

        result
    }

    /// Register an observer. The returned handle deregisters the
    /// observer when dropped (or via [`SubscriberHandle::unsubscribe`]).
    pub fn subscribe(
        &self,
        callback: impl Fn(&MetricSample) + Send + Sync + 'static,
    ) -> SubscriberHandle {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.subscribers.lock().push((id, Arc::new(callback)));
        SubscriberHandle {
            id,
            registry: Arc::clone(&self.subscribers),
        }
    }

    /// Snapshot of current buffer contents, most-recent-last.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.samples.lock().iter().cloned().collect()
    }

    /// Mean duration over samples named `name`, or zero if none match.
    pub fn average_duration(&self, name: &str) -> Duration {
        let samples = self.samples.lock();
        let matching: Vec<&MetricSample> = samples.iter().filter(|s| s.name == name).collect();
        if matching.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = matching.iter().map(|s| s.duration).sum();
        total / matching.len() as u32
    }

    /// Empty the buffer. Observers are not notified.
    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// A started timer. Call [`RunningTimer::stop`] to record the elapsed
/// time; an abandoned timer records nothing.
#[must_use = "a timer records nothing until stopped"]
pub struct RunningTimer<'a> {
    recorder: &'a MetricsRecorder,
    name: String,
    started_at: Instant,
}

impl RunningTimer<'_> {
    /// Stop the timer and record the elapsed time as a user-action sample.
    pub fn stop(self) {
        let duration = self.started_at.elapsed();
        self.recorder.record(MetricSample::new(
            self.name,
            duration,
            MetricCategory::UserAction,
        ));
    }
}

/// Deregistration handle for a subscriber. Dropping it removes the
/// observer; removal is id-based and deterministic.
pub struct SubscriberHandle {
    id: u64,
    registry: SubscriberRegistry,
}

impl SubscriberHandle {
    /// Explicitly deregister the observer (equivalent to dropping).
    pub fn unsubscribe(self) {}
}

impl Drop for SubscriberHandle {
    fn drop(&mut self) {
        self.registry.lock().retain(|(id, _)| *id != self.id);
    }
}
