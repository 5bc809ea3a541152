#![allow(dead_code)]

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use error_stack::Report;
use metric_registry::Counting;
use metric_registry::ManualClock;
use metric_registry::Metered;
use metric_registry::MetricRegistry;
use metric_registry::Sampling;
use metric_registry::Snapshot;
use series_client::CommError;
use series_client::CommResult;
use series_client::SeriesPublisher;
use series_reporter::ReporterConfig;
use series_reporter::SeriesReporter;
use series_types::Series;

pub const START_MILLIS: i64 = 1_700_000_000_000;
pub const START_EPOCH: i64 = 1_700_000_000;

/// Publisher keeping every series it was handed.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<Series>>>,
    attempts: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.failing.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn published(&self) -> Vec<Series> {
        self.published.lock().expect("poisoned").clone()
    }

    pub fn last(&self) -> Series {
        self.published().pop().expect("nothing published")
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SeriesPublisher for RecordingPublisher {
    fn publish(&self, series: &Series) -> CommResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Report::new(CommError::Network {
                message: "connection refused".into(),
            }));
        }
        self.published.lock().expect("poisoned").push(series.clone());
        Ok(())
    }
}

/// Metric with fixed count, rates and snapshot.
pub struct FixedMetric {
    pub count: i64,
    pub rates: [f64; 4],
    pub snapshot: Snapshot,
}

impl FixedMetric {
    pub fn new(count: i64) -> Self {
        Self {
            count,
            rates: [0.0; 4],
            snapshot: Snapshot::default(),
        }
    }

    /// 1, 5 and 15 minute rates followed by the mean rate.
    pub fn with_rates(mut self, rates: [f64; 4]) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = snapshot;
        self
    }
}

impl Counting for FixedMetric {
    fn count(&self) -> i64 {
        self.count
    }
}

impl Metered for FixedMetric {
    fn one_minute_rate(&self) -> f64 {
        self.rates[0]
    }

    fn five_minute_rate(&self) -> f64 {
        self.rates[1]
    }

    fn fifteen_minute_rate(&self) -> f64 {
        self.rates[2]
    }

    fn mean_rate(&self) -> f64 {
        self.rates[3]
    }
}

impl Sampling for FixedMetric {
    fn snapshot(&self) -> Snapshot {
        self.snapshot
    }
}

pub struct Fixture {
    pub registry: Arc<MetricRegistry>,
    pub clock: Arc<ManualClock>,
    pub publisher: RecordingPublisher,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_publisher(RecordingPublisher::default())
    }

    pub fn with_publisher(publisher: RecordingPublisher) -> Self {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        Self {
            registry: Arc::new(MetricRegistry::with_clock(clock.clone())),
            clock,
            publisher,
        }
    }

    pub fn config(&self) -> ReporterConfig {
        ReporterConfig::new("http://collector.local/api/v1/series", self.registry.clone())
            .with_clock(self.clock.clone())
    }

    pub fn reporter(&self) -> SeriesReporter<RecordingPublisher> {
        self.build(self.config())
    }

    pub fn build(&self, config: ReporterConfig) -> SeriesReporter<RecordingPublisher> {
        config
            .build_with_publisher(self.publisher.clone())
            .expect("valid config")
    }
}
