//! In-process metric registry
//!
//! The registry stores named gauges, counters, histograms, meters and timers and
//! hands out point-in-time, name-ordered views of them. Reporters only ever
//! read through the traits defined here, so any type implementing
//! [`Gauge`], [`Counting`], [`Metered`] or [`Sampling`] can be registered next
//! to the bundled implementations.
//!
//! # Examples
//!
//! ```
//! use metric_registry::AllMetrics;
//! use metric_registry::GaugeValue;
//! use metric_registry::MetricRegistry;
//!
//! let registry = MetricRegistry::new();
//! let requests = registry.register_counter("requests").unwrap();
//! requests.inc(3);
//! registry
//!     .register_gauge("queue.depth", || GaugeValue::from(7i64))
//!     .unwrap();
//!
//! let set = registry.select(&AllMetrics);
//! assert_eq!(set.counters.len(), 1);
//! assert_eq!(set.gauges.len(), 1);
//! ```

pub mod clock;
pub mod metrics;
pub mod registry;
pub mod snapshot;

use std::sync::Arc;

use derive_more::Display;

pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use metrics::Counter;
pub use metrics::Histogram;
pub use metrics::Meter;
pub use metrics::Timer;
pub use metrics::TimerContext;
pub use registry::AllMetrics;
pub use registry::MetricFilter;
pub use registry::MetricRegistry;
pub use registry::MetricSet;
pub use registry::RegistryError;
pub use snapshot::Snapshot;

/// Current value of a gauge. Gauges may report anything; only the numeric
/// and boolean variants carry a number.
#[derive(Debug, Clone, PartialEq)]
pub enum GaugeValue {
    Integer(i64),
    UnsignedInteger(u64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Absent,
}

impl GaugeValue {
    /// Numeric view of the value, booleans map to `1.0` / `0.0`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            GaugeValue::Integer(i) => Some(*i as f64),
            GaugeValue::UnsignedInteger(u) => Some(*u as f64),
            GaugeValue::Float(f) => Some(*f),
            GaugeValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            GaugeValue::Text(_) | GaugeValue::Absent => None,
        }
    }
}

impl From<String> for GaugeValue {
    fn from(value: String) -> Self {
        GaugeValue::Text(value)
    }
}

impl From<&str> for GaugeValue {
    fn from(value: &str) -> Self {
        GaugeValue::Text(value.to_string())
    }
}

impl From<i64> for GaugeValue {
    fn from(value: i64) -> Self {
        GaugeValue::Integer(value)
    }
}

impl From<u64> for GaugeValue {
    fn from(value: u64) -> Self {
        GaugeValue::UnsignedInteger(value)
    }
}

impl From<f64> for GaugeValue {
    fn from(value: f64) -> Self {
        GaugeValue::Float(value)
    }
}

impl From<bool> for GaugeValue {
    fn from(value: bool) -> Self {
        GaugeValue::Boolean(value)
    }
}

impl<T: Into<GaugeValue>> From<Option<T>> for GaugeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(GaugeValue::Absent, Into::into)
    }
}

/// A metric whose value is read on demand.
pub trait Gauge: Send + Sync {
    fn value(&self) -> GaugeValue;
}

impl<F> Gauge for F
where F: Fn() -> GaugeValue + Send + Sync
{
    fn value(&self) -> GaugeValue {
        self()
    }
}

/// Anything with a cumulative count.
pub trait Counting: Send + Sync {
    fn count(&self) -> i64;
}

/// A counted metric that also tracks throughput, in events per second.
pub trait Metered: Counting {
    fn one_minute_rate(&self) -> f64;
    fn five_minute_rate(&self) -> f64;
    fn fifteen_minute_rate(&self) -> f64;
    fn mean_rate(&self) -> f64;
}

/// A metric that can summarize its recorded values.
pub trait Sampling: Send + Sync {
    fn snapshot(&self) -> Snapshot;
}

/// Histogram shape: a count plus a distribution snapshot.
pub trait Sampled: Counting + Sampling {}

impl<T: Counting + Sampling> Sampled for T {}

/// Timer shape: rates plus a snapshot of durations in nanoseconds.
pub trait Timed: Metered + Sampling {}

impl<T: Metered + Sampling> Timed for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum MetricKind {
    #[display("gauge")]
    Gauge,
    #[display("counter")]
    Counter,
    #[display("histogram")]
    Histogram,
    #[display("meter")]
    Meter,
    #[display("timer")]
    Timer,
}

/// A registered metric.
#[derive(Clone)]
pub enum Metric {
    Gauge(Arc<dyn Gauge>),
    Counter(Arc<dyn Counting>),
    Histogram(Arc<dyn Sampled>),
    Meter(Arc<dyn Metered>),
    Timer(Arc<dyn Timed>),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Meter(_) => MetricKind::Meter,
            Metric::Timer(_) => MetricKind::Timer,
        }
    }
}

impl std::fmt::Debug for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Metric::{:?}", self.kind())
    }
}
