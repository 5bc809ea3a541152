//! Named metric storage.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;

use thiserror::Error;

use crate::Clock;
use crate::Counter;
use crate::Counting;
use crate::Gauge;
use crate::Histogram;
use crate::Meter;
use crate::Metered;
use crate::Metric;
use crate::MetricKind;
use crate::Sampled;
use crate::SystemClock;
use crate::Timed;
use crate::Timer;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("A {existing} named `{name}` is already registered")]
    AlreadyRegistered { name: String, existing: MetricKind },

    #[error("Metric names must not be blank")]
    BlankName,
}

/// Decides which metrics take part in a report.
pub trait MetricFilter: Send + Sync {
    fn matches(&self, name: &str, metric: &Metric) -> bool;
}

impl<F> MetricFilter for F
where F: Fn(&str, &Metric) -> bool + Send + Sync
{
    fn matches(&self, name: &str, metric: &Metric) -> bool {
        self(name, metric)
    }
}

/// Filter accepting every metric.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllMetrics;

impl MetricFilter for AllMetrics {
    fn matches(&self, _name: &str, _metric: &Metric) -> bool {
        true
    }
}

/// Metrics grouped by kind, each group ordered by name.
#[derive(Default, Clone)]
pub struct MetricSet {
    pub gauges: BTreeMap<String, Arc<dyn Gauge>>,
    pub counters: BTreeMap<String, Arc<dyn Counting>>,
    pub histograms: BTreeMap<String, Arc<dyn Sampled>>,
    pub meters: BTreeMap<String, Arc<dyn Metered>>,
    pub timers: BTreeMap<String, Arc<dyn Timed>>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.gauges.len()
            + self.counters.len()
            + self.histograms.len()
            + self.meters.len()
            + self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&mut self, name: impl Into<String>, metric: Metric) {
        let name = name.into();
        match metric {
            Metric::Gauge(m) => {
                self.gauges.insert(name, m);
            }
            Metric::Counter(m) => {
                self.counters.insert(name, m);
            }
            Metric::Histogram(m) => {
                self.histograms.insert(name, m);
            }
            Metric::Meter(m) => {
                self.meters.insert(name, m);
            }
            Metric::Timer(m) => {
                self.timers.insert(name, m);
            }
        }
    }
}

impl std::fmt::Debug for MetricSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricSet")
            .field("gauges", &self.gauges.keys().collect::<Vec<_>>())
            .field("counters", &self.counters.keys().collect::<Vec<_>>())
            .field("histograms", &self.histograms.keys().collect::<Vec<_>>())
            .field("meters", &self.meters.keys().collect::<Vec<_>>())
            .field("timers", &self.timers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Thread-safe registry of named metrics.
pub struct MetricRegistry {
    metrics: RwLock<BTreeMap<String, Metric>>,
    clock: Arc<dyn Clock>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose meters and timers tick with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            metrics: RwLock::new(BTreeMap::new()),
            clock,
        }
    }

    pub fn register(&self, name: impl Into<String>, metric: Metric) -> Result<(), RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::BlankName);
        }

        let mut metrics = self.metrics.write().expect("poisoned");
        if let Some(existing) = metrics.get(&name) {
            return Err(RegistryError::AlreadyRegistered {
                existing: existing.kind(),
                name,
            });
        }
        metrics.insert(name, metric);
        Ok(())
    }

    pub fn register_gauge(
        &self,
        name: impl Into<String>,
        gauge: impl Gauge + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Metric::Gauge(Arc::new(gauge)))
    }

    pub fn register_counter(&self, name: impl Into<String>) -> Result<Arc<Counter>, RegistryError> {
        let counter = Arc::new(Counter::new());
        self.register(name, Metric::Counter(counter.clone()))?;
        Ok(counter)
    }

    pub fn register_histogram(
        &self,
        name: impl Into<String>,
    ) -> Result<Arc<Histogram>, RegistryError> {
        let histogram = Arc::new(Histogram::new());
        self.register(name, Metric::Histogram(histogram.clone()))?;
        Ok(histogram)
    }

    pub fn register_meter(&self, name: impl Into<String>) -> Result<Arc<Meter>, RegistryError> {
        let meter = Arc::new(Meter::with_clock(self.clock.clone()));
        self.register(name, Metric::Meter(meter.clone()))?;
        Ok(meter)
    }

    pub fn register_timer(&self, name: impl Into<String>) -> Result<Arc<Timer>, RegistryError> {
        let timer = Arc::new(Timer::with_clock(self.clock.clone()));
        self.register(name, Metric::Timer(timer.clone()))?;
        Ok(timer)
    }

    pub fn remove(&self, name: &str) -> Option<Metric> {
        self.metrics.write().expect("poisoned").remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.metrics.read().expect("poisoned").keys().cloned().collect()
    }

    /// Current view of every metric accepted by `filter`.
    pub fn select(&self, filter: &dyn MetricFilter) -> MetricSet {
        let metrics = self.metrics.read().expect("poisoned");
        let mut set = MetricSet::new();
        for (name, metric) in metrics.iter() {
            if filter.matches(name, metric) {
                set.insert(name.clone(), metric.clone());
            }
        }
        set
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("metrics", &*self.metrics.read().expect("poisoned"))
            .finish_non_exhaustive()
    }
}
