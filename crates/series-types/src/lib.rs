//! Wire types for the series collector
//!
//! A reporting cycle produces one [`Series`], serialized as
//! `{"series": [{"metric", "type", "value", "epoch", "host", "tags"}, ...]}`.
//! `type` is either `"counter"` or `"gauge"`, `epoch` is whole seconds and an
//! absent host is left out of the payload instead of being sent as `null`.

use serde::Deserialize;
use serde::Serialize;

/// A single scalar sample of a named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point<V> {
    /// Metric name, including any expansion suffix
    pub metric: String,
    pub value: V,
    /// Seconds since the unix epoch, shared by every point of a cycle
    pub epoch: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// `label:value` tags in resolution order
    pub tags: Vec<String>,
}

/// One flattened observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Observation {
    Counter(Point<i64>),
    Gauge(Point<GaugeNumber>),
}

/// Gauge value as sent on the wire. Integers stay integers so large values
/// keep their precision and render without a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GaugeNumber {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
}

impl GaugeNumber {
    pub fn as_f64(self) -> f64 {
        match self {
            GaugeNumber::Integer(i) => i as f64,
            GaugeNumber::Unsigned(u) => u as f64,
            GaugeNumber::Float(f) => f,
        }
    }

    /// `false` for NaN and infinities, which JSON cannot represent.
    pub fn is_finite(self) -> bool {
        match self {
            GaugeNumber::Float(f) => f.is_finite(),
            GaugeNumber::Integer(_) | GaugeNumber::Unsigned(_) => true,
        }
    }
}

impl From<i64> for GaugeNumber {
    fn from(value: i64) -> Self {
        GaugeNumber::Integer(value)
    }
}

impl From<u64> for GaugeNumber {
    fn from(value: u64) -> Self {
        GaugeNumber::Unsigned(value)
    }
}

impl From<f64> for GaugeNumber {
    fn from(value: f64) -> Self {
        GaugeNumber::Float(value)
    }
}

impl Observation {
    pub fn counter(
        metric: impl Into<String>,
        value: i64,
        epoch: i64,
        host: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        Observation::Counter(Point {
            metric: metric.into(),
            value,
            epoch,
            host,
            tags,
        })
    }

    pub fn gauge(
        metric: impl Into<String>,
        value: impl Into<GaugeNumber>,
        epoch: i64,
        host: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        Observation::Gauge(Point {
            metric: metric.into(),
            value: value.into(),
            epoch,
            host,
            tags,
        })
    }

    pub fn metric(&self) -> &str {
        match self {
            Observation::Counter(p) => &p.metric,
            Observation::Gauge(p) => &p.metric,
        }
    }

    pub fn epoch(&self) -> i64 {
        match self {
            Observation::Counter(p) => p.epoch,
            Observation::Gauge(p) => p.epoch,
        }
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            Observation::Counter(p) => p.host.as_deref(),
            Observation::Gauge(p) => p.host.as_deref(),
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Observation::Counter(p) => &p.tags,
            Observation::Gauge(p) => &p.tags,
        }
    }

    /// Value widened to `f64`, handy for assertions and logging.
    pub fn value(&self) -> f64 {
        match self {
            Observation::Counter(p) => p.value as f64,
            Observation::Gauge(p) => p.value.as_f64(),
        }
    }

    /// The wire `type` literal.
    pub fn kind(&self) -> &'static str {
        match self {
            Observation::Counter(_) => "counter",
            Observation::Gauge(_) => "gauge",
        }
    }
}

/// Ordered batch of observations produced by one reporting cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub series: Vec<Observation>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observation: Observation) {
        self.series.push(observation);
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.series.iter()
    }
}

impl Extend<Observation> for Series {
    fn extend<I: IntoIterator<Item = Observation>>(&mut self, iter: I) {
        self.series.extend(iter);
    }
}

impl FromIterator<Observation> for Series {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}
