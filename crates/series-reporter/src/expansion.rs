//! Derived sub-metrics of histograms, meters and timers.

use derive_more::Display;
use metric_registry::Metered;
use metric_registry::Snapshot;

/// A derived value, rendered as the suffix appended to the metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Expansion {
    #[display("count")]
    Count,
    #[display("meanRate")]
    RateMean,
    #[display("1MinuteRate")]
    Rate1Minute,
    #[display("5MinuteRate")]
    Rate5Minute,
    #[display("15MinuteRate")]
    Rate15Minute,
    #[display("min")]
    Min,
    #[display("mean")]
    Mean,
    #[display("max")]
    Max,
    #[display("stddev")]
    StdDev,
    #[display("median")]
    Median,
    #[display("p75")]
    P75,
    #[display("p95")]
    P95,
    #[display("p98")]
    P98,
    #[display("p99")]
    P99,
    #[display("p999")]
    P999,
}

/// Snapshot statistics reported by default. Median, stddev, p75, p98 and
/// p999 are left out to keep series cardinality down.
pub const STATS: &[Expansion] = &[
    Expansion::Max,
    Expansion::Mean,
    Expansion::Min,
    Expansion::P95,
    Expansion::P99,
];

/// Rates reported by default.
pub const RATES: &[Expansion] = &[
    Expansion::Rate1Minute,
    Expansion::Rate5Minute,
    Expansion::Rate15Minute,
    Expansion::RateMean,
];

impl Expansion {
    /// `<name>.<suffix>`
    pub fn apply(self, name: &str) -> String {
        format!("{name}.{self}")
    }

    pub fn is_stat(self) -> bool {
        self.snapshot_value(&Snapshot::default()).is_some()
    }

    pub fn is_rate(self) -> bool {
        matches!(
            self,
            Expansion::RateMean
                | Expansion::Rate1Minute
                | Expansion::Rate5Minute
                | Expansion::Rate15Minute
        )
    }

    /// Value of a statistic, `None` for expansions that are not statistics.
    pub fn snapshot_value(self, snapshot: &Snapshot) -> Option<f64> {
        match self {
            Expansion::Max => Some(snapshot.max),
            Expansion::Mean => Some(snapshot.mean),
            Expansion::Min => Some(snapshot.min),
            Expansion::StdDev => Some(snapshot.std_dev),
            Expansion::Median => Some(snapshot.median),
            Expansion::P75 => Some(snapshot.p75),
            Expansion::P95 => Some(snapshot.p95),
            Expansion::P98 => Some(snapshot.p98),
            Expansion::P99 => Some(snapshot.p99),
            Expansion::P999 => Some(snapshot.p999),
            _ => None,
        }
    }

    /// Per-second rate, `None` for expansions that are not rates.
    pub fn rate_value<M: Metered + ?Sized>(self, metered: &M) -> Option<f64> {
        match self {
            Expansion::Rate1Minute => Some(metered.one_minute_rate()),
            Expansion::Rate5Minute => Some(metered.five_minute_rate()),
            Expansion::Rate15Minute => Some(metered.fifteen_minute_rate()),
            Expansion::RateMean => Some(metered.mean_rate()),
            _ => None,
        }
    }
}
