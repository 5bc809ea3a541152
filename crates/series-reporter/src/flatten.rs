//! Turns registry metrics into flat observations.
//!
//! Kinds are processed in a fixed order (gauges, counters, histograms, meters,
//! timers) and each kind in identifier order, so the same registry state always
//! yields the same series. The first resolution or expansion error aborts the
//! whole pass.

use std::collections::BTreeMap;
use std::sync::Arc;

use metric_registry::Counting;
use metric_registry::Gauge;
use metric_registry::GaugeValue;
use metric_registry::Metered;
use metric_registry::MetricSet;
use metric_registry::Sampled;
use metric_registry::Snapshot;
use metric_registry::Timed;
use series_types::GaugeNumber;
use series_types::Observation;
use series_types::Series;
use tracing::debug;
use tracing::trace;

use crate::error::ReportError;
use crate::expansion::Expansion;
use crate::expansion::RATES;
use crate::expansion::STATS;
use crate::resolver::MetricInfo;
use crate::resolver::ResolverChain;
use crate::units::TimeUnit;

pub struct Flattener {
    chain: ResolverChain,
    host: Option<String>,
    stats: Vec<Expansion>,
    rates: Vec<Expansion>,
    rate_factor: f64,
    duration_factor: f64,
}

impl Flattener {
    /// Flattener with the default expansion tables, rates per second and
    /// durations in milliseconds.
    pub fn new(chain: ResolverChain, host: Option<String>) -> Self {
        Self {
            chain,
            host,
            stats: STATS.to_vec(),
            rates: RATES.to_vec(),
            rate_factor: TimeUnit::Seconds.as_secs_f64(),
            duration_factor: TimeUnit::Milliseconds.as_nanos_f64(),
        }
    }

    /// Rates are multiplied by the length of `unit` in seconds.
    pub fn with_rate_unit(mut self, unit: TimeUnit) -> Self {
        self.rate_factor = unit.as_secs_f64();
        self
    }

    /// Nanosecond durations are divided by the length of `unit` in nanoseconds.
    pub fn with_duration_unit(mut self, unit: TimeUnit) -> Self {
        self.duration_factor = unit.as_nanos_f64();
        self
    }

    pub fn with_stats(mut self, stats: Vec<Expansion>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_rates(mut self, rates: Vec<Expansion>) -> Self {
        self.rates = rates;
        self
    }

    pub fn chain(&self) -> &ResolverChain {
        &self.chain
    }

    pub fn convert_rate(&self, per_second: f64) -> f64 {
        per_second * self.rate_factor
    }

    pub fn convert_duration(&self, nanos: f64) -> f64 {
        nanos / self.duration_factor
    }

    /// Flatten every metric of `metrics`, stamping all points with `epoch`.
    pub fn flatten(&self, metrics: &MetricSet, epoch: i64) -> Result<Series, ReportError> {
        let mut series = Series::new();
        self.gauges(&metrics.gauges, epoch, &mut series)?;
        self.counters(&metrics.counters, epoch, &mut series)?;
        self.histograms(&metrics.histograms, epoch, &mut series)?;
        self.meters(&metrics.meters, epoch, &mut series)?;
        self.timers(&metrics.timers, epoch, &mut series)?;
        Ok(series)
    }

    fn gauges(
        &self,
        gauges: &BTreeMap<String, Arc<dyn Gauge>>,
        epoch: i64,
        out: &mut Series,
    ) -> Result<(), ReportError> {
        for (id, gauge) in gauges {
            let value = gauge.value();
            let Some(number) = gauge_number(&value) else {
                trace!(metric = %id, ?value, "Skipping non-numeric gauge");
                continue;
            };
            let info = self.chain.resolve(id)?;
            self.push_gauge(out, info.name.clone(), number, epoch, &info);
        }
        Ok(())
    }

    fn counters(
        &self,
        counters: &BTreeMap<String, Arc<dyn Counting>>,
        epoch: i64,
        out: &mut Series,
    ) -> Result<(), ReportError> {
        for (id, counter) in counters {
            let info = self.chain.resolve(id)?;
            out.push(self.counter(info.name.clone(), counter.count(), epoch, &info));
        }
        Ok(())
    }

    fn histograms(
        &self,
        histograms: &BTreeMap<String, Arc<dyn Sampled>>,
        epoch: i64,
        out: &mut Series,
    ) -> Result<(), ReportError> {
        for (id, histogram) in histograms {
            let info = self.chain.resolve(id)?;
            out.push(self.count_of(histogram.count(), epoch, &info));
            self.push_stats(out, &histogram.snapshot(), |v| v, epoch, &info)?;
        }
        Ok(())
    }

    fn meters(
        &self,
        meters: &BTreeMap<String, Arc<dyn Metered>>,
        epoch: i64,
        out: &mut Series,
    ) -> Result<(), ReportError> {
        for (id, meter) in meters {
            let info = self.chain.resolve(id)?;
            out.push(self.count_of(meter.count(), epoch, &info));
            self.push_rates(out, meter.as_ref(), epoch, &info)?;
        }
        Ok(())
    }

    fn timers(
        &self,
        timers: &BTreeMap<String, Arc<dyn Timed>>,
        epoch: i64,
        out: &mut Series,
    ) -> Result<(), ReportError> {
        for (id, timer) in timers {
            let info = self.chain.resolve(id)?;
            out.push(self.count_of(timer.count(), epoch, &info));
            self.push_rates(out, timer.as_ref(), epoch, &info)?;
            self.push_stats(
                out,
                &timer.snapshot(),
                |nanos| self.convert_duration(nanos),
                epoch,
                &info,
            )?;
        }
        Ok(())
    }

    fn push_rates<M: Metered + ?Sized>(
        &self,
        out: &mut Series,
        metered: &M,
        epoch: i64,
        info: &MetricInfo,
    ) -> Result<(), ReportError> {
        for &expansion in &self.rates {
            let rate = expansion
                .rate_value(metered)
                .ok_or_else(|| ReportError::Expansion {
                    metric: info.name.clone(),
                    expansion,
                })?;
            self.push_gauge(
                out,
                expansion.apply(&info.name),
                self.convert_rate(rate),
                epoch,
                info,
            );
        }
        Ok(())
    }

    fn push_stats(
        &self,
        out: &mut Series,
        snapshot: &Snapshot,
        convert: impl Fn(f64) -> f64,
        epoch: i64,
        info: &MetricInfo,
    ) -> Result<(), ReportError> {
        for &expansion in &self.stats {
            let value = expansion
                .snapshot_value(snapshot)
                .ok_or_else(|| ReportError::Expansion {
                    metric: info.name.clone(),
                    expansion,
                })?;
            self.push_gauge(out, expansion.apply(&info.name), convert(value), epoch, info);
        }
        Ok(())
    }

    fn count_of(&self, count: i64, epoch: i64, info: &MetricInfo) -> Observation {
        self.counter(Expansion::Count.apply(&info.name), count, epoch, info)
    }

    fn counter(&self, name: String, value: i64, epoch: i64, info: &MetricInfo) -> Observation {
        Observation::counter(name, value, epoch, self.host.clone(), info.tags.clone())
    }

    // NaN and infinities cannot be carried by the JSON payload.
    fn push_gauge(
        &self,
        out: &mut Series,
        name: String,
        value: impl Into<GaugeNumber>,
        epoch: i64,
        info: &MetricInfo,
    ) {
        let value = value.into();
        if !value.is_finite() {
            debug!(metric = %name, ?value, "Dropping non-finite gauge value");
            return;
        }
        out.push(Observation::gauge(
            name,
            value,
            epoch,
            self.host.clone(),
            info.tags.clone(),
        ));
    }
}

impl std::fmt::Debug for Flattener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flattener")
            .field("chain", &self.chain)
            .field("host", &self.host)
            .field("stats", &self.stats)
            .field("rates", &self.rates)
            .field("rate_factor", &self.rate_factor)
            .field("duration_factor", &self.duration_factor)
            .finish()
    }
}

// Integers are passed through untouched, booleans become 1 / 0.
fn gauge_number(value: &GaugeValue) -> Option<GaugeNumber> {
    match value {
        GaugeValue::Integer(i) => Some(GaugeNumber::Integer(*i)),
        GaugeValue::UnsignedInteger(u) => Some(GaugeNumber::Unsigned(*u)),
        GaugeValue::Float(f) => Some(GaugeNumber::Float(*f)),
        GaugeValue::Boolean(b) => Some(GaugeNumber::Integer(i64::from(*b))),
        GaugeValue::Text(_) | GaugeValue::Absent => None,
    }
}

#[cfg(test)]
mod tests {
    use metric_registry::Metric;
    use metric_registry::Sampling;
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::resolver::MetricInfoResolver;
    use crate::resolver::SegmentResolver;

    struct Fixed {
        count: i64,
        snapshot: Snapshot,
    }

    impl Counting for Fixed {
        fn count(&self) -> i64 {
            self.count
        }
    }

    impl Metered for Fixed {
        fn one_minute_rate(&self) -> f64 {
            1.0
        }

        fn five_minute_rate(&self) -> f64 {
            5.0
        }

        fn fifteen_minute_rate(&self) -> f64 {
            15.0
        }

        fn mean_rate(&self) -> f64 {
            0.5
        }
    }

    impl Sampling for Fixed {
        fn snapshot(&self) -> Snapshot {
            self.snapshot
        }
    }

    fn fixed(count: i64) -> Arc<Fixed> {
        Arc::new(Fixed {
            count,
            snapshot: Snapshot {
                max: 4_000_000.0,
                mean: 2_000_000.0,
                min: 1_000_000.0,
                p95: 3_000_000.0,
                p99: 3_500_000.0,
                ..Snapshot::default()
            },
        })
    }

    fn flattener(global_tags: &[&str]) -> Flattener {
        let chain = ResolverChain::new(
            vec![Box::new(SegmentResolver::new("pool", &["pool"])) as Box<dyn MetricInfoResolver>],
            global_tags.iter().map(|t| t.to_string()).collect(),
        );
        Flattener::new(chain, Some("web-1".to_string()))
    }

    fn names(series: &Series) -> Vec<&str> {
        series.iter().map(Observation::metric).collect()
    }

    #[test]
    fn counters_are_not_suffixed() {
        let mut set = MetricSet::new();
        set.insert("requests", Metric::Counter(fixed(12)));

        let series = flattener(&["env:prod"]).flatten(&set, 1_700_000_000).expect("flatten");
        assert_eq!(series.len(), 1);

        let point = series.iter().next().expect("one point");
        assert_eq!(point.metric(), "requests");
        assert_eq!(point.kind(), "counter");
        assert_eq!(point.value(), 12.0);
        assert_eq!(point.epoch(), 1_700_000_000);
        assert_eq!(point.host(), Some("web-1"));
        assert_eq!(point.tags().to_vec(), vec!["env:prod".to_string()]);
    }

    #[test]
    fn histogram_emits_count_and_stats() {
        let mut set = MetricSet::new();
        set.insert("sizes", Metric::Histogram(fixed(3)));

        let series = flattener(&[]).flatten(&set, 1).expect("flatten");
        assert_eq!(names(&series), vec![
            "sizes.count",
            "sizes.max",
            "sizes.mean",
            "sizes.min",
            "sizes.p95",
            "sizes.p99",
        ]);
        // histogram values are not unit converted
        assert_eq!(series.iter().nth(1).map(Observation::value), Some(4_000_000.0));
    }

    #[test]
    fn meter_rates_follow_the_rate_unit() {
        let mut set = MetricSet::new();
        set.insert("hits", Metric::Meter(fixed(9)));

        let series = flattener(&[])
            .with_rate_unit(TimeUnit::Minutes)
            .flatten(&set, 1)
            .expect("flatten");
        assert_eq!(names(&series), vec![
            "hits.count",
            "hits.1MinuteRate",
            "hits.5MinuteRate",
            "hits.15MinuteRate",
            "hits.meanRate",
        ]);
        let values: Vec<f64> = series.iter().map(Observation::value).collect();
        assert_eq!(values, vec![9.0, 60.0, 300.0, 900.0, 30.0]);
    }

    #[test]
    fn timer_durations_follow_the_duration_unit() {
        let mut set = MetricSet::new();
        set.insert("pool.io.latency", Metric::Timer(fixed(2)));

        let series = flattener(&[]).flatten(&set, 1).expect("flatten");
        assert_eq!(series.len(), 10);
        assert_eq!(names(&series)[..6].to_vec(), vec![
            "pool.latency.count",
            "pool.latency.1MinuteRate",
            "pool.latency.5MinuteRate",
            "pool.latency.15MinuteRate",
            "pool.latency.meanRate",
            "pool.latency.max",
        ]);

        let max = series.iter().nth(5).expect("max");
        assert_eq!(max.value(), 4.0);
        assert_eq!(max.tags().to_vec(), vec!["pool:io".to_string()]);
    }

    #[test]
    fn custom_tables_replace_defaults() {
        let mut set = MetricSet::new();
        set.insert("sizes", Metric::Histogram(fixed(3)));

        let series = flattener(&[])
            .with_stats(vec![Expansion::Median, Expansion::P999])
            .flatten(&set, 1)
            .expect("flatten");
        assert_eq!(names(&series), vec!["sizes.count", "sizes.median", "sizes.p999"]);
    }

    #[test]
    fn a_rate_in_the_stats_table_is_an_error() {
        let mut set = MetricSet::new();
        set.insert("sizes", Metric::Histogram(fixed(3)));

        let err = flattener(&[])
            .with_stats(vec![Expansion::RateMean])
            .flatten(&set, 1)
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Cannot expand `sizes` with `meanRate`");
    }

    #[test]
    fn non_numeric_and_non_finite_gauges_are_skipped() {
        let mut set = MetricSet::new();
        set.insert("a.text", Metric::Gauge(Arc::new(|| GaugeValue::from("idle"))));
        set.insert("b.nan", Metric::Gauge(Arc::new(|| GaugeValue::from(f64::NAN))));
        set.insert("c.up", Metric::Gauge(Arc::new(|| GaugeValue::from(true))));

        let series = flattener(&[]).flatten(&set, 1).expect("flatten");
        assert_eq!(names(&series), vec!["c.up"]);
        assert_eq!(series.iter().next().map(Observation::value), Some(1.0));
    }

    #[test]
    fn integer_gauges_are_not_widened() {
        let mut set = MetricSet::new();
        let big = || GaugeValue::from(9_007_199_254_740_993u64);
        set.insert("bytes", Metric::Gauge(Arc::new(big)));
        set.insert("open", Metric::Gauge(Arc::new(|| GaugeValue::from(-4i64))));
        set.insert("up", Metric::Gauge(Arc::new(|| GaugeValue::from(false))));

        let series = flattener(&[]).flatten(&set, 1).expect("flatten");
        let values: Vec<GaugeNumber> = series
            .iter()
            .map(|o| match o {
                Observation::Gauge(point) => point.value,
                Observation::Counter(_) => panic!("expected gauges only"),
            })
            .collect();
        assert_eq!(values, vec![
            GaugeNumber::Unsigned(9_007_199_254_740_993),
            GaugeNumber::Integer(-4),
            GaugeNumber::Integer(0),
        ]);
    }

    #[test]
    fn kinds_are_emitted_in_fixed_order() {
        let mut set = MetricSet::new();
        set.insert("t", Metric::Timer(fixed(1)));
        set.insert("m", Metric::Meter(fixed(1)));
        set.insert("h", Metric::Histogram(fixed(1)));
        set.insert("c", Metric::Counter(fixed(1)));
        set.insert("g", Metric::Gauge(Arc::new(|| GaugeValue::from(1i64))));

        let series = flattener(&[]).flatten(&set, 1).expect("flatten");
        let firsts: Vec<&str> = names(&series)
            .into_iter()
            .filter(|n| !n.contains('.') || n.ends_with(".count"))
            .collect();
        assert_eq!(firsts, vec!["g", "c", "h.count", "m.count", "t.count"]);
    }

    #[test]
    fn empty_set_flattens_to_nothing() {
        let series = flattener(&["env:prod"]).flatten(&MetricSet::new(), 1).expect("flatten");
        assert!(series.is_empty());
    }
}
