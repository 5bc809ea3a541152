//! The reporting cycle.

use std::any::Any;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use metric_registry::Clock;
use metric_registry::MetricFilter;
use metric_registry::MetricRegistry;
use metric_registry::MetricSet;
use series_client::BlockingSeriesClient;
use series_client::SeriesPublisher;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::cadence::CadenceGuard;
use crate::error::ReportError;
use crate::flatten::Flattener;

/// Periodically invoked reporter shipping every selected metric as one series.
///
/// Failures inside a cycle are logged and swallowed, so a broken metric or an
/// unreachable collector never takes the caller down. Cycles closer than one
/// second to the previous one are skipped.
pub struct SeriesReporter<P = BlockingSeriesClient> {
    registry: Arc<MetricRegistry>,
    filter: Box<dyn MetricFilter>,
    flattener: Flattener,
    publisher: P,
    clock: Arc<dyn Clock>,
    cadence: CadenceGuard,
}

impl<P: SeriesPublisher> SeriesReporter<P> {
    pub(crate) fn new(
        registry: Arc<MetricRegistry>,
        filter: Box<dyn MetricFilter>,
        flattener: Flattener,
        publisher: P,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            filter,
            flattener,
            publisher,
            clock,
            cadence: CadenceGuard::new(),
        }
    }

    /// Report everything in the registry that passes the filter. The
    /// registry is only read when the cycle is not skipped.
    pub fn report(&mut self) {
        self.run(None);
    }

    /// Report an explicit set of metrics.
    pub fn report_metrics(&mut self, metrics: &MetricSet) {
        self.run(Some(metrics));
    }

    fn run(&mut self, metrics: Option<&MetricSet>) {
        let now = self.clock.now_millis();
        if self.cadence.too_soon(now) {
            info!(
                last_run = self.cadence.last_run_millis(),
                now, "Skipping metrics reporting to endpoint"
            );
            return;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| match metrics {
            Some(metrics) => self.cycle(metrics, now),
            None => self.cycle(&self.registry.select(self.filter.as_ref()), now),
        }));
        match outcome {
            Ok(Ok(0)) => debug!("No metrics to report"),
            Ok(Ok(points)) => debug!(points, "Reported metrics"),
            Ok(Err(ReportError::Publish(report))) => {
                warn!(error = ?report, "Failed to report metrics");
            }
            Ok(Err(e)) => error!(error = %e, "Failed to report metrics"),
            Err(payload) => error!(
                panic = panic_message(payload.as_ref()),
                "Defect while reporting metrics"
            ),
        }
        self.cadence.record(now);
    }

    fn cycle(&self, metrics: &MetricSet, now: i64) -> Result<usize, ReportError> {
        let series = self.flattener.flatten(metrics, now / 1000)?;
        if series.is_empty() {
            return Ok(0);
        }
        self.publisher.publish(&series)?;
        Ok(series.len())
    }

    /// Clock reading at the start of the last cycle that was not skipped,
    /// `0` before the first one.
    pub fn last_run_millis(&self) -> i64 {
        self.cadence.last_run_millis()
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn flattener(&self) -> &Flattener {
        &self.flattener
    }
}

impl<P> std::fmt::Debug for SeriesReporter<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesReporter")
            .field("flattener", &self.flattener)
            .field("cadence", &self.cadence)
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
