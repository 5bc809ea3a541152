//! Flattening metrics reporter.
//!
//! Every reporting cycle reads the metrics of a [`metric_registry::MetricRegistry`],
//! flattens each of them into scalar observations and ships the whole batch
//! to an HTTP collector in a single request:
//!
//! * gauges become one gauge observation, non-numeric gauges are skipped
//! * counters become one counter observation
//! * histograms become `<name>.count` plus one gauge per statistic in [`STATS`]
//! * meters become `<name>.count` plus one gauge per rate in [`RATES`]
//! * timers become `<name>.count`, the rates and then the statistics
//!
//! Names and tags come from a [`ResolverChain`], the first resolver
//! recognizing an identifier wins and unknown identifiers are reported as they
//! are. Reporting errors are logged, never returned.

pub mod cadence;
pub mod config;
pub mod error;
pub mod expansion;
pub mod flatten;
pub mod reporter;
pub mod resolver;
pub mod schedule;
pub mod units;

pub use cadence::CadenceGuard;
pub use cadence::MIN_REPORT_INTERVAL_MILLIS;
pub use config::ReporterConfig;
pub use error::ConfigError;
pub use error::ReportError;
pub use error::ScheduleError;
pub use expansion::Expansion;
pub use expansion::RATES;
pub use expansion::STATS;
pub use flatten::Flattener;
pub use reporter::SeriesReporter;
pub use resolver::presets;
pub use resolver::MetricInfo;
pub use resolver::MetricInfoResolver;
pub use resolver::ResolveError;
pub use resolver::ResolverChain;
pub use resolver::SegmentResolver;
pub use schedule::ReportingTask;
pub use units::TimeUnit;
pub use units::UnknownTimeUnit;
