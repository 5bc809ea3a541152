//! Reporter configuration.

use std::sync::Arc;
use std::time::Duration;

use metric_registry::AllMetrics;
use metric_registry::Clock;
use metric_registry::MetricFilter;
use metric_registry::MetricRegistry;
use metric_registry::SystemClock;
use series_client::BlockingSeriesClient;
use series_client::ClientConfig;
use series_client::SeriesPublisher;
use series_client::DEFAULT_CONNECT_TIMEOUT;
use series_client::DEFAULT_SOCKET_TIMEOUT;
use tracing::info;
use url::Url;

use crate::error::ConfigError;
use crate::expansion::Expansion;
use crate::expansion::RATES;
use crate::expansion::STATS;
use crate::flatten::Flattener;
use crate::reporter::SeriesReporter;
use crate::resolver::presets;
use crate::resolver::MetricInfoResolver;
use crate::resolver::ResolverChain;
use crate::units::TimeUnit;

/// Everything needed to build a [`SeriesReporter`].
///
/// `env`, `group` and `application` turn into `env:<v>`, `group:<v>` and
/// `application:<v>` tags placed before the explicit tags. The host is sent
/// in the `host` field of every observation, never as a tag.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use metric_registry::MetricRegistry;
/// use series_reporter::ReporterConfig;
/// use series_reporter::TimeUnit;
///
/// let registry = Arc::new(MetricRegistry::new());
/// let mut reporter = ReporterConfig::new("http://collector:8080/api/v1/series", registry)
///     .with_host("web-1")
///     .with_env("prod")
///     .with_tag("region:eu-west-1")
///     .with_rate_unit(TimeUnit::Minutes)
///     .with_runtime_resolvers()
///     .build()
///     .unwrap();
/// reporter.report();
/// ```
pub struct ReporterConfig {
    url: String,
    registry: Arc<MetricRegistry>,
    host: Option<String>,
    env: Option<String>,
    group: Option<String>,
    application: Option<String>,
    tags: Vec<String>,
    filter: Box<dyn MetricFilter>,
    connect_timeout: Duration,
    socket_timeout: Duration,
    resolvers: Vec<Box<dyn MetricInfoResolver>>,
    rate_unit: TimeUnit,
    duration_unit: TimeUnit,
    stats: Vec<Expansion>,
    rates: Vec<Expansion>,
    clock: Arc<dyn Clock>,
}

impl ReporterConfig {
    pub fn new(url: impl Into<String>, registry: Arc<MetricRegistry>) -> Self {
        Self {
            url: url.into(),
            registry,
            host: None,
            env: None,
            group: None,
            application: None,
            tags: Vec::new(),
            filter: Box::new(AllMetrics),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            resolvers: Vec::new(),
            rate_unit: TimeUnit::Seconds,
            duration_unit: TimeUnit::Milliseconds,
            stats: STATS.to_vec(),
            rates: RATES.to_vec(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    /// Add a `label:value` tag attached to every observation.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_filter(mut self, filter: impl MetricFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Append a resolver. Resolvers are consulted in the order they were added.
    pub fn with_resolver(mut self, resolver: impl MetricInfoResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    pub fn with_resolvers(mut self, resolvers: Vec<Box<dyn MetricInfoResolver>>) -> Self {
        self.resolvers.extend(resolvers);
        self
    }

    /// Append the `jvm.*` runtime presets.
    pub fn with_runtime_resolvers(self) -> Self {
        self.with_resolvers(presets::runtime())
    }

    /// Append the Hystrix command and thread pool presets.
    pub fn with_circuit_breaker_resolvers(self) -> Self {
        self.with_resolvers(presets::circuit_breaker())
    }

    pub fn with_rate_unit(mut self, unit: TimeUnit) -> Self {
        self.rate_unit = unit;
        self
    }

    pub fn with_duration_unit(mut self, unit: TimeUnit) -> Self {
        self.duration_unit = unit;
        self
    }

    /// Replace the statistics reported for histograms and timers.
    pub fn with_stats(mut self, stats: Vec<Expansion>) -> Self {
        self.stats = stats;
        self
    }

    /// Replace the rates reported for meters and timers.
    pub fn with_rates(mut self, rates: Vec<Expansion>) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Tags appended to every resolved metric, automatic ones first and
    /// without duplicates.
    pub fn global_tags(&self) -> Result<Vec<String>, ConfigError> {
        let auto = [
            ("env", &self.env),
            ("group", &self.group),
            ("application", &self.application),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| format!("{label}:{v}"))
        });

        let mut tags: Vec<String> = Vec::new();
        for tag in auto.chain(self.tags.iter().cloned()) {
            if !is_tag(&tag) {
                return Err(ConfigError::InvalidTag(tag));
            }
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    /// Build a reporter publishing over HTTP.
    pub fn build(self) -> Result<SeriesReporter<BlockingSeriesClient>, ConfigError> {
        self.validate()?;
        let client = BlockingSeriesClient::new(
            ClientConfig::new(self.url.clone())
                .with_connect_timeout(self.connect_timeout)
                .with_socket_timeout(self.socket_timeout),
        )?;
        self.assemble(client)
    }

    /// Build a reporter handing its series to `publisher` instead of the HTTP
    /// client. The URL is still validated.
    pub fn build_with_publisher<P: SeriesPublisher>(
        self,
        publisher: P,
    ) -> Result<SeriesReporter<P>, ConfigError> {
        self.validate()?;
        self.assemble(publisher)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.url).map_err(|source| ConfigError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("Connect"));
        }
        if self.socket_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("Socket"));
        }
        if let Some(&expansion) = self.stats.iter().find(|e| !e.is_stat()) {
            return Err(ConfigError::InvalidExpansion {
                expansion,
                table: "statistic",
            });
        }
        if let Some(&expansion) = self.rates.iter().find(|e| !e.is_rate()) {
            return Err(ConfigError::InvalidExpansion {
                expansion,
                table: "rate",
            });
        }
        Ok(())
    }

    fn assemble<P: SeriesPublisher>(self, publisher: P) -> Result<SeriesReporter<P>, ConfigError> {
        let global_tags = self.global_tags()?;
        let host = self
            .host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        info!(
            url = %self.url,
            host = host.as_deref().unwrap_or("-"),
            tags = ?global_tags,
            resolvers = self.resolvers.len(),
            rate_unit = %self.rate_unit,
            duration_unit = %self.duration_unit,
            "Series reporter configured"
        );

        let flattener = Flattener::new(ResolverChain::new(self.resolvers, global_tags), host)
            .with_rate_unit(self.rate_unit)
            .with_duration_unit(self.duration_unit)
            .with_stats(self.stats)
            .with_rates(self.rates);

        Ok(SeriesReporter::new(
            self.registry,
            self.filter,
            flattener,
            publisher,
            self.clock,
        ))
    }
}

fn is_tag(tag: &str) -> bool {
    matches!(tag.split_once(':'), Some((label, value)) if !label.is_empty() && !value.is_empty())
}
