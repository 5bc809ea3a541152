//! Blocking HTTP publisher.
//!
//! Uses `reqwest::blocking`, so a client must not be created or dropped from
//! inside an async runtime. Each [`Series`] is sent as a single JSON POST; a
//! failed send is reported to the caller and never retried here.

use error_stack::Report;
use error_stack::ResultExt;
use reqwest::blocking::Client as BlockingClient;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use series_types::Series;
use tracing::debug;
use tracing::info;
use url::Url;

use crate::error::CommError;
use crate::error::CommResult;
use crate::ClientConfig;

const MAX_REDIRECTS: usize = 10;

/// Something that can ship a series to the collector.
pub trait SeriesPublisher: Send + Sync {
    fn publish(&self, series: &Series) -> CommResult<()>;
}

impl<P: SeriesPublisher + ?Sized> SeriesPublisher for Box<P> {
    fn publish(&self, series: &Series) -> CommResult<()> {
        (**self).publish(series)
    }
}

impl<P: SeriesPublisher + ?Sized> SeriesPublisher for std::sync::Arc<P> {
    fn publish(&self, series: &Series) -> CommResult<()> {
        (**self).publish(series)
    }
}

/// blocking series client
#[derive(Debug)]
pub struct BlockingSeriesClient {
    config: ClientConfig,
    endpoint: Url,
    http: BlockingClient,
}

impl BlockingSeriesClient {
    /// create client, failing on a malformed url or an unusable HTTP stack
    pub fn new(config: ClientConfig) -> CommResult<Self> {
        let endpoint = Url::parse(&config.url).change_context(CommError::Configuration {
            message: format!("Invalid collector URL `{}`", config.url),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Report::new(CommError::Configuration {
                message: format!("Unsupported URL scheme `{}`", endpoint.scheme()),
            }));
        }

        let http = BlockingClient::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.socket_timeout)
            .pool_max_idle_per_host(config.max_connections)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .change_context(CommError::Configuration {
                message: "Failed to create blocking HTTP client".into(),
            })?;

        info!(url = %endpoint, "Series client created");

        Ok(Self {
            config,
            endpoint,
            http,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl SeriesPublisher for BlockingSeriesClient {
    fn publish(&self, series: &Series) -> CommResult<()> {
        let body = serde_json::to_vec(series).change_context(CommError::Serialization {
            message: "Failed to serialize series".into(),
        })?;

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| {
                let context = if e.is_timeout() {
                    CommError::Timeout {
                        millis: self.config.socket_timeout.as_millis() as u64,
                    }
                } else {
                    CommError::Network {
                        message: format!("Failed to send series to {}", self.endpoint),
                    }
                };
                Report::new(e).change_context(context)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Report::new(CommError::Http {
                status: status.as_u16(),
                message,
            }));
        }

        debug!(url = %self.endpoint, points = series.len(), %status, "Series published");
        Ok(())
    }
}
