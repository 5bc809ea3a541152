//! HTTP publishing of metric series.
//!
//! The collector receives one JSON document per reporting cycle, see
//! [`series_types::Series`] for the payload shape.
//!
//! # Examples
//!
//! ```no_run
//! # use series_client::{BlockingSeriesClient, ClientConfig, SeriesPublisher};
//! # use series_types::{Observation, Series};
//! # use std::time::Duration;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("http://localhost:8080/api/v1/series")
//!     .with_connect_timeout(Duration::from_secs(1));
//! let client = BlockingSeriesClient::new(config).map_err(|e| e.current_context().clone())?;
//!
//! let mut series = Series::new();
//! series.push(Observation::counter("requests", 42, 1_700_000_000, None, vec![]));
//! client.publish(&series).map_err(|e| e.current_context().clone())?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::BlockingSeriesClient;
pub use client::SeriesPublisher;
pub use config::ClientConfig;
pub use config::DEFAULT_CONNECT_TIMEOUT;
pub use config::DEFAULT_SOCKET_TIMEOUT;
pub use error::CommError;
pub use error::CommResult;
