//! A Prometheus check for monitoring agents.
//!
//! [`CheckCoordinator`] scrapes the endpoints named by instance records and
//! re-emits the decoded samples through an [`Aggregator`] as gauges, rates,
//! monotonic counts and service checks.

pub mod aggregator;
pub mod check;
pub mod config;
pub mod error;
pub mod model;
pub mod scraper;

#[cfg(test)]
mod testing;

pub use aggregator::{Aggregator, LogAggregator};
pub use check::{CheckCoordinator, TagContext, TagFinalizer};
pub use config::{CheckFile, DefaultInstances, InitConfig, ScraperConfig};
pub use error::{CheckError, ScrapeError};
pub use model::{Instance, MetricSpec, MetricType, Sample, SampleValue, ServiceCheckStatus};
pub use scraper::http::HttpScraper;
pub use scraper::{MetricSubmitter, Scraper, ScraperAdapter};
