pub mod http;

use async_trait::async_trait;

use crate::config::{DefaultInstances, ScraperConfig};
use crate::error::{CheckError, ScrapeError};
use crate::model::{Instance, Sample, ServiceCheckStatus};

/// Submission callbacks a scraper invokes for each decoded sample.
///
/// `config` is the configuration of the endpoint being scraped; the receiver reads
/// `custom_tags`, `exclude_labels` and `labels_mapper` from it to build tags.
pub trait MetricSubmitter: Sync {
    fn submit_rate(
        &self,
        metric_name: &str,
        value: f64,
        sample: &Sample,
        config: &ScraperConfig,
        hostname: Option<&str>,
    );

    fn submit_gauge(
        &self,
        metric_name: &str,
        value: f64,
        sample: &Sample,
        config: &ScraperConfig,
        hostname: Option<&str>,
    );

    fn submit_monotonic_count(
        &self,
        metric_name: &str,
        value: f64,
        sample: &Sample,
        config: &ScraperConfig,
        hostname: Option<&str>,
    );

    fn submit_service_check(
        &self,
        name: &str,
        status: ServiceCheckStatus,
        tags: &[String],
        hostname: Option<&str>,
        message: Option<&str>,
    );
}

/// Scrape-and-process capability for Prometheus endpoints.
#[async_trait]
pub trait Scraper: Send + Sync {
    fn create_configuration(
        &self,
        endpoint: &str,
        instance: &Instance,
        default_instances: &DefaultInstances,
        default_namespace: Option<&str>,
    ) -> Result<ScraperConfig, CheckError> {
        ScraperConfig::build(endpoint, instance, default_instances, default_namespace)
    }

    /// Scrapes `endpoint` and hands every decoded sample to `submitter`.
    ///
    /// Samples absent from `config.metrics_mapper` are skipped silently when
    /// `ignore_unmapped` is set and reported otherwise.
    async fn process(
        &self,
        endpoint: &str,
        config: &ScraperConfig,
        submitter: &dyn MetricSubmitter,
        ignore_unmapped: bool,
    ) -> Result<(), ScrapeError>;
}

/// One scraper bound to the check that owns it.
///
/// A check polling several endpoints keeps one adapter per endpoint; every sample
/// is submitted through the owning check.
pub struct ScraperAdapter<'c, S> {
    check: &'c dyn MetricSubmitter,
    scraper: S,
}

impl<'c, S: Scraper> ScraperAdapter<'c, S> {
    pub fn new(check: &'c dyn MetricSubmitter, scraper: S) -> Self {
        Self { check, scraper }
    }

    pub fn check(&self) -> &'c dyn MetricSubmitter {
        self.check
    }

    pub fn create_configuration(
        &self,
        endpoint: &str,
        instance: &Instance,
        default_instances: &DefaultInstances,
        default_namespace: Option<&str>,
    ) -> Result<ScraperConfig, CheckError> {
        self.scraper
            .create_configuration(endpoint, instance, default_instances, default_namespace)
    }

    pub async fn process(
        &self,
        endpoint: &str,
        config: &ScraperConfig,
        ignore_unmapped: bool,
    ) -> Result<(), ScrapeError> {
        self.scraper
            .process(endpoint, config, self.check, ignore_unmapped)
            .await
    }
}
