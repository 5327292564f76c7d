use std::collections::HashMap;
use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::config::{DefaultInstances, ScraperConfig};
use crate::error::CheckError;
use crate::model::{Instance, Sample, ServiceCheckStatus};
use crate::scraper::{MetricSubmitter, Scraper};

/// What a tag finalizer gets to see besides the tags themselves.
#[derive(Debug, Clone, Copy)]
pub struct TagContext<'a> {
    pub metric_name: &'a str,
    pub value: f64,
    pub sample: &'a Sample,
    pub custom_tags: &'a [String],
    pub hostname: Option<&'a str>,
}

/// Post-processes the computed tags of every metric submission.
pub type TagFinalizer = Box<dyn Fn(Vec<String>, &TagContext<'_>) -> Vec<String> + Send + Sync>;

/// A Prometheus check configured entirely from instance records.
///
/// Keeps one scraper configuration per endpoint URL for its whole lifetime, so each
/// monitored instance is configured once and scraped on every `check`.
pub struct CheckCoordinator<S: Scraper, A: Aggregator> {
    name: String,
    scraper: S,
    aggregator: A,
    config_map: HashMap<String, Arc<ScraperConfig>>,
    default_instances: DefaultInstances,
    default_namespace: Option<String>,
    finalize_tags: TagFinalizer,
}

impl<S: Scraper, A: Aggregator> CheckCoordinator<S, A> {
    pub fn new(
        name: impl Into<String>,
        scraper: S,
        aggregator: A,
        default_instances: DefaultInstances,
        default_namespace: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            scraper,
            aggregator,
            config_map: Default::default(),
            default_instances,
            default_namespace,
            finalize_tags: Box::new(|tags, _| tags),
        }
    }

    /// Builds the configuration of every instance up front.
    ///
    /// Failures are only logged here; `check` reports them again for the instance.
    pub fn with_instances(mut self, instances: &[Instance]) -> Self {
        for instance in instances {
            match instance.prometheus_url.as_deref() {
                Some(endpoint) => {
                    if let Err(e) = self.get_scraper_config(endpoint, instance) {
                        tracing::warn!("{}: unable to configure {}: {}", self.name, endpoint, e);
                    }
                }
                None => tracing::warn!("{}: instance without prometheus_url", self.name),
            }
        }
        self
    }

    pub fn with_tag_finalizer<F>(mut self, finalizer: F) -> Self
    where
        F: Fn(Vec<String>, &TagContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        self.finalize_tags = Box::new(finalizer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scraper(&self) -> &S {
        &self.scraper
    }

    pub fn aggregator(&self) -> &A {
        &self.aggregator
    }

    pub async fn check(&mut self, instance: &Instance) -> Result<(), CheckError> {
        let endpoint = instance.prometheus_url.as_deref().ok_or_else(|| {
            CheckError::Configuration("unable to find prometheus_url in instance".into())
        })?;

        let config = self.get_scraper_config(endpoint, instance)?;
        if config.metrics_mapper.is_empty() {
            return Err(CheckError::Configuration(format!(
                "you have to collect at least one metric from the endpoint: {}",
                endpoint
            )));
        }

        tracing::info!("{}: scraping {}", self.name, endpoint);
        let this: &Self = self;
        this.scraper.process(endpoint, &config, this, true).await?;

        Ok(())
    }

    /// Returns the configuration cached for `endpoint`, building it from `instance`
    /// the first time the endpoint is seen.
    pub fn get_scraper_config(
        &mut self,
        endpoint: &str,
        instance: &Instance,
    ) -> Result<Arc<ScraperConfig>, CheckError> {
        if let Some(config) = self.config_map.get(endpoint) {
            return Ok(config.clone());
        }

        let config = Arc::new(self.scraper.create_configuration(
            endpoint,
            instance,
            &self.default_instances,
            self.default_namespace.as_deref(),
        )?);
        tracing::debug!("{}: configured endpoint {}", self.name, endpoint);
        self.config_map.insert(endpoint.to_owned(), config.clone());

        Ok(config)
    }

    pub fn metric_tags(
        &self,
        metric_name: &str,
        value: f64,
        sample: &Sample,
        config: &ScraperConfig,
        hostname: Option<&str>,
    ) -> Vec<String> {
        let mut tags = config.custom_tags.clone();
        for (label, label_value) in &sample.labels {
            if config.exclude_labels.contains(label) {
                continue;
            }
            let tag_name = config.labels_mapper.get(label).unwrap_or(label);
            tags.push(format!("{}:{}", tag_name, label_value));
        }

        let context = TagContext {
            metric_name,
            value,
            sample,
            custom_tags: &config.custom_tags,
            hostname,
        };
        (self.finalize_tags)(tags, &context)
    }
}

fn namespaced(config: &ScraperConfig, metric_name: &str) -> String {
    format!("{}.{}", config.namespace, metric_name)
}

impl<S: Scraper, A: Aggregator> MetricSubmitter for CheckCoordinator<S, A> {
    fn submit_rate(
        &self,
        metric_name: &str,
        value: f64,
        sample: &Sample,
        config: &ScraperConfig,
        hostname: Option<&str>,
    ) {
        let tags = self.metric_tags(metric_name, value, sample, config, hostname);
        self.aggregator
            .rate(&namespaced(config, metric_name), value, &tags, hostname);
    }

    fn submit_gauge(
        &self,
        metric_name: &str,
        value: f64,
        sample: &Sample,
        config: &ScraperConfig,
        hostname: Option<&str>,
    ) {
        let tags = self.metric_tags(metric_name, value, sample, config, hostname);
        self.aggregator
            .gauge(&namespaced(config, metric_name), value, &tags, hostname);
    }

    fn submit_monotonic_count(
        &self,
        metric_name: &str,
        value: f64,
        sample: &Sample,
        config: &ScraperConfig,
        hostname: Option<&str>,
    ) {
        let tags = self.metric_tags(metric_name, value, sample, config, hostname);
        self.aggregator
            .monotonic_count(&namespaced(config, metric_name), value, &tags, hostname);
    }

    fn submit_service_check(
        &self,
        name: &str,
        status: ServiceCheckStatus,
        tags: &[String],
        hostname: Option<&str>,
        message: Option<&str>,
    ) {
        self.aggregator
            .service_check(name, status, tags, hostname, message);
    }
}
