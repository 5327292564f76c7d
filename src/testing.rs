use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::aggregator::Aggregator;
use crate::config::{DefaultInstances, ScraperConfig};
use crate::error::{CheckError, ScrapeError};
use crate::model::{Instance, Sample, ServiceCheckStatus};
use crate::scraper::http::submit_samples;
use crate::scraper::{MetricSubmitter, Scraper};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind {
    Rate,
    Gauge,
    MonotonicCount,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    pub kind: Kind,
    pub name: String,
    pub value: f64,
    pub tags: Vec<String>,
    pub hostname: Option<String>,
}

impl Emission {
    fn new(kind: Kind, name: &str, value: f64, tags: &[&str]) -> Self {
        Self {
            kind,
            name: name.to_owned(),
            value,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            hostname: None,
        }
    }

    pub fn rate(name: &str, value: f64, tags: &[&str]) -> Self {
        Self::new(Kind::Rate, name, value, tags)
    }

    pub fn gauge(name: &str, value: f64, tags: &[&str]) -> Self {
        Self::new(Kind::Gauge, name, value, tags)
    }

    pub fn monotonic_count(name: &str, value: f64, tags: &[&str]) -> Self {
        Self::new(Kind::MonotonicCount, name, value, tags)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCheckEmission {
    pub name: String,
    pub status: ServiceCheckStatus,
    pub tags: Vec<String>,
    pub hostname: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default)]
pub struct RecordingAggregator {
    metrics: Mutex<Vec<Emission>>,
    service_checks: Mutex<Vec<ServiceCheckEmission>>,
}

impl RecordingAggregator {
    pub fn metrics(&self) -> Vec<Emission> {
        self.metrics.lock().unwrap().clone()
    }

    pub fn service_checks(&self) -> Vec<ServiceCheckEmission> {
        self.service_checks.lock().unwrap().clone()
    }

    fn record(&self, kind: Kind, name: &str, value: f64, tags: &[String], hostname: Option<&str>) {
        self.metrics.lock().unwrap().push(Emission {
            kind,
            name: name.to_owned(),
            value,
            tags: tags.to_vec(),
            hostname: hostname.map(str::to_owned),
        });
    }
}

impl Aggregator for RecordingAggregator {
    fn rate(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>) {
        self.record(Kind::Rate, name, value, tags, hostname);
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>) {
        self.record(Kind::Gauge, name, value, tags, hostname);
    }

    fn monotonic_count(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>) {
        self.record(Kind::MonotonicCount, name, value, tags, hostname);
    }

    fn service_check(
        &self,
        name: &str,
        status: ServiceCheckStatus,
        tags: &[String],
        hostname: Option<&str>,
        message: Option<&str>,
    ) {
        self.service_checks.lock().unwrap().push(ServiceCheckEmission {
            name: name.to_owned(),
            status,
            tags: tags.to_vec(),
            hostname: hostname.map(str::to_owned),
            message: message.map(str::to_owned),
        });
    }
}

/// Serves a fixed set of samples and counts how often it is asked to build
/// configurations or scrape.
#[derive(Debug, Default)]
pub struct FakeScraper {
    samples: Vec<Sample>,
    failure: Option<String>,
    configs_built: AtomicUsize,
    processed: AtomicUsize,
}

impl FakeScraper {
    pub fn with_samples(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_owned()),
            ..Default::default()
        }
    }

    pub fn configs_built(&self) -> usize {
        self.configs_built.load(Ordering::SeqCst)
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for FakeScraper {
    fn create_configuration(
        &self,
        endpoint: &str,
        instance: &Instance,
        default_instances: &DefaultInstances,
        default_namespace: Option<&str>,
    ) -> Result<ScraperConfig, CheckError> {
        self.configs_built.fetch_add(1, Ordering::SeqCst);
        ScraperConfig::build(endpoint, instance, default_instances, default_namespace)
    }

    async fn process(
        &self,
        _endpoint: &str,
        config: &ScraperConfig,
        submitter: &dyn MetricSubmitter,
        ignore_unmapped: bool,
    ) -> Result<(), ScrapeError> {
        self.processed.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            return Err(ScrapeError::Parse(io::Error::new(
                io::ErrorKind::InvalidData,
                message.clone(),
            )));
        }
        submit_samples(self.samples.clone(), config, submitter, ignore_unmapped);
        Ok(())
    }
}
