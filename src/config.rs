use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use http::uri::Uri;
use serde::Deserialize;

use crate::error::CheckError;
use crate::model::{Instance, MetricSpec, MetricType};

/// Per-namespace instance settings that real instances are layered on top of.
pub type DefaultInstances = HashMap<String, Instance>;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Resolved settings for one scraped endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    pub prometheus_url: String,
    pub namespace: String,
    /// Exposed metric name to submitted metric name.
    pub metrics_mapper: HashMap<String, String>,
    pub metrics_prefix: String,
    pub custom_tags: Vec<String>,
    pub exclude_labels: HashSet<String>,
    pub labels_mapper: HashMap<String, String>,
    pub type_overrides: HashMap<String, MetricType>,
    pub send_histograms_buckets: bool,
    pub send_monotonic_counter: bool,
    pub health_service_check: bool,
    pub timeout: Duration,
}

impl ScraperConfig {
    /// Builds the configuration for `endpoint`, layering `instance` over the defaults
    /// registered for its namespace.
    pub fn build(
        endpoint: &str,
        instance: &Instance,
        default_instances: &DefaultInstances,
        default_namespace: Option<&str>,
    ) -> Result<Self, CheckError> {
        let namespace = instance
            .namespace
            .as_deref()
            .or(default_namespace)
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| {
                CheckError::Configuration(format!(
                    "no namespace defined for prometheus endpoint {}",
                    endpoint
                ))
            })?;

        let fallback = Instance::default();
        let defaults = default_instances.get(namespace).unwrap_or(&fallback);

        let uri: Uri = endpoint.parse().map_err(|e| {
            CheckError::Configuration(format!("invalid prometheus_url {}: {}", endpoint, e))
        })?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(CheckError::Configuration(format!(
                "prometheus_url must be an absolute url: {}",
                endpoint
            )));
        }

        let mut metrics_mapper = HashMap::new();
        for spec in defaults.metrics.iter().chain(instance.metrics.iter()) {
            match spec {
                MetricSpec::Name(name) => {
                    metrics_mapper.insert(name.clone(), name.clone());
                }
                MetricSpec::Renamed(renames) => {
                    metrics_mapper.extend(renames.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        let mut labels_mapper = defaults.labels_mapper.clone();
        labels_mapper.extend(instance.labels_mapper.clone());

        let mut type_overrides = HashMap::new();
        for (metric, kind) in defaults
            .type_overrides
            .iter()
            .chain(instance.type_overrides.iter())
        {
            type_overrides.insert(metric.clone(), kind.parse::<MetricType>()?);
        }

        let exclude_labels = defaults
            .exclude_labels
            .iter()
            .chain(instance.exclude_labels.iter())
            .cloned()
            .collect();

        let custom_tags = instance
            .tags
            .clone()
            .or_else(|| defaults.tags.clone())
            .unwrap_or_default();

        let metrics_prefix = instance
            .prometheus_metrics_prefix
            .clone()
            .or_else(|| defaults.prometheus_metrics_prefix.clone())
            .unwrap_or_default();

        let timeout_secs = instance
            .prometheus_timeout
            .or(defaults.prometheus_timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            prometheus_url: endpoint.to_owned(),
            namespace: namespace.to_owned(),
            metrics_mapper,
            metrics_prefix,
            custom_tags,
            exclude_labels,
            labels_mapper,
            type_overrides,
            send_histograms_buckets: instance
                .send_histograms_buckets
                .or(defaults.send_histograms_buckets)
                .unwrap_or(true),
            send_monotonic_counter: instance
                .send_monotonic_counter
                .or(defaults.send_monotonic_counter)
                .unwrap_or(false),
            health_service_check: instance
                .health_service_check
                .or(defaults.health_service_check)
                .unwrap_or(true),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    pub default_namespace: Option<String>,
    pub default_instances: DefaultInstances,
}

/// A check configuration file: shared `init_config` plus the monitored instances.
#[derive(Debug, Default, Deserialize)]
pub struct CheckFile {
    #[serde(default)]
    pub init_config: Option<InitConfig>,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl CheckFile {
    pub fn load(path: &Path) -> Result<Self, anyhow::Error> {
        tracing::info!("loading check configuration from {}", path.display());
        let f = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        serde_yaml::from_reader(f).with_context(|| format!("invalid YAML in {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }
}
