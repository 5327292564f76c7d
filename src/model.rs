use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::CheckError;

/// One monitored instance, as listed under `instances:` in a check configuration.
///
/// Every field is optional so the same type can describe both a real instance and
/// the per-namespace defaults it is layered on top of.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub prometheus_url: Option<String>,
    pub namespace: Option<String>,
    pub metrics: Vec<MetricSpec>,
    pub prometheus_metrics_prefix: Option<String>,
    pub labels_mapper: HashMap<String, String>,
    pub exclude_labels: Vec<String>,
    pub type_overrides: HashMap<String, String>,
    pub tags: Option<Vec<String>>,
    pub send_histograms_buckets: Option<bool>,
    pub send_monotonic_counter: Option<bool>,
    pub health_service_check: Option<bool>,
    /// Scrape timeout in seconds.
    pub prometheus_timeout: Option<u64>,
}

/// An entry of the `metrics` list: either a bare name, submitted as is, or a map
/// from exposed name to submitted name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MetricSpec {
    Name(String),
    Renamed(HashMap<String, String>),
}

impl From<&str> for MetricSpec {
    fn from(name: &str) -> Self {
        MetricSpec::Name(name.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    Untyped,
}

impl FromStr for MetricType {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricType::Counter),
            "gauge" => Ok(MetricType::Gauge),
            "histogram" => Ok(MetricType::Histogram),
            "summary" => Ok(MetricType::Summary),
            "untyped" => Ok(MetricType::Untyped),
            other => Err(CheckError::Configuration(format!(
                "unknown metric type override: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Counter(f64),
    Gauge(f64),
    Untyped(f64),
    Histogram(Vec<Bucket>),
    Summary(Vec<Quantile>),
}

impl SampleValue {
    pub fn metric_type(&self) -> MetricType {
        match self {
            SampleValue::Counter(_) => MetricType::Counter,
            SampleValue::Gauge(_) => MetricType::Gauge,
            SampleValue::Untyped(_) => MetricType::Untyped,
            SampleValue::Histogram(_) => MetricType::Histogram,
            SampleValue::Summary(_) => MetricType::Summary,
        }
    }
}

/// A decoded observation from an exposition payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub value: SampleValue,
    pub labels: BTreeMap<String, String>,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: SampleValue) -> Self {
        Self {
            name: name.into(),
            value,
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }
}

impl From<prometheus_parse::Sample> for Sample {
    fn from(sample: prometheus_parse::Sample) -> Self {
        let value = match sample.value {
            prometheus_parse::Value::Counter(v) => SampleValue::Counter(v),
            prometheus_parse::Value::Gauge(v) => SampleValue::Gauge(v),
            prometheus_parse::Value::Untyped(v) => SampleValue::Untyped(v),
            prometheus_parse::Value::Histogram(counts) => SampleValue::Histogram(
                counts
                    .into_iter()
                    .map(|c| Bucket {
                        upper_bound: c.less_than,
                        count: c.count,
                    })
                    .collect(),
            ),
            prometheus_parse::Value::Summary(counts) => SampleValue::Summary(
                counts
                    .into_iter()
                    .map(|c| Quantile {
                        quantile: c.quantile,
                        value: c.count,
                    })
                    .collect(),
            ),
        };

        let labels = sample
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            name: sample.metric,
            value,
            labels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCheckStatus {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    Unknown = 3,
}

impl fmt::Display for ServiceCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceCheckStatus::Ok => "OK",
            ServiceCheckStatus::Warning => "WARNING",
            ServiceCheckStatus::Critical => "CRITICAL",
            ServiceCheckStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn instance_accepts_plain_and_renamed_metrics() {
        let instance: Instance = serde_yaml::from_str(
            r#"
prometheus_url: http://localhost:9100/metrics
namespace: node
metrics:
  - up
  - process_cpu_seconds_total: cpu.seconds
some_unrelated_key: true
"#,
        )
        .unwrap();

        assert_eq!(
            instance.prometheus_url.as_deref(),
            Some("http://localhost:9100/metrics")
        );
        assert_eq!(instance.metrics[0], MetricSpec::from("up"));
        match &instance.metrics[1] {
            MetricSpec::Renamed(map) => assert_eq!(
                map.get("process_cpu_seconds_total").map(String::as_str),
                Some("cpu.seconds")
            ),
            other => panic!("unexpected metric spec {:?}", other),
        }
        assert!(instance.tags.is_none());
    }

    #[test]
    fn metric_type_rejects_unknown_names() {
        assert_eq!("counter".parse::<MetricType>().unwrap(), MetricType::Counter);
        assert!(matches!(
            "rate".parse::<MetricType>(),
            Err(CheckError::Configuration(_))
        ));
    }
}
