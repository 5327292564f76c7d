use async_trait::async_trait;
use prometheus_parse::Scrape;
use reqwest::header::ACCEPT;

use super::{MetricSubmitter, Scraper};
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::model::{MetricType, Sample, SampleValue, ServiceCheckStatus};

const HEALTH_CHECK_SUFFIX: &str = "prometheus.health";
const AGGREGATE_SUFFIXES: &[(&str, &str)] = &[("_sum", "sum"), ("_count", "count")];

/// Scrapes endpoints over HTTP and decodes the text exposition format.
#[derive(Debug, Clone)]
pub struct HttpScraper {
    client: reqwest::Client,
}

impl HttpScraper {
    pub fn new() -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, endpoint: &str, config: &ScraperConfig) -> Result<String, ScrapeError> {
        let body = self
            .client
            .get(endpoint)
            .header(ACCEPT, "text/plain")
            .timeout(config.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(body)
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn process(
        &self,
        endpoint: &str,
        config: &ScraperConfig,
        submitter: &dyn MetricSubmitter,
        ignore_unmapped: bool,
    ) -> Result<(), ScrapeError> {
        let body = match self.fetch(endpoint, config).await {
            Ok(body) => body,
            Err(e) => {
                if config.health_service_check {
                    let message = e.to_string();
                    submit_health(submitter, config, ServiceCheckStatus::Critical, Some(&message));
                }
                return Err(e);
            }
        };

        if config.health_service_check {
            submit_health(submitter, config, ServiceCheckStatus::Ok, None);
        }

        let samples = parse_samples(&body)?;
        tracing::debug!("decoded {} samples from {}", samples.len(), endpoint);

        submit_samples(samples, config, submitter, ignore_unmapped);

        Ok(())
    }
}

fn submit_health(
    submitter: &dyn MetricSubmitter,
    config: &ScraperConfig,
    status: ServiceCheckStatus,
    message: Option<&str>,
) {
    let mut tags = vec![format!("endpoint:{}", config.prometheus_url)];
    tags.extend(config.custom_tags.iter().cloned());

    submitter.submit_service_check(
        &format!("{}.{}", config.namespace, HEALTH_CHECK_SUFFIX),
        status,
        &tags,
        None,
        message,
    );
}

/// Decodes a text exposition payload.
pub fn parse_samples(body: &str) -> Result<Vec<Sample>, ScrapeError> {
    let scrape = Scrape::parse(body.lines().map(|line| Ok(line.to_owned())))
        .map_err(ScrapeError::Parse)?;

    Ok(scrape.samples.into_iter().map(Sample::from).collect())
}

/// Dispatches decoded samples to `submitter` according to `config`.
pub fn submit_samples(
    samples: impl IntoIterator<Item = Sample>,
    config: &ScraperConfig,
    submitter: &dyn MetricSubmitter,
    ignore_unmapped: bool,
) {
    for sample in samples {
        let name = sample
            .name
            .strip_prefix(config.metrics_prefix.as_str())
            .unwrap_or(&sample.name);

        let mapped = match config.metrics_mapper.get(name) {
            Some(mapped) => mapped,
            None => {
                if submit_aggregate(name, &sample, config, submitter) {
                    continue;
                }
                if ignore_unmapped {
                    tracing::debug!("skipping unmapped metric {}", name);
                } else {
                    tracing::warn!(
                        "unable to handle metric {} from {}: not in metrics mapping",
                        name,
                        config.prometheus_url
                    );
                }
                continue;
            }
        };

        match &sample.value {
            SampleValue::Counter(v) | SampleValue::Gauge(v) | SampleValue::Untyped(v) => {
                let metric_type = config
                    .type_overrides
                    .get(name)
                    .copied()
                    .unwrap_or_else(|| sample.value.metric_type());

                if metric_type == MetricType::Counter && config.send_monotonic_counter {
                    submitter.submit_monotonic_count(mapped, *v, &sample, config, None);
                } else {
                    submitter.submit_gauge(mapped, *v, &sample, config, None);
                }
            }
            SampleValue::Histogram(buckets) => {
                if config.send_histograms_buckets {
                    let bucket_name = format!("{}.count", mapped);
                    for bucket in buckets {
                        let labeled = sample
                            .clone()
                            .with_label("upper_bound", bucket.upper_bound.to_string());
                        submitter.submit_gauge(&bucket_name, bucket.count, &labeled, config, None);
                    }
                }
            }
            SampleValue::Summary(quantiles) => {
                let quantile_name = format!("{}.quantile", mapped);
                for quantile in quantiles {
                    let labeled = sample
                        .clone()
                        .with_label("quantile", quantile.quantile.to_string());
                    submitter.submit_gauge(&quantile_name, quantile.value, &labeled, config, None);
                }
            }
        }
    }
}

/// Submits the `_sum` / `_count` series of a mapped histogram or summary as
/// `<mapped>.sum` / `<mapped>.count` gauges. Returns false when `name` is not one.
fn submit_aggregate(
    name: &str,
    sample: &Sample,
    config: &ScraperConfig,
    submitter: &dyn MetricSubmitter,
) -> bool {
    let value = match &sample.value {
        SampleValue::Counter(v) | SampleValue::Gauge(v) | SampleValue::Untyped(v) => *v,
        _ => return false,
    };

    for &(suffix, submitted) in AGGREGATE_SUFFIXES {
        let mapped = name
            .strip_suffix(suffix)
            .and_then(|base| config.metrics_mapper.get(base));
        if let Some(mapped) = mapped {
            let metric_name = format!("{}.{}", mapped, submitted);
            submitter.submit_gauge(&metric_name, value, sample, config, None);
            return true;
        }
    }

    false
}
