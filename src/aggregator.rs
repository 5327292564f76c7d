use crate::model::ServiceCheckStatus;

/// The host monitoring API that checks submit into.
pub trait Aggregator: Send + Sync {
    fn rate(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>);

    fn gauge(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>);

    fn monotonic_count(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>);

    fn service_check(
        &self,
        name: &str,
        status: ServiceCheckStatus,
        tags: &[String],
        hostname: Option<&str>,
        message: Option<&str>,
    );
}

/// Emits every submission as a `tracing` event.
#[derive(Debug, Default)]
pub struct LogAggregator;

impl Aggregator for LogAggregator {
    fn rate(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>) {
        tracing::info!(kind = "rate", metric = name, value, ?tags, ?hostname, "submit");
    }

    fn gauge(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>) {
        tracing::info!(kind = "gauge", metric = name, value, ?tags, ?hostname, "submit");
    }

    fn monotonic_count(&self, name: &str, value: f64, tags: &[String], hostname: Option<&str>) {
        tracing::info!(
            kind = "monotonic_count",
            metric = name,
            value,
            ?tags,
            ?hostname,
            "submit"
        );
    }

    fn service_check(
        &self,
        name: &str,
        status: ServiceCheckStatus,
        tags: &[String],
        hostname: Option<&str>,
        message: Option<&str>,
    ) {
        tracing::info!(
            kind = "service_check",
            check = name,
            %status,
            ?tags,
            ?hostname,
            ?message,
            "submit"
        );
    }
}
