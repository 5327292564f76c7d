use std::path::PathBuf;

use structopt::StructOpt;

use promcheck::{
    Aggregator, CheckCoordinator, CheckFile, HttpScraper, Instance, LogAggregator, Scraper,
};

#[derive(StructOpt, Debug)]
#[structopt(name = "promcheck")]
pub struct Command {
    /// Check configuration (YAML with `init_config` and `instances`).
    #[structopt(short, long, parse(from_os_str))]
    pub config: PathBuf,

    /// Seconds between two runs over all instances.
    #[structopt(short, long, default_value = "15")]
    pub interval: u64,

    /// Namespace for instances that don't set one.
    #[structopt(short, long)]
    pub namespace: Option<String>,

    /// Check every instance once, then exit.
    #[structopt(long)]
    pub once: bool,

    #[structopt(long, default_value = "info")]
    pub log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // parse the command line args
    let opt: Command = Command::from_args();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(opt.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if opt.interval == 0 {
        anyhow::bail!("--interval must be at least one second");
    }

    let check_file = CheckFile::load(&opt.config)?;
    let init_config = check_file.init_config.unwrap_or_default();
    let instances = check_file.instances;
    let default_namespace = opt.namespace.or(init_config.default_namespace);

    let mut coordinator = CheckCoordinator::new(
        "prometheus",
        HttpScraper::new()?,
        LogAggregator,
        init_config.default_instances,
        default_namespace,
    )
    .with_instances(&instances);

    tracing::info!("{}: loaded {} instances", coordinator.name(), instances.len());

    if opt.once {
        run_all(&mut coordinator, &instances).await;
        return Ok(());
    }

    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(opt.interval));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_all(&mut coordinator, &instances).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn run_all<S: Scraper, A: Aggregator>(
    coordinator: &mut CheckCoordinator<S, A>,
    instances: &[Instance],
) {
    for instance in instances {
        if let Err(e) = coordinator.check(instance).await {
            tracing::error!(
                "{}: check failed for {}: {}",
                coordinator.name(),
                instance.prometheus_url.as_deref().unwrap_or("<no prometheus_url>"),
                e
            );
        }
    }
}
