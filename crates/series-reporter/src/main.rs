mod cli;
mod logging;

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use metric_registry::GaugeValue;
use metric_registry::MetricRegistry;
use series_reporter::ReporterConfig;
use series_reporter::ReportingTask;
use tracing::info;

use crate::cli::Cli;

const HEARTBEAT: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting series reporter");

    let registry = Arc::new(MetricRegistry::new());
    let started = Instant::now();
    registry
        .register_gauge("process.uptime", move || {
            GaugeValue::from(started.elapsed().as_secs())
        })
        .context("register uptime gauge")?;
    registry
        .register_gauge("process.running", || GaugeValue::from(true))
        .context("register running gauge")?;
    let heartbeats = registry
        .register_counter("process.heartbeats")
        .context("register heartbeat counter")?;
    let ticks = registry
        .register_meter("process.ticks")
        .context("register tick meter")?;
    let work = registry
        .register_timer("process.heartbeat.work")
        .context("register work timer")?;
    let drift = registry
        .register_histogram("process.heartbeat.drift")
        .context("register drift histogram")?;

    let mut config = ReporterConfig::new(cli.url.clone(), registry)
        .with_tags(cli.tags.clone())
        .with_rate_unit(cli.rate_unit)
        .with_duration_unit(cli.duration_unit);
    if let Some(host) = cli.host {
        config = config.with_host(host);
    }
    if let Some(env) = cli.env {
        config = config.with_env(env);
    }
    if let Some(group) = cli.group {
        config = config.with_group(group);
    }
    if let Some(application) = cli.application {
        config = config.with_application(application);
    }
    if cli.runtime_resolvers {
        config = config.with_runtime_resolvers();
    }

    let reporter = config.build().context("build series reporter")?;
    let task = ReportingTask::start(reporter, Duration::from_secs(cli.period_secs))
        .context("start reporting task")?;

    let deadline = cli
        .run_for_secs
        .map(|secs| started + Duration::from_secs(secs));
    let mut expected = Instant::now() + HEARTBEAT;
    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        std::thread::sleep(expected.saturating_duration_since(Instant::now()));

        let late = Instant::now().saturating_duration_since(expected);
        drift.update(late.as_secs_f64() * 1000.0);
        work.time(|| heartbeats.inc(1));
        ticks.mark(1);
        expected += HEARTBEAT;
    }

    task.stop();
    info!("Series reporter stopped");
    Ok(())
}
