use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error};

use notifly::cli::{self, Args, Command};
use notifly::commands::{run_ping, run_stress, PingReport, StressReport};
use notifly::config::NotiflyConfig;
use notifly::logging;
use notifly::version;
use notifly::NotificationCenter;

fn main() {
    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_configuration(args: &Args) -> Result<NotiflyConfig> {
    let mut config = match &args.config_file {
        Some(path) => NotiflyConfig::load_from_file(path)?,
        None => NotiflyConfig::load()?,
    };

    if let Some(threads) = args.threads {
        if threads == 0 {
            anyhow::bail!("--threads must be at least 1");
        }
        config.engine.worker_threads = threads;
    }
    Ok(config)
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    let config = load_configuration(&args)?;
    let log_config = cli::resolve_log_config(&args, &config)?;
    logging::init_logger(log_config)?;
    debug!("Configuration: {:?}", config);

    match &args.command {
        Command::Version => {
            let info = serde_json::to_string_pretty(&version::version_info())?;
            println!("{}", info);
        }
        Command::Stress(stress) => {
            let center = NotificationCenter::with_config(config.center_config());
            let report = run_stress(&center, stress.topics, stress.observers, stress.posts, stress.async_dispatch)?;
            print_stress(&report, stress.json)?;
            if report.delivered_calls != report.expected_calls {
                anyhow::bail!(
                    "Delivered {} of {} expected calls",
                    report.delivered_calls,
                    report.expected_calls
                );
            }
        }
        Command::Ping(ping) => {
            let center = Arc::new(NotificationCenter::with_config(config.center_config()));
            let timeout = ping
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.request_timeout());
            let report = run_ping(&center, ping.count, timeout, Duration::from_millis(ping.delay_ms))?;
            print_ping(&report, ping.json)?;
        }
    }

    Ok(())
}

fn print_stress(report: &StressReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).context("Failed to serialize report")?);
        return Ok(());
    }

    println!(
        "{} topics x {} observers x {} posts ({})",
        report.topics,
        report.observers_per_topic,
        report.posts_per_topic,
        if report.async_dispatch { "async" } else { "sync" }
    );
    println!("delivered: {}/{}", report.delivered_calls, report.expected_calls);
    println!("elapsed:   {:.2} ms", report.elapsed_ms);
    println!("rate:      {:.0} calls/s", report.calls_per_second);
    println!(
        "pool:      {} workers, {} executed, {} panicked",
        report.pool.workers, report.pool.executed, report.pool.panicked
    );
    Ok(())
}

fn print_ping(report: &PingReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).context("Failed to serialize report")?);
        return Ok(());
    }

    println!(
        "{} sent, {} received, {} timed out",
        report.sent, report.received, report.timeouts
    );
    if let (Some(min), Some(avg), Some(max)) = (report.min_ms, report.avg_ms, report.max_ms) {
        println!("round trip min/avg/max = {:.3}/{:.3}/{:.3} ms", min, avg, max);
    }
    Ok(())
}
