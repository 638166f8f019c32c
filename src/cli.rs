use std::path::PathBuf;

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{debug, LevelFilter};

use crate::config::NotiflyConfig;
use crate::logging::{parse_log_level, LogConfig, LogDestination, LogFormat};

/// In-process typed notification center
#[derive(Parser, Debug)]
#[command(name = "notifly")]
#[command(about = "Exercise and measure the notifly notification engine")]
#[command(version)]
pub struct Args {
    /// Verbose output (debug level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Log file path for file output
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Worker threads for async dispatch (overrides the configuration)
    #[arg(short = 't', long, value_name = "N", global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register observers on many topics and post to all of them
    Stress(StressArgs),
    /// Measure post_and_wait round trips against a built-in responder
    Ping(PingArgs),
    /// Print library and API version information
    Version,
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct StressArgs {
    /// Number of topics
    #[arg(long, default_value_t = 8)]
    pub topics: usize,

    /// Observers per topic
    #[arg(long, default_value_t = 4)]
    pub observers: usize,

    /// Posts per topic
    #[arg(long, default_value_t = 1000)]
    pub posts: usize,

    /// Dispatch on the worker pool instead of the posting thread
    #[arg(long = "async")]
    pub async_dispatch: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct PingArgs {
    /// Number of round trips
    #[arg(short = 'c', long, default_value_t = 10)]
    pub count: usize,

    /// Per-request timeout in milliseconds (defaults to the configured value)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Responder delay in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub delay_ms: u64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

/// Resolve logging from configuration, then command line overrides
pub fn resolve_log_config(args: &Args, config: &NotiflyConfig) -> Result<LogConfig> {
    let mut log_config = config.log_config()?;

    // later flags win: quiet < verbose < debug
    if args.quiet {
        log_config.console_level = LevelFilter::Error;
    }
    if args.verbose {
        log_config.console_level = LevelFilter::Debug;
    }
    if args.debug {
        log_config.console_level = LevelFilter::Trace;
    }

    if let Some(format) = args.log_format {
        log_config.format = format;
    }

    if let Some(path) = &args.log_file {
        log_config.destination = LogDestination::Both(path.clone());
        if log_config.file_level.is_none() {
            log_config.file_level = Some(log_config.console_level);
        }
    }

    if let Some(level) = &args.log_file_level {
        log_config.file_level = Some(parse_log_level(level)?);
    }

    debug!("Resolved log configuration: {:?}", log_config);
    Ok(log_config)
}
