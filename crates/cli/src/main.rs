//! kusage CLI
//!
//! Prints live memory/CPU usage of every running container in a namespace
//! next to its requests and limits, highlighting containers that use far
//! less than they request.

mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use kusage_lib::{ConnectOptions, KubeCluster, ReportBuilder, ReportLogger};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code for failures before a report could be built
const EXIT_FATAL: u8 = 1;

/// Kubernetes container usage versus requests and limits
#[derive(Parser)]
#[command(name = "kusage")]
#[command(author, about = "Show container usage against resource requests and limits", long_about = None)]
pub struct Cli {
    /// Namespace to report on [default: default]
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Print debug information
    #[arg(long, short)]
    pub debug: bool,

    /// Only show containers with lower usage than requested
    #[arg(long = "show-lowusage")]
    pub show_lowusage: bool,

    /// Percent of requested resources used to alert on [default: 30]
    #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: Option<u8>,

    /// Output format [default: table]
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Path to kubeconfig file (uses the standard lookup if not specified)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Number of pods to fetch metrics for at once
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=64))]
    pub concurrency: u16,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Path to config file (default: ~/.config/kusage/config.json)
    #[arg(long, env = "KUSAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print version
    #[arg(long, short)]
    pub version: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("kusage {}", VERSION);
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.debug);
    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Logs go to stderr so the report on stdout stays machine-readable
fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "kusage=debug,kusage_lib=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    info!(version = VERSION, "kusage running");

    let file_config = config::Config::load(cli.config.as_deref())?;
    let report_config =
        file_config.report_config(cli.namespace, cli.show_lowusage, cli.threshold)?;
    let format = file_config.output_format(cli.format)?;

    let options = ConnectOptions {
        kubeconfig: cli.kubeconfig,
        context: cli.context,
    };
    let cluster = KubeCluster::connect(&options)
        .await
        .context("Could not connect to the cluster")?;

    info!(namespace = %report_config.namespace(), "Getting pod information");
    let pods = cluster.list_pods(report_config.namespace()).await?;

    let logger = ReportLogger::new(report_config.namespace());
    let builder = ReportBuilder::new(report_config, Arc::new(cluster), logger)
        .with_concurrency(usize::from(cli.concurrency));
    let report = builder.build(&pods).await;

    output::print_report(&report, format)?;
    Ok(())
}
