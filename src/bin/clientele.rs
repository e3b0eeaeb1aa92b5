use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clientele_rs::config::{AppConfig, ConfigOverrides, OutputOverrides};
use clientele_rs::Reconciler;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Reconcile a JSON snapshot of customer collections into one aggregate per customer.
#[derive(Debug, Parser)]
#[command(name = "clientele", version)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long, env = "CLIENTELE_CONFIG")]
    config: Option<String>,

    /// Snapshot JSON file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    snapshot: PathBuf,

    /// Keep identities seen only through telemetry with no phone or email
    #[arg(long)]
    include_anonymous: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Emit the full report including run statistics
    #[arg(long)]
    report: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            include_anonymous: self.include_anonymous.then_some(true),
            log_filter: None,
            output: self.pretty.then_some(OutputOverrides { pretty: Some(true) }),
        }
    }
}

fn init_tracing(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn read_snapshot(path: &PathBuf) -> anyhow::Result<serde_json::Value> {
    let raw = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read snapshot from stdin")?;
        buffer
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?
    };
    serde_json::from_str(&raw).context("snapshot is not valid JSON")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), cli.overrides())?;
    init_tracing(&config.log_filter);

    let document = read_snapshot(&cli.snapshot)?;
    let report = Reconciler::new(config.reconcile_options())
        .run_value(document)
        .context("snapshot has an invalid shape")?;
    info!(
        customers = report.customers.len(),
        anonymous_dropped = report.stats.anonymous_dropped,
        "reconciliation finished"
    );

    let rendered = match (cli.report, config.output.pretty) {
        (true, true) => serde_json::to_string_pretty(&report)?,
        (true, false) => serde_json::to_string(&report)?,
        (false, true) => serde_json::to_string_pretty(&report.customers)?,
        (false, false) => serde_json::to_string(&report.customers)?,
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}
