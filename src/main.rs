use clap::{Args, Parser, Subcommand};
use dreamhost_dns::dns::{DnsRecordValue, DreamhostClient};
use tracing::{error, info};

use crate::settings::Settings;

mod settings;

/// Create and delete DNS records with the DreamHost API.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Extra config file, loaded after the default locations.
    #[arg(long, global = true)]
    config: Option<String>,
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a record.
    Create(RecordArgs),
    /// Remove a record.
    Delete(RecordArgs),
}

#[derive(Debug, Args)]
struct RecordArgs {
    /// Fully-qualified record name.
    #[arg(long)]
    name: String,
    #[arg(long = "type", default_value = "TXT")]
    record_type: String,
    #[arg(long)]
    value: String,
    /// Makes retries of the same request idempotent.
    #[arg(long)]
    unique_id: Option<String>,
}

impl RecordArgs {
    fn record(&self) -> DnsRecordValue {
        DnsRecordValue::new(&self.name, &self.record_type, &self.value)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.json_logs {
        let subscriber = tracing_subscriber::fmt().json().finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::FmtSubscriber::new();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let cfg = Settings::new(cli.config.as_deref())?;

    run(cfg, cli.command).await
}

async fn run(cfg: Settings, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let http = match cfg.timeout()? {
        Some(timeout) => Some(reqwest::Client::builder().timeout(timeout).build()?),
        None => None,
    };
    let client = DreamhostClient::new(cfg.api_key, http, cfg.base_url.as_deref())?;
    info!(base_url = %client.base_url(), "using DreamHost API");

    let (action, args) = match &command {
        Command::Create(args) => ("created", args),
        Command::Delete(args) => ("deleted", args),
    };
    let record = args.record();
    let unique_id = args.unique_id.as_deref();

    let result = match &command {
        Command::Create(_) => client.create_record(&record, unique_id).await,
        Command::Delete(_) => client.delete_record(&record, unique_id).await,
    };

    match result {
        Ok(()) => {
            info!(name = %record.name, record_type = %record.record_type, "{action} record");
            Ok(())
        }
        Err(e) => {
            error!(kind = ?e.kind(), "{e}");
            Err(e.into())
        }
    }
}
