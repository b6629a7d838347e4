//! # VSSCTL CLI
//!
//! Command-line interface for Vault Secret Sync.
//!
//! Runs the same engine as the service, once, from a shell or a CronJob, using the
//! same environment variables.
//!
//! ## Usage
//!
//! ```bash
//! # Sync the configured mappings into the default namespace
//! vssctl sync
//!
//! # Sync a different mapping file into another namespace, JSON output
//! vssctl sync --namespace payments --mappings-file ./mappings.yaml --output json
//!
//! # Check Vault and cluster reachability
//! vssctl health
//!
//! # Show the effective configuration (credentials removed)
//! vssctl config
//!
//! # Validate a mapping file without contacting any backend
//! vssctl validate --mappings-file ./mappings.yaml
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::{Path, PathBuf};
use vault_secret_sync::config::{load_mappings_file, LogFormat, ServiceConfig};
use vault_secret_sync::constants::DEFAULT_MAPPINGS_FILE;
use vault_secret_sync::observability::init_logging;
use vault_secret_sync::runtime;
use vault_secret_sync::sync::{resolve_run, MappingOutcome, SyncReport};

/// Vault Secret Sync CLI
#[derive(Parser)]
#[command(name = "vssctl")]
#[command(
    about = "Vault Secret Sync CLI",
    long_about = None,
    after_help = "\
Configuration is read from the same environment variables as the service
(VAULT_ADDRESS, VAULT_ROLE_ID, VAULT_SECRET_ID, ...). A .env file in the
working directory is loaded if present.

Examples:
  vssctl sync --namespace payments
  vssctl health
  vssctl validate --mappings-file ./secret-mappings.yaml
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync of the mapping set
    Sync {
        /// Target namespace (defaults to OPENSHIFT_NAMESPACE)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Mapping file to use instead of SECRET_MAPPINGS_FILE
        #[arg(short, long, value_name = "PATH")]
        mappings_file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Check Vault and cluster API reachability
    Health {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Show the effective configuration
    Config,
    /// Validate a mapping file
    Validate {
        /// Mapping file (defaults to SECRET_MAPPINGS_FILE)
        #[arg(short, long, value_name = "PATH")]
        mappings_file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    runtime::install_crypto_provider();
    let _ = dotenvy::dotenv();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    init_logging(&log_level, LogFormat::Text);

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            namespace,
            mappings_file,
            output,
        } => sync_command(namespace, mappings_file, output).await,
        Commands::Health { output } => health_command(output).await,
        Commands::Config => config_command(),
        Commands::Validate { mappings_file } => validate_command(mappings_file),
    }
}

async fn sync_command(
    namespace: Option<String>,
    mappings_file: Option<PathBuf>,
    output: OutputFormat,
) -> Result<()> {
    let config = ServiceConfig::from_env()?;
    let path = mappings_file.unwrap_or_else(|| config.mappings_file.clone());
    let mappings = load_mappings_file(&path)?;

    let plan = resolve_run(&config.default_namespace, &mappings, namespace, None)?;
    let components = runtime::connect(&config).await?;
    let report = components
        .engine
        .run(&plan.namespace, &plan.mappings)
        .await?;

    match output {
        OutputFormat::Json => print_json(&json!({
            "run_id": report.run_id,
            "namespace": report.namespace,
            "updated_secrets": report.updated(),
            "results": report.entries(),
        }))?,
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!("Run {} in namespace {}", report.run_id, report.namespace);
    for result in &report.results {
        match &result.outcome {
            MappingOutcome::Synced(action) => {
                println!("  ✅ {} ({:?})", result.mapping, action);
            }
            MappingOutcome::Skipped { reason } => {
                println!("  ⏭️  {} skipped: {}", result.mapping, reason);
            }
            MappingOutcome::Failed { reason, .. } => {
                println!("  ❌ {} failed: {}", result.mapping, reason);
            }
        }
    }
    println!(
        "Successfully updated {} secrets ({} skipped, {} failed)",
        report.count("synced"),
        report.count("skipped"),
        report.count("failed")
    );
}

async fn health_command(output: OutputFormat) -> Result<()> {
    let config = ServiceConfig::from_env()?;
    let components = runtime::connect(&config).await?;
    let report = components.health.check().await;
    let status = report.status();

    match output {
        OutputFormat::Json => print_json(&json!({
            "status": status.as_str(),
            "vault_connectivity": report.store_reachable,
            "openshift_connectivity": report.target_reachable,
        }))?,
        OutputFormat::Text => {
            println!("Vault:     {}", reachable_label(report.store_reachable));
            println!("OpenShift: {}", reachable_label(report.target_reachable));
            println!("Status:    {}", status.as_str());
        }
    }

    if report.store_reachable && report.target_reachable {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn reachable_label(reachable: bool) -> &'static str {
    if reachable {
        "reachable"
    } else {
        "unreachable"
    }
}

fn config_command() -> Result<()> {
    let config = ServiceConfig::load()?;
    print_json(&config.public_view())
}

fn validate_command(mappings_file: Option<PathBuf>) -> Result<()> {
    let path = mappings_file.unwrap_or_else(|| {
        PathBuf::from(
            std::env::var("SECRET_MAPPINGS_FILE")
                .unwrap_or_else(|_| DEFAULT_MAPPINGS_FILE.to_string()),
        )
    });

    if !Path::new(&path).exists() {
        bail!("Mapping file not found: {}", path.display());
    }

    let mappings = load_mappings_file(&path)?;
    println!(
        "✅ {} is valid ({} mappings)",
        path.display(),
        mappings.len()
    );
    for mapping in &mappings {
        println!("  {mapping}");
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}
