//! Command-line interface for estatepin.
//!
//! Provides commands for running the pipeline, inspecting a produced
//! payload, checking pinning credentials, and showing configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::{
    AttomClient, ContentPublisher, MemoryPublisher, PinataClient, RecordSource, StaticSource,
};
use crate::config::{mask, Config};
use crate::core::{payload, ArtifactStore, IndexMap, Orchestrator};
use crate::domain::{RecordState, RunOutcome, RunReport};

/// estatepin - property records to IPFS metadata and on-chain payloads
#[derive(Parser, Debug)]
#[command(name = "estatepin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch properties, publish metadata, and build the payload and index
    Run {
        /// Postal code to query
        #[arg(long)]
        postal_code: Option<String>,

        /// Page number
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page: Option<u32>,

        /// Page size
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page_size: Option<u32>,

        /// Directory for metadata files, index and payload
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Compute content addresses locally instead of pinning
        #[arg(long)]
        dry_run: bool,

        /// Replay a saved response.json instead of calling the property API
        #[arg(long)]
        replay: Option<PathBuf>,
    },

    /// Decode a payload.hex file and list its entries
    Inspect {
        /// Path to payload.hex
        payload: PathBuf,

        /// Cross-check entries against an estate_index.json
        #[arg(short, long)]
        index: Option<PathBuf>,
    },

    /// Verify pinning service credentials
    Check,

    /// Show resolved configuration (secrets masked)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                postal_code,
                page,
                page_size,
                output_dir,
                dry_run,
                replay,
            } => {
                let mut config = Config::load()?;
                if let Some(postal_code) = postal_code {
                    config.query.postal_code = postal_code;
                }
                if let Some(page) = page {
                    config.query.page = page;
                }
                if let Some(page_size) = page_size {
                    config.query.page_size = page_size;
                }
                if let Some(output_dir) = output_dir {
                    config.output_dir = output_dir;
                }
                run_pipeline(&config, dry_run, replay).await
            }
            Commands::Inspect { payload, index } => inspect_payload(&payload, index.as_deref()),
            Commands::Check => check_credentials().await,
            Commands::Config => show_config(),
        }
    }
}

/// Run the full pipeline and print a summary
async fn run_pipeline(config: &Config, dry_run: bool, replay: Option<PathBuf>) -> Result<()> {
    let source: Arc<dyn RecordSource> = match replay {
        Some(path) => {
            let body = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read response snapshot: {}", path.display()))?;
            Arc::new(StaticSource::from_body(body))
        }
        None => Arc::new(AttomClient::new(
            config.attom.base_url.clone(),
            config.attom.api_key.clone(),
            config.timeout,
        )?),
    };

    let publisher: Arc<dyn ContentPublisher> = if dry_run {
        Arc::new(MemoryPublisher::new())
    } else {
        Arc::new(pinata_client(config)?)
    };

    if config.image_refs.is_empty() {
        eprintln!("warning: no image references configured; every property will be skipped");
    }

    let store = ArtifactStore::open(&config.output_dir).await?;
    let orchestrator = Orchestrator::new(config.pipeline_settings(), source, publisher)
        .with_artifacts(store.clone());

    match orchestrator.run().await? {
        RunOutcome::NoProperties { run_id } => {
            println!("No properties found.");
            println!("Full response saved to {}", store.snapshot_path().display());
            eprintln!("\n[Run {} finished with nothing to publish]", run_id);
        }
        RunOutcome::Completed(report) => {
            let payload_path = store.write_payload(&report.payload).await?;
            print_report(&report);
            println!("\nIndex:   {}", store.index_path().display());
            println!("Payload: {}", payload_path.display());
            eprintln!("\n[Run {} completed]", report.run_id);
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        match &outcome.state {
            RecordState::Indexed(property) => {
                println!("estateID: {}", property.estate_id);
                println!("description: {}", property.description);
                println!("IPFS CID: {}", property.content_address);
            }
            RecordState::Skipped { stage, reason } => {
                println!(
                    "skipped #{} ({}) at {:?}: {}",
                    outcome.position, outcome.identifier, stage, reason
                );
            }
        }
    }

    println!(
        "\nIndexed {} of {} properties",
        report.indexed_count(),
        report.outcomes.len()
    );
    for (kind, count) in report.skip_summary() {
        println!("  skipped ({}): {}", kind, count);
    }
}

/// Decode and print a payload file
fn inspect_payload(payload_path: &std::path::Path, index_path: Option<&std::path::Path>) -> Result<()> {
    let text = std::fs::read_to_string(payload_path)
        .with_context(|| format!("Failed to read payload: {}", payload_path.display()))?;
    let bytes = payload::from_hex(&text).context("Payload is not valid hex")?;
    let entries = payload::decode_aggregate(&bytes).context("Failed to decode aggregate payload")?;

    let index = match index_path {
        Some(path) => {
            let raw = std::fs::read(path)
                .with_context(|| format!("Failed to read index: {}", path.display()))?;
            Some(IndexMap::from_json(&raw).context("Failed to parse index")?)
        }
        None => None,
    };

    let mut mismatches = 0usize;
    for (i, raw_entry) in entries.iter().enumerate() {
        let entry = payload::decode_entry(raw_entry)
            .with_context(|| format!("Failed to decode entry {}", i))?;
        println!(
            "{:>3}  {:>10}  {}  {}",
            i, entry.estate_id, entry.content_address, entry.description
        );

        if let Some(index) = &index {
            match index.get(entry.estate_id) {
                Some(address) if address.as_str() == entry.content_address => {}
                Some(address) => {
                    mismatches += 1;
                    println!("     index maps {} to {}", entry.estate_id, address);
                }
                None => {
                    mismatches += 1;
                    println!("     {} is missing from the index", entry.estate_id);
                }
            }
        }
    }

    println!("\n{} entries", entries.len());
    if index.is_some() {
        if mismatches > 0 {
            anyhow::bail!("{} entries disagree with the index", mismatches);
        }
        println!("All entries match the index");
    }

    Ok(())
}

fn pinata_client(config: &Config) -> Result<PinataClient> {
    PinataClient::new(
        config.pinata.api_url.clone(),
        config.pinata.api_key.clone(),
        config.pinata.secret_key.clone(),
        config.timeout,
    )
}

/// Verify pinning credentials
async fn check_credentials() -> Result<()> {
    let config = Config::load()?;
    pinata_client(&config)?.health_check().await?;
    println!("Pinata credentials OK");
    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("estatepin Configuration");
    println!("=======================");
    println!();
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!();
    println!("Query:");
    println!("  postal_code: {}", config.query.postal_code);
    println!("  page:        {}", config.query.page);
    println!("  page_size:   {}", config.query.page_size);
    println!();
    println!("Property API:");
    println!("  base_url: {}", config.attom.base_url);
    println!("  api_key:  {}", mask(&config.attom.api_key));
    println!();
    println!("Pinata:");
    println!("  api_url:    {}", config.pinata.api_url);
    println!("  api_key:    {}", mask(&config.pinata.api_key));
    println!("  secret_key: {}", mask(&config.pinata.secret_key));
    println!("  gateway:    {}", config.pinata.gateway);
    println!();
    println!("Images:     {}", config.image_refs.len());
    println!("Output dir: {}", config.output_dir.display());
    println!("Timeout:    {:?}", config.timeout);

    Ok(())
}
