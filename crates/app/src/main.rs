use std::path::PathBuf;

use anyhow::{Context, Result};
use cheque_core::{DateStrategy, Settings};
use cheque_ocr::ChequePipeline;
use cheque_storage::{ChequeLedger, CsvStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cheque", version, about = "Extract bank, IFSC, amount and date from scanned cheques")]
struct Cli {
    /// Config file (TOML). Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Cheque table to append to; overrides `store_path` from the config.
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// `full_text` or `region`; overrides `date_strategy` from the config.
    #[arg(long, global = true)]
    date_strategy: Option<DateStrategy>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process every .jpg/.jpeg/.png in a folder and append new cheques.
    Batch { folder: PathBuf },
    /// Print the record for one image without storing it.
    Extract { image: PathBuf },
    /// Print the stored cheque table.
    List,
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "cheque", "ChequeOcr")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match (&cli.config, default_config_path()) {
        (Some(path), _) => Settings::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        (None, Some(path)) => Settings::load_or_default(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        (None, None) => Settings::default(),
    };
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }
    if let Some(strategy) = cli.date_strategy {
        settings.date_strategy = strategy;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    tracing::debug!(?settings, "Loaded settings");

    let open_ledger = || -> Result<ChequeLedger<CsvStore>> {
        let store = CsvStore::open(&settings.store_path)
            .with_context(|| format!("Failed to open {}", settings.store_path.display()))?;
        Ok(ChequeLedger::open(store)?)
    };

    match &cli.command {
        Command::List => {
            print!("{}", commands::list(&open_ledger()?)?);
        }
        Command::Extract { image } => {
            let pipeline = build_pipeline(&settings)?;
            println!("{}", commands::extract(&pipeline, image).await?);
        }
        Command::Batch { folder } => {
            let pipeline = build_pipeline(&settings)?;
            let mut ledger = open_ledger()?;
            let summary = commands::batch(&pipeline, &mut ledger, folder).await?;
            println!(
                "All cheques processed and saved to {} ({} added, {} duplicates, {} failed)",
                settings.store_path.display(),
                summary.appended,
                summary.duplicates,
                summary.failed,
            );
        }
    }

    Ok(())
}

fn build_pipeline(
    settings: &Settings,
) -> Result<ChequePipeline<impl cheque_ocr::OcrBackend + 'static>> {
    let backend = cheque_ocr::system_backend(settings.ocr.data_path.clone(), &settings.ocr.lang)
        .context("No OCR engine available")?;
    Ok(ChequePipeline::new(backend).configure(settings))
}
