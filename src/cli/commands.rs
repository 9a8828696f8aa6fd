//! CLI commands implementation.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;

use crate::config::Settings;
use crate::enrichment::{write_results_csv, ClassifierBridge, CliDetector, ObjectDetector};
use crate::loader::{self, LoadOutcome};
use crate::pipeline::{daily_pipeline, ProcessRunner};
use crate::repository::{
    run_migrations, AsyncSqlitePool, DetectionRepository, MessageRepository,
};
use crate::server;

#[derive(Parser)]
#[command(name = "telepulse")]
#[command(about = "Telegram channel analytics pipeline")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true, env = "TELEPULSE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Config file path (default: telepulse.toml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory layout and database
    Init,

    /// Run the full daily pipeline (scrape -> load -> enrich -> transform)
    Run,

    /// Load scraped JSON batches into the raw message table
    Load,

    /// Classify downloaded images and store detections
    Enrich,

    /// Start the analytics API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show row counts for the raw tables
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.data_dir, cli.config)?;

    match cli.command {
        Commands::Init => cmd_init(&settings).await,
        Commands::Run => cmd_run(&settings).await,
        Commands::Load => cmd_load(&settings).await,
        Commands::Enrich => cmd_enrich(&settings).await,
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            cmd_serve(&settings, &host, port).await
        }
        Commands::Status => cmd_status(&settings).await,
    }
}

async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_layout()?;
    run_migrations(&settings.database_url).await?;

    println!(
        "{} Initialized data directory at {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!(
        "{} Database ready at {}",
        style("✓").green(),
        settings.database_url
    );
    Ok(())
}

async fn cmd_run(settings: &Settings) -> anyhow::Result<()> {
    let pipeline = daily_pipeline(settings)?;
    let runner = ProcessRunner::new(std::env::current_dir()?);

    println!(
        "{} Running daily pipeline ({} stages)",
        style("→").cyan(),
        pipeline.stages().len()
    );
    let started = std::time::Instant::now();

    match pipeline.execute(&runner).await {
        Ok(()) => {
            println!(
                "{} Pipeline complete in {:.1}s",
                style("✓").green(),
                started.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            println!("{} Pipeline failed: {}", style("✗").red(), e);
            Err(e.into())
        }
    }
}

async fn cmd_load(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_layout()?;
    run_migrations(&settings.database_url).await?;

    let pool = AsyncSqlitePool::new(&settings.database_url);
    let repo = MessageRepository::new(pool);

    match loader::load(&settings.messages_dir(), &repo)
        .await
        .context("failed to write raw message table")?
    {
        LoadOutcome::NoFiles => {
            println!(
                "{} No JSON files under {}, nothing to load",
                style("!").yellow(),
                settings.messages_dir().display()
            );
        }
        LoadOutcome::Loaded(rows) => {
            println!("{} Loaded {} messages", style("✓").green(), rows);
        }
    }
    Ok(())
}

async fn cmd_enrich(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_layout()?;
    run_migrations(&settings.database_url).await?;

    let detector = CliDetector::new(&settings.detector_command);
    if !detector.is_available() {
        anyhow::bail!(
            "detector command `{}` not found in PATH",
            settings.detector_command.first().map(String::as_str).unwrap_or("")
        );
    }

    let bridge = ClassifierBridge::new(detector);
    let rows = bridge.classify_directory(&settings.images_dir());

    if rows.is_empty() {
        println!("{} No detections to save", style("!").yellow());
        return Ok(());
    }

    let csv_path = settings.results_csv_path();
    write_results_csv(&rows, &csv_path)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;
    println!(
        "{} Saved {} detection results to {}",
        style("✓").green(),
        rows.len(),
        csv_path.display()
    );

    let pool = AsyncSqlitePool::new(&settings.database_url);
    let repo = DetectionRepository::new(pool);
    let inserted = repo
        .replace_all(&rows)
        .await
        .context("failed to write raw detection table")?;
    println!("{} Loaded {} detections", style("✓").green(), inserted);

    Ok(())
}

async fn cmd_serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    run_migrations(&settings.database_url).await?;
    server::serve(settings, host, port).await
}

async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    run_migrations(&settings.database_url).await?;

    let pool = AsyncSqlitePool::new(&settings.database_url);
    let messages = MessageRepository::new(pool.clone());
    let detections = DetectionRepository::new(pool);

    println!("{}", style("TelePulse Status").bold());
    println!("  Messages:   {}", messages.count().await?);
    println!("  Detections: {}", detections.count().await?);
    for (category, count) in detections.category_counts().await? {
        println!("    {:<16} {}", category, count);
    }
    Ok(())
}
