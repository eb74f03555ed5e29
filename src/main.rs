use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use daily_papers::config::{find_config_file, load_config, save_config, Config};
use daily_papers::download::Downloader;
use daily_papers::extract::PaperExtractor;
use daily_papers::fetch::{Fetcher, HttpFetcher};
use daily_papers::models::ListingStatus;
use daily_papers::processor::PdfProcessor;
use daily_papers::scheduler::Scheduler;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Daily Papers - Download each day's research papers and send them for processing
#[derive(Parser, Debug)]
#[command(name = "daily-papers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download each day's research papers and send them for processing", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract today's papers, download their PDFs and print the run summary (default)
    Run,

    /// Extract today's papers without downloading
    #[command(alias = "ls")]
    List {
        /// Print the full extraction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every day at the configured time until interrupted
    Schedule,

    /// Send downloaded PDFs to the processing service, then watch for new ones
    Process {
        /// Do not process PDFs that are already in the download directory
        #[arg(long)]
        skip_existing: bool,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Destination (defaults to ./daily-papers.toml)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::InitConfig { path }) = &cli.command {
        let path = path
            .clone()
            .unwrap_or_else(|| PathBuf::from("daily-papers.toml"));
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        save_config(&Config::default(), &path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    init_logging(&cli, &config)?;
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.http)?);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let downloader = Downloader::new(fetcher, &config)?;
            let summary = downloader.run().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::List { json } => {
            let extractor = PaperExtractor::new(fetcher, config.listing.clone())?;
            let extraction = extractor.get_papers().await;

            if json {
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            } else {
                for paper in &extraction.papers {
                    println!("{}  {}", paper.identifier(), paper.title());
                }
                if !cli.quiet {
                    match &extraction.status {
                        ListingStatus::Found(strategy) => {
                            eprintln!("{} papers via {}", extraction.papers.len(), strategy)
                        }
                        ListingStatus::NothingFound => eprintln!("No papers found"),
                        ListingStatus::Unreachable => eprintln!("Listing site unreachable"),
                    }
                }
            }
        }

        Commands::Schedule => {
            let scheduler = Scheduler::new(&config.scheduler)?;
            let downloader = Downloader::new(fetcher, &config)?;
            let downloader = &downloader;

            tracing::info!("Scheduling daily runs at {}", scheduler.run_at().format("%H:%M"));
            scheduler
                .run(
                    move || async move { downloader.run().await.map(|_| ()) },
                    shutdown_signal(),
                )
                .await;
        }

        Commands::Process { skip_existing } => {
            let mut processor = PdfProcessor::new(&config)?;
            let mut print_result = |_: &Path, result: &Value| {
                match serde_json::to_string_pretty(result) {
                    Ok(text) => println!("{}", text),
                    Err(e) => tracing::warn!("Could not render service result: {}", e),
                }
            };

            if config.processor.process_existing && !skip_existing {
                let processed = processor.process_existing(&mut print_result).await?;
                tracing::info!("Processed {} existing PDFs", processed);
            }

            processor.watch(shutdown_signal(), &mut print_result).await?;
        }

        // Written before any configuration is loaded
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

/// Console logging to stderr, plus a dated log file when `logging.directory` is set
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let file_layer = match &config.logging.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(format!(
                "daily-papers_{}.log",
                chrono::Local::now().format("%Y%m%d")
            ));
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("daily_papers={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
