//! Index Ripper main entry point
//!
//! This is the command-line interface over the scan and download pipelines.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use index_ripper::config::{load_config, validate, Config};
use index_ripper::control::{CancelFlag, PauseGate};
use index_ripper::download::{DownloadHandle, DownloadRequest, Downloader};
use index_ripper::events::{self, Event, EventReceiver};
use index_ripper::model::{ChildRef, TreeModel};
use index_ripper::url::normalize_root;
use index_ripper::{ScanOutcome, Scanner, StartOutcome};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Index Ripper: a scanner and downloader for HTTP directory listings
///
/// Index Ripper walks an "Index of" style listing page, mirrors the folder
/// structure it finds, and downloads the selected files with bounded
/// concurrency. Ctrl+C stops the scan or cancels running downloads; files
/// cut off mid-transfer keep their partial content on disk.
#[derive(Parser, Debug)]
#[command(name = "index-ripper")]
#[command(version = "1.0.0")]
#[command(about = "Scan and download HTTP directory listings", long_about = None)]
struct Cli {
    /// Root listing URL to scan (http or https)
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory to download into (default: named after the host)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Number of concurrent downloads (1-10)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Download only files with this extension (repeatable)
    #[arg(short, long = "ext", value_name = "EXT")]
    ext: Vec<String>,

    /// Scan and print the listing tree without downloading
    #[arg(long)]
    list_only: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };
    if let Some(jobs) = cli.jobs {
        config.download.workers = jobs;
    }
    validate(&config)?;

    // Fail on a bad root before any network traffic. The scan itself
    // re-checks, but a typo should not produce a "scan failed" report.
    let root = normalize_root(&cli.url)?;

    let (events_tx, mut events_rx) = events::channel();
    let model = Arc::new(TreeModel::new());
    let scanner = Arc::new(Scanner::new(&config, Arc::clone(&model), events_tx.clone())?);
    let pause = PauseGate::new();

    // First Ctrl+C asks the pipelines to wind down, second one exits.
    let interrupt = CancelFlag::new();
    spawn_interrupt_listener(interrupt.clone());

    let outcome = run_scan(&scanner, &cli.url, &pause, &interrupt, &mut events_rx).await?;
    drain_events(&mut events_rx);

    match outcome {
        ScanOutcome::Failed => anyhow::bail!("scan of {} failed", cli.url),
        ScanOutcome::Stopped => {
            if !cli.quiet {
                print_tree(&model);
            }
            return Ok(());
        }
        ScanOutcome::Completed => {}
    }

    if !cli.quiet {
        print_tree(&model);
        print_extension_summary(&model);
    }

    if cli.list_only || model.file_count() == 0 {
        return Ok(());
    }

    // Selection: named extensions, or everything when none were given.
    if cli.ext.is_empty() {
        model.select_all(true);
    } else {
        for ext in &cli.ext {
            let matched = model.set_extension_selected(ext, true);
            tracing::info!("extension {}: {} files selected", ext, matched);
        }
    }
    let selected = model.selected_files();
    if selected.is_empty() {
        println!("No files matched the requested extensions");
        return Ok(());
    }

    let output_root = cli.output.clone().unwrap_or_else(|| default_output_dir(&root));
    if !cli.quiet {
        println!(
            "\nDownloading {} files to {}",
            selected.len(),
            output_root.display()
        );
    }

    let requests: Vec<DownloadRequest> = selected
        .iter()
        .map(|file| DownloadRequest {
            url: file.url.clone(),
            destination: output_root.join(&file.path),
            name: file.name.clone(),
        })
        .collect();

    let downloader = Arc::new(Downloader::new(
        scanner.client(),
        events_tx.clone(),
        pause.clone(),
        config.download.workers,
    )?);
    let (succeeded, total) =
        run_downloads(&downloader, requests, &interrupt, &mut events_rx).await?;
    drain_events(&mut events_rx);

    if succeeded < total {
        anyhow::bail!("{} of {} downloads did not complete", total - succeeded, total);
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("index_ripper=info,warn"),
            1 => EnvFilter::new("index_ripper=debug,info"),
            2 => EnvFilter::new("index_ripper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels `interrupt` on the first Ctrl+C and exits on the second.
fn spawn_interrupt_listener(interrupt: CancelFlag) {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if interrupt.is_cancelled() {
                tracing::warn!("second interrupt, exiting immediately");
                std::process::exit(130);
            }
            interrupt.cancel();
        }
    });
}

/// Runs a scan to completion while relaying its events to the console.
async fn run_scan(
    scanner: &Arc<Scanner>,
    url: &str,
    pause: &PauseGate,
    interrupt: &CancelFlag,
    events: &mut EventReceiver,
) -> anyhow::Result<ScanOutcome> {
    let mut handle = match scanner.start(url.to_string(), pause.clone()) {
        StartOutcome::Started(handle) => handle,
        StartOutcome::StopRequested => anyhow::bail!("a scan is already running"),
    };

    let mut stop_sent = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                if let Some(event) = event {
                    print_event(&event);
                }
            }
            outcome = &mut handle => return Ok(outcome?),
            _ = interrupt.cancelled(), if !stop_sent => {
                tracing::info!("interrupt received, stopping scan");
                scanner.stop();
                stop_sent = true;
            }
        }
    }
}

/// Submits a batch and waits for it while relaying events to the console.
async fn run_downloads(
    downloader: &Arc<Downloader>,
    requests: Vec<DownloadRequest>,
    interrupt: &CancelFlag,
    events: &mut EventReceiver,
) -> anyhow::Result<(usize, usize)> {
    let (handles, mut monitor) = downloader.submit(requests);

    let mut cancel_sent = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                if let Some(event) = event {
                    print_event(&event);
                }
            }
            result = &mut monitor => return Ok(result?),
            _ = interrupt.cancelled(), if !cancel_sent => {
                tracing::info!("interrupt received, cancelling downloads");
                cancel_all(&handles);
                cancel_sent = true;
            }
        }
    }
}

fn cancel_all(handles: &[DownloadHandle]) {
    for handle in handles {
        handle.cancel();
    }
}

/// Prints events still queued after a phase has finished.
fn drain_events(events: &mut EventReceiver) {
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }
}

fn print_event(event: &Event) {
    match event {
        Event::ScanStatus { text } => println!("{}", text),
        Event::ScanProgress { processed, total } => {
            if *processed > 0 && (*processed % 25 == 0 || processed == total) {
                println!("  processed {}/{} entries", processed, total);
            }
        }
        Event::FileDiscovered {
            path,
            size_label,
            content_type,
            ..
        } => println!("  {} ({}, {})", path, size_label, content_type),
        Event::FileDiscoveryFailed { path } => println!("  {} (probe failed, skipped)", path),
        Event::DownloadProgress { name, percent, .. } => {
            // Per-percent events are too chatty for line output.
            if *percent > 0.0 && (*percent as u64) % 25 == 0 {
                println!("  {}: {:.0}%", name, percent);
            }
        }
        Event::DownloadStatus { destination, text } => {
            println!("  {}: {}", destination.display(), text)
        }
        Event::DownloadsFinished { succeeded, total } => {
            println!("Downloads finished: {} of {} succeeded", succeeded, total)
        }
        Event::ScanStarted | Event::ScanFinished { .. } | Event::FolderDiscovered { .. } => {}
    }
}

/// Prints the discovered tree with two-space indentation per level.
fn print_tree(model: &TreeModel) {
    let roots = model.roots();
    if roots.is_empty() {
        return;
    }
    println!();
    for child in &roots {
        print_child(model, child, 0);
    }
}

fn print_child(model: &TreeModel, child: &ChildRef, depth: usize) {
    let indent = "  ".repeat(depth);
    match child {
        ChildRef::Folder(path) => {
            if let Some(folder) = model.folder(path) {
                let name = folder.path.rsplit('/').next().unwrap_or(&folder.path);
                println!("{}{}/", indent, name);
                for nested in &folder.children {
                    print_child(model, nested, depth + 1);
                }
            }
        }
        ChildRef::File(path) => {
            if let Some(file) = model.file(path) {
                println!("{}{} ({})", indent, file.name, file.size_label());
            }
        }
    }
}

fn print_extension_summary(model: &TreeModel) {
    let counts = model.extension_counts();
    if counts.is_empty() {
        return;
    }
    println!("\nExtensions:");
    for (ext, count) in &counts {
        println!("  {:<16} {}", ext, count);
    }
}

/// Default download directory, named after the root's host and port.
fn default_output_dir(root: &Url) -> PathBuf {
    let host = root.host_str().unwrap_or("download");
    match root.port() {
        Some(port) => PathBuf::from(format!("{}_{}", host, port)),
        None => PathBuf::from(host),
    }
}
