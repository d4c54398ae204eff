// Embark CLI - operator tool for emba firmware analyses

mod local;
mod remote;

use clap::{Parser, Subcommand};
use colored::Colorize;
use embark_core::{AnalysisLifecycle, DeletionOutcome};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use local::Roots;

/// Embark - emba flags, log archival and storage cleanup
#[derive(Parser)]
#[command(name = "embark")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the emba flags for an analysis record (JSON)
    Flags {
        /// Path to the analysis record
        record: PathBuf,
    },
    /// Prune a log directory to the retained entries and zip it
    Archive {
        /// Log directory of the analysis (<log-root>/<id>)
        path_to_logs: PathBuf,

        /// Analysis id, if the directory is not named after it
        #[arg(long)]
        id: Option<Uuid>,

        /// Only prune, do not write a zip archive
        #[arg(long)]
        no_zip: bool,

        #[command(flatten)]
        roots: Roots,
    },
    /// Remove the storage of an analysis or firmware upload
    Purge {
        #[command(subcommand)]
        target: PurgeTarget,
    },
    /// Query a running tracker server
    Remote {
        /// Base URL of the server
        #[arg(long, default_value = "http://localhost:8001")]
        server: String,

        #[command(subcommand)]
        action: RemoteAction,
    },
}

#[derive(Subcommand)]
enum PurgeTarget {
    /// Analysis storage: the log directory, or the zip once archived
    Analysis {
        /// Log directory of the analysis
        path_to_logs: PathBuf,

        #[arg(long)]
        id: Option<Uuid>,

        /// The analysis was archived; remove its zip and keep the logs
        #[arg(long)]
        archived: bool,

        /// Zip archive of the analysis (defaults to <zip-root>/<id>.zip)
        #[arg(long)]
        zip: Option<PathBuf>,

        #[command(flatten)]
        roots: Roots,
    },
    /// Firmware upload folder (<media-root>/<id>)
    Firmware {
        id: Uuid,

        #[command(flatten)]
        roots: Roots,
    },
}

#[derive(Subcommand)]
enum RemoteAction {
    /// Show the progress of an analysis
    Status { id: Uuid },
    /// Print the emba flags the server derives for an analysis
    Flags { id: Uuid },
    /// Devices added per vendor
    Tracker {
        /// RFC 3339 start of the window (defaults to the last week)
        #[arg(long)]
        since: Option<String>,
    },
}

/// Log filter for the core library; operators raise it with `RUST_LOG`.
fn log_filter(rust_log: Option<String>) -> String {
    rust_log
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| "embark_core=warn".into())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_filter(
            std::env::var("RUST_LOG").ok(),
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Flags { record } => handle_flags(&record),
        Commands::Archive {
            path_to_logs,
            id,
            no_zip,
            roots,
        } => handle_archive(&path_to_logs, id, !no_zip, &roots),
        Commands::Purge { target } => handle_purge(target),
        Commands::Remote { server, action } => handle_remote(&server, action),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn handle_flags(record: &std::path::Path) -> anyhow::Result<()> {
    let source = local::read_flag_source(record)?;
    println!("{}", embark_core::derive_flags(&source));
    Ok(())
}

fn handle_archive(
    path_to_logs: &std::path::Path,
    id: Option<Uuid>,
    zip: bool,
    roots: &Roots,
) -> anyhow::Result<()> {
    let lifecycle = AnalysisLifecycle::new(roots.config());
    let files = local::analysis_files(lifecycle.config(), path_to_logs, id, false, None)?;
    let report = lifecycle.archive(&files, zip)?;

    println!("{} Archived {}", "✓".green().bold(), files.id);
    println!();
    println!("  Kept:    {}", report.pruned.retained.join(", "));
    println!("  Removed: {}", report.pruned.removed.len());
    for failure in &report.pruned.failures {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.path.display(),
            failure.error
        );
    }
    if let Some(artifact) = &report.zip {
        println!("  Zip:     {} ({} bytes)", artifact.path.display(), artifact.size_bytes);
        println!("  SHA-256: {}", artifact.sha256);
    }

    if report.pruned.is_clean() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{} entries could not be removed",
            report.pruned.failures.len()
        ))
    }
}

fn handle_purge(target: PurgeTarget) -> anyhow::Result<()> {
    let outcome = match target {
        PurgeTarget::Analysis {
            path_to_logs,
            id,
            archived,
            zip,
            roots,
        } => {
            let lifecycle = AnalysisLifecycle::new(roots.config());
            let files =
                local::analysis_files(lifecycle.config(), &path_to_logs, id, archived, zip)?;
            lifecycle.pre_delete_analysis(&files)
        }
        PurgeTarget::Firmware { id, roots } => {
            AnalysisLifecycle::new(roots.config()).pre_delete_firmware(id)
        }
    };

    print_outcome(&outcome);
    match outcome {
        DeletionOutcome::Failed { path, error } => Err(anyhow::anyhow!(
            "Failed to remove '{}': {}",
            path.display(),
            error
        )),
        _ => Ok(()),
    }
}

fn print_outcome(outcome: &DeletionOutcome) {
    match outcome {
        DeletionOutcome::Removed { path } => {
            println!("{} Removed {}", "✓".green().bold(), path.display())
        }
        DeletionOutcome::Skipped { path, reason } => {
            let path = path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("{} Skipped {}: {}", "!".yellow().bold(), path, reason.yellow())
        }
        DeletionOutcome::Failed { path, error } => {
            eprintln!("{} Failed {}: {}", "✗".red().bold(), path.display(), error.red())
        }
    }
}

fn handle_remote(server: &str, action: RemoteAction) -> anyhow::Result<()> {
    let client = remote::Client::new(server);

    match action {
        RemoteAction::Status { id } => {
            let analysis = client.analysis(id)?;
            let status = remote::status_of(&analysis)?;
            let record = &analysis["analysis"];

            let state = if record["failed"] == true {
                "failed".red().to_string()
            } else if record["finished"] == true {
                "finished".green().to_string()
            } else {
                "running".cyan().to_string()
            };

            println!("Analysis {} ({})", id, state);
            println!();
            println!("  Firmware: {}", record["firmware_name"].as_str().unwrap_or("-"));
            println!("  Version:  {}", record["version"].as_str().unwrap_or("-"));
            println!("  Progress: {}", remote::progress_line(&status));
            if record["archived"] == true {
                println!("  {}", "(archived)".dimmed());
            }
            Ok(())
        }
        RemoteAction::Flags { id } => {
            println!("{}", client.flags(id)?);
            Ok(())
        }
        RemoteAction::Tracker { since } => {
            let body = client.tracker(since.as_deref())?;
            println!("Devices since {}", body["since"].as_str().unwrap_or("-"));
            println!();
            if let Some(vendors) = body["vendors"].as_array() {
                for vendor in vendors {
                    println!(
                        "  {:<30} {}",
                        vendor["vendor_name"].as_str().unwrap_or("-"),
                        vendor["device_count"]
                    );
                }
            }
            Ok(())
        }
    }
}
