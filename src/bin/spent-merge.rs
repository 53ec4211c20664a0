#![forbid(unsafe_code)]
//! Merge spent address files into the local registry

use clap::Parser;
use colored::*;
use spentledger::cli::{init_logging, load_service_from_config};
use spentledger::merge::MergeOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to merge (defaults to spent.file from the config)
    files: Vec<String>,
    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reject files whose declared count disagrees with their address lines
    #[arg(long)]
    strict_count: bool,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, mut service) = load_service_from_config(cli.config.as_deref())?;
    if cli.strict_count {
        service = service.with_merge_options(MergeOptions { strict_count: true });
    }

    let files = if cli.files.is_empty() {
        None
    } else {
        Some(cli.files)
    };

    println!(
        "{} {}",
        "📥 Merging spent addresses into".bright_cyan(),
        config.database.path.bright_white()
    );

    let report = service.merge_spent_addresses(files);

    for skipped in &report.skipped {
        println!("{} {}", "⏭️  Skipped:".yellow(), skipped);
    }
    for error in &report.errors {
        println!("{} {}", "❌".red(), error.red());
    }

    println!();
    println!(
        "{} {}",
        "Imported:".bright_green().bold(),
        report.imported_count.to_string().bright_white()
    );
    println!("{} {}", "Already known:".cyan(), report.duplicate_count);
    if report.failed_count > 0 {
        println!("{} {}", "Rejected:".red(), report.failed_count);
    }
    println!("{} {}", "Registry size:".cyan(), service.address_count()?);

    if !report.errors.is_empty() {
        return Err(format!("{} files failed to merge", report.errors.len()).into());
    }

    Ok(())
}
