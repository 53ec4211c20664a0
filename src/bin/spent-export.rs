#![forbid(unsafe_code)]
//! Export the spent address registry to a checksummed file

use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use spentledger::cli::{abbreviate, init_logging, load_service_from_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Destination file (defaults to spent.file from the config)
    output: Option<PathBuf>,
    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (_config, service) = load_service_from_config(cli.config.as_deref())?;
    let destination = cli
        .output
        .unwrap_or_else(|| service.spent_file().to_path_buf());

    println!("{}", "📤 Exporting spent addresses...".bright_cyan());

    let summary = match service.export_to(&destination) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("{} {}", "❌ Export failed:".red().bold(), e);
            return Err(e.into());
        }
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Addresses"), Cell::new(summary.count)]);
    table.add_row(vec![
        Cell::new("File"),
        Cell::new(summary.path.display().to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Size"),
        Cell::new(format!("{} bytes ({} MB)", summary.size_bytes, summary.size_mb)),
    ]);
    table.add_row(vec![Cell::new("Checksum"), Cell::new(&summary.checksum)]);

    println!("{}", table);
    println!(
        "{} {}",
        "✅ Export complete:".bright_green().bold(),
        abbreviate(&summary.checksum).bright_white()
    );

    Ok(())
}
