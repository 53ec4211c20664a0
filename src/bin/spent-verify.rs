#![forbid(unsafe_code)]
//! Verify the checksum of one or more spent address files

use clap::Parser;
use colored::*;
use comfy_table::Color as TableColor;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use spentledger::cli::{abbreviate, init_logging, load_config_or_default};
use spentledger::verify::verify_file;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files to verify (defaults to spent.file from the config)
    files: Vec<PathBuf>,
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

    let files = if cli.files.is_empty() {
        vec![load_config_or_default(cli.config.as_deref())?.spent_file()]
    } else {
        cli.files
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Status", "Addresses", "Recorded", "Computed"]);

    let mut failures = 0;
    for file in &files {
        match verify_file(file) {
            Ok(v) => {
                let (status, color) = if v.is_valid {
                    ("valid", TableColor::Green)
                } else {
                    failures += 1;
                    ("mismatch", TableColor::Red)
                };
                table.add_row(vec![
                    Cell::new(file.display().to_string()),
                    Cell::new(status).fg(color),
                    Cell::new(v.address_count),
                    Cell::new(abbreviate(&v.recorded_checksum)),
                    Cell::new(abbreviate(&v.computed_checksum)),
                ]);
            }
            Err(e) => {
                failures += 1;
                table.add_row(vec![
                    Cell::new(file.display().to_string()),
                    Cell::new("error").fg(TableColor::Red),
                    Cell::new("-"),
                    Cell::new(e.to_string()),
                    Cell::new("-"),
                ]);
            }
        }
    }

    println!("{}", table);

    if failures > 0 {
        return Err(format!("{} of {} files failed verification", failures, files.len()).into());
    }

    println!("{}", "✅ All files verified".bright_green().bold());
    Ok(())
}
