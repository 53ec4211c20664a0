#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "SpentLedger CLI".bright_cyan().bold());
    println!("{}", "---------------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but all functionality is in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!("  - {}  {}", "spent-export".bright_white(), "write the registry to a checksummed file".dimmed());
    println!("  - {}  {}", "spent-verify".bright_white(), "check a spent address file's checksum".dimmed());
    println!("  - {}   {}", "spent-merge".bright_white(), "import one or more files into the registry".dimmed());
    println!("  - {}  {}", "spent-server".bright_white(), "serve the operations over HTTP".dimmed());
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!("{}", "  cargo run --bin spent-merge -- a.txt b.txt".italic());
}
