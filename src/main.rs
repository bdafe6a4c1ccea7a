//! jmx-collect - JMX collection file normalizer
//!
//! This binary parses every configured collection file, isolating failures
//! per file, and prints the resulting collection requests.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use jmx_collect::cli::Cli;
use jmx_collect::report::{self, FileReport};
use jmx_collect::DialectRegistry;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    jmx_collect::init_logging(&cli.log_level.to_string())?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting jmx-collect");

    // Load configuration
    let config = cli.resolve_config()?;
    let registry = DialectRegistry::standard();

    let mut reports = Vec::with_capacity(config.collection_files.len());
    let mut failed = 0usize;
    let mut skipped = 0usize;

    for path in &config.collection_files {
        match registry.parse_file(path) {
            Ok(parsed) => {
                for e in &parsed.skipped {
                    warn!(
                        file = %path.display(),
                        error = %e.root(),
                        "Skipped bean with invalid exclude_regex"
                    );
                }
                skipped += parsed.skipped.len();

                info!(
                    file = %path.display(),
                    dialect = %parsed.dialect,
                    domains = parsed.domains.len(),
                    skipped_beans = parsed.skipped.len(),
                    "Parsed collection file"
                );
                reports.push(FileReport {
                    path: path.clone(),
                    dialect: parsed.dialect,
                    domains: parsed.domains,
                });
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "Error parsing collection file");
                failed += 1;
            }
        }
    }

    if cli.validate {
        if failed > 0 || skipped > 0 {
            anyhow::bail!(
                "{} of {} collection files failed to parse, {} beans skipped",
                failed,
                config.collection_files.len(),
                skipped
            );
        }
        println!("Collection files are valid");
        return Ok(());
    }

    print!("{}", report::render(&reports, cli.output_format)?);

    Ok(())
}
