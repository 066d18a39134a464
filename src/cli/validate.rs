//! Validation subcommand

use clap::Parser;
use std::path::PathBuf;

use crate::config::RunConfig;

use super::CliError;

/// Validate command for checking a run configuration
#[derive(Parser, Debug)]
pub struct ValidateCommand {
    /// Run configuration file (JSON)
    #[arg(long, short)]
    pub config: PathBuf,
}

impl ValidateCommand {
    /// Execute the validation command
    pub fn execute(&self) -> Result<(), CliError> {
        let config = RunConfig::load(&self.config)?;

        if let Err(e) = config.validate() {
            eprintln!("Invalid configuration: {e}");
            return Err(e.into());
        }

        println!("Valid configuration: {}", self.config.display());
        println!("  Method: {}", config.http_method()?);
        println!("  URL: {}", config.url.trim());
        println!("  Loops: {}", config.loops);
        println!("  Total requests: {}", config.total_requests()?);
        println!("  Conditions: {}", config.conditions.len());
        println!(
            "  Token refresh: {}",
            if config.token.is_some() { "enabled" } else { "disabled" }
        );
        if config.save_output {
            println!("  Output file: {}", config.output_file.display());
        }
        Ok(())
    }
}
