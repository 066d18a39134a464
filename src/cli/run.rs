//! Run command implementation

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::RunConfig;
use crate::runner::RequestRunner;
use crate::transport::ReqwestTransport;

use super::CliError;

/// Parse and validate a sleep time in seconds
fn parse_sleep_time(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;

    if !value.is_finite() || value < 0.0 {
        return Err("sleep time must be a non-negative number of seconds".to_string());
    }
    if Duration::try_from_secs_f64(value).is_err() {
        return Err(format!("sleep time too large: {value}"));
    }
    Ok(value)
}

/// reqloop CLI
#[derive(Parser, Debug)]
#[command(name = "reqloop")]
#[command(about = "Replay HTTP requests against one endpoint and capture the responses", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a run described by a config file
    Run(RunCommand),

    /// Check a config file without sending anything
    Validate(super::ValidateCommand),
}

/// Arguments for `reqloop run`
#[derive(Parser, Debug)]
pub struct RunCommand {
    /// Run configuration file (JSON)
    #[arg(long, short)]
    pub config: PathBuf,

    /// Override the number of loops
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub loops: Option<u32>,

    /// Override the pause after each request, in seconds
    #[arg(long, value_parser = parse_sleep_time)]
    pub sleep_time: Option<f64>,

    /// Override the file receiving all responses
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// Save every response body to the output file
    #[arg(long, default_value_t = false)]
    pub save_output: bool,

    /// Append to existing output files instead of overwriting them
    #[arg(long, default_value_t = false)]
    pub append_logs: bool,

    /// Skip TLS certificate verification for the target endpoint
    #[arg(long, default_value_t = false)]
    pub insecure: bool,
}

impl RunCommand {
    /// Load the config file, apply flag overrides and validate
    pub fn resolve_config(&self) -> Result<RunConfig, CliError> {
        let mut config = RunConfig::load(&self.config)?;

        if let Some(loops) = self.loops {
            config.loops = loops;
        }
        if let Some(sleep_time) = self.sleep_time {
            config.sleep_time = sleep_time;
        }
        if self.save_output {
            config.save_output = true;
        }
        if let Some(output_file) = &self.output_file {
            if !config.save_output {
                return Err(CliError::InvalidArgument(format!(
                    "--output-file {} has no effect unless output saving is enabled",
                    output_file.display()
                )));
            }
            config.output_file = output_file.clone();
        }
        if self.append_logs {
            config.append_logs = true;
        }
        if self.insecure {
            config.verify_ssl = false;
        }

        config.validate()?;
        Ok(config)
    }

    /// Execute the run
    pub async fn execute(&self) -> Result<(), CliError> {
        let config = self.resolve_config()?;
        let transport = ReqwestTransport::with_timeout(config.timeout()?)?;

        let mut runner =
            RequestRunner::new(config.request_spec()?, config.run_settings(), Arc::new(transport));
        if let Some(token) = &config.token {
            runner = runner.with_token(token.to_token().shared());
        }

        runner.run().await;

        info!(
            completed = runner.completed_requests(),
            total = runner.total_requests(),
            "Run complete"
        );
        Ok(())
    }
}
