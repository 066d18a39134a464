//! Command-line interface

pub mod error;
pub mod run;
pub mod validate;

pub use error::CliError;
pub use run::{Cli, Commands, RunCommand};
pub use validate::ValidateCommand;
