//! Host-side failures of the runner.

use std::path::PathBuf;

use rv32_core::LoadError;
use thiserror::Error;

/// Errors reported by the loader, configuration and binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The JSON configuration did not parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// The program image did not fit in RAM.
    #[error("cannot load program: {0}")]
    Load(#[from] LoadError),
    /// The program file was empty.
    #[error("program {} is empty", .0.display())]
    EmptyProgram(PathBuf),
}
