// SPDX-License-Identifier: Apache-2.0 OR MIT
// Errors surfaced by initialization and configuration

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from `try_init`, `try_init_from_file` and `set_log_prefix`.
///
/// Emission itself never fails the caller.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("invalid log prefix '{prefix}': must contain ASCII letters or digits")]
    InvalidPrefix { prefix: String },

    #[error("failed to open log file '{}': {source}", path.display())]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
