use std::io;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the OrgWarden CLI application.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable GitHub credentials were found, or the client could not be built.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The configuration document could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config_manager::ConfigurationError),

    /// Invalid or incompatible command-line arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Failed to read a file given on the command line.
    #[error("Failed to load file {path}: {source}")]
    LoadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Reconciliation or dump failed.
    #[error(transparent)]
    Reconcile(#[from] org_warden_core::ReconcileError),

    /// The dumped configuration could not be rendered.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] serde_yaml::Error),
}
