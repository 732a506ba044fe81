//! Reconciliation error types.

use std::time::Duration;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised while reconciling an organization.
///
/// Per-entity failures inside a phase are collected and reported together through
/// [`ReconcileError::Multiple`], so one broken team or repository does not hide the
/// state of its siblings.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The declared configuration or the runtime options are invalid.
    ///
    /// Raised before any mutation is attempted.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Users declared with two exclusive roles in the same scope.
    #[error("{scope}: users declared as both {first} and {second}: {}", .users.join(", "))]
    RoleConflict {
        scope: String,
        first: &'static str,
        second: &'static str,
        users: Vec<String>,
    },

    /// Applying the diff would remove more than the allowed fraction of entities.
    #[error(
        "{scope}: would remove {removals} of {total}, exceeding the maximum removal delta of {maximum}"
    )]
    RemovalDeltaExceeded {
        scope: String,
        removals: usize,
        total: usize,
        maximum: f64,
    },

    /// A GitHub API call failed.
    #[error("failed to {operation}: {source}")]
    GitHub {
        operation: String,
        #[source]
        source: github_client::Error,
    },

    /// Live state contradicts the declared configuration in a way that cannot be fixed
    /// automatically.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A requested change was refused and stripped from the update.
    #[error("repo {repo}: {reason}")]
    Rejected { repo: String, reason: String },

    /// A requested fork did not become available in time.
    #[error("fork {repo} was not available after {waited:?}")]
    ForkTimeout { repo: String, waited: Duration },

    /// Several errors collected from one phase.
    #[error("{}", render_multiple(.0))]
    Multiple(Vec<ReconcileError>),

    /// An error annotated with the entity or phase it came from.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ReconcileError>,
    },
}

fn render_multiple(errors: &[ReconcileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl ReconcileError {
    pub fn github(operation: impl Into<String>, source: github_client::Error) -> Self {
        ReconcileError::GitHub {
            operation: operation.into(),
            source,
        }
    }

    pub fn rejected(repo: impl Into<String>, reason: impl Into<String>) -> Self {
        ReconcileError::Rejected {
            repo: repo.into(),
            reason: reason.into(),
        }
    }

    /// Wraps the error with a description of where it happened.
    pub fn context(self, context: impl Into<String>) -> Self {
        ReconcileError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Collapses collected errors: none is success, one is returned as is.
    pub fn from_errors(mut errors: Vec<ReconcileError>) -> ReconcileResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ReconcileError::Multiple(errors)),
        }
    }

    /// Returns the number of leaf errors, looking through aggregates and context.
    pub fn count(&self) -> usize {
        match self {
            ReconcileError::Multiple(errors) => errors.iter().map(|e| e.count()).sum(),
            ReconcileError::Context { source, .. } => source.count(),
            _ => 1,
        }
    }
}

/// Result type alias for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;
