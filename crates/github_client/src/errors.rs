//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when interacting with the GitHub API
//! through the github_client crate. The reconciliation engine inspects these variants to
//! decide whether a failure is fatal, collected, or a soft success (for instance a 404 when
//! removing a user who has deleted their own account).

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.remove_organization_membership("my-org", "octocat").await {
///     Ok(()) => println!("removed"),
///     Err(Error::NotFound) => println!("user already gone"),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A GitHub API request failed.
    ///
    /// The contained string carries the operation that failed and the message GitHub
    /// returned, so it can be reported verbatim in aggregated reconciliation errors.
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Authentication or GitHub client initialization failure.
    ///
    /// This error occurs when:
    /// - GitHub App credentials or personal tokens are invalid or expired
    /// - Network connectivity issues prevent authentication
    /// - The GitHub App is not installed on the requested organization
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitHub.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The GitHub API returned a response in an unexpected format.
    ///
    /// Raised for instance when a GraphQL query answers with neither data nor errors.
    #[error("Invalid response format")]
    InvalidResponse,

    /// The requested resource was not found.
    ///
    /// This error occurs when a GitHub API request returns a 404 status code,
    /// indicating that the requested resource (user, team, repository, invitation)
    /// does not exist or is not accessible with the current authentication.
    #[error("Resource not found")]
    NotFound,

    /// GitHub API rate limit has been exceeded.
    ///
    /// Retrying is left to the caller; the reconciler reports it like any other
    /// per-entity failure.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl Error {
    /// Returns `true` when the error represents a missing resource (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}
