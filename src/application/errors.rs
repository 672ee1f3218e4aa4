//! Typed application errors.
//!
//! Use cases return `DocsResult`; ports speak `anyhow::Result` and their
//! failures fold into [`DocsError::Internal`]. The variant set mirrors the
//! categories documented in the design: NotFound / PermissionDenied /
//! Unauthenticated / Conflict / Invariant / Upstream / Internal.

use thiserror::Error;

/// Error surface shared by the application use cases.
#[derive(Debug, Error)]
pub enum DocsError {
    /// The requested resource does not exist (or is not visible).
    #[error("not found")]
    NotFound,

    /// The caller is authenticated but lacks the required capability.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The caller is anonymous where authentication is required.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The request conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A domain invariant was violated by the request.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// An upstream/external dependency reported a failure.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// An unexpected internal failure bubbled up from a port.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Path construction/validation failures are domain invariant violations.
impl From<crate::domain::documents::path::PathError> for DocsError {
    fn from(err: crate::domain::documents::path::PathError) -> Self {
        DocsError::Invariant(err.to_string())
    }
}

/// Convenience alias for use-case results.
pub type DocsResult<T> = Result<T, DocsError>;
