//! Error types for mapping operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or validating an alias dictionary.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read alias dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse alias dictionary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid alias dictionary: {0}")]
    Invalid(String),
}

/// Errors from the language-model fallback.
///
/// None of these reach the caller of the mapping engine; they are logged and
/// the affected headers stay unmapped.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// Transport failure, including timeouts.
    #[error("network error: {0}")]
    Network(String),

    /// The completion endpoint answered with a non-success status.
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint reply or the completion text did not have the expected shape.
    #[error("malformed completion: {0}")]
    Malformed(String),

    /// The endpoint replied without any completion text.
    #[error("completion contained no text")]
    EmptyCompletion,

    /// The resolver could not be configured.
    #[error("resolver configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    /// Returns whether the failure came from the remote side rather than from
    /// the content of the reply.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { .. })
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification() {
        assert!(ResolveError::Network("timeout".to_string()).is_transport());
        assert!(
            ResolveError::Status {
                status: 429,
                body: "slow down".to_string()
            }
            .is_transport()
        );
        assert!(!ResolveError::EmptyCompletion.is_transport());
        assert!(!ResolveError::Malformed("eof".to_string()).is_transport());
    }

    #[test]
    fn status_message_includes_code() {
        let err = ResolveError::Status {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "completion endpoint returned 401: invalid api key"
        );
    }
}
