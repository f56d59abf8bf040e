use thiserror::Error;

use crate::domain::identity::ContentId;

/// Errors surfaced by the conversion pipeline.
///
/// `NotFound` and `Forbidden` concern the root entity only; expansion
/// targets degrade to an empty expanded slot instead. `UnsupportedType`
/// and `Configuration` are fatal registration problems and never retried.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("content {0} not found")]
    NotFound(ContentId),
    #[error("anonymous access to content {0} denied")]
    Forbidden(ContentId),
    #[error("no converter registered for property `{property}` of type `{data_type}`")]
    UnsupportedType { property: String, data_type: String },
    #[error("converter configuration error: {message}")]
    Configuration { message: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl ConvertError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Errors raised by the repository collaborators.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("repository lookup failed: {0}")]
    Lookup(String),
}
