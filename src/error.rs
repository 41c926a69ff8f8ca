use crate::handler::HandlerRef;
use crate::types::AssignKey;
use thiserror::Error;

/// Storage-layer error type.
pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
///
/// Everything except [`Error::Repo`] signals a configuration mistake in the
/// embedding application. Missing resources and denied subjects are not errors;
/// they are routed to the configured handlers instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage collaborator failure, propagated verbatim.
    #[error("repo error: {0}")]
    Repo(#[source] RepoError),
    /// Invalid identifier input.
    #[error("invalid id: {0}")]
    InvalidId(String),
    /// Both `only` and `except` were configured.
    #[error("options `only` and `except` are mutually exclusive")]
    ConflictingFilters,
    /// Neither an action override nor a framework action is available.
    #[error("request context carries no action")]
    MissingAction,
    /// The subject key is absent from the attribute store.
    #[error("no subject assigned under `{key}`")]
    MissingSubject { key: AssignKey },
    /// The subject key holds something other than a subject or nil.
    #[error("value assigned under `{key}` is not a subject")]
    InvalidSubject { key: AssignKey },
    /// Handler reference is not a `module::function` pair.
    #[error("malformed handler reference: {0}")]
    MalformedHandler(String),
    /// Handler reference does not name a registered handler.
    #[error("handler {0} is not registered")]
    UnknownHandler(HandlerRef),
}

impl From<RepoError> for Error {
    fn from(error: RepoError) -> Self {
        Self::Repo(error)
    }
}
