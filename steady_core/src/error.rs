use thiserror::Error;

/// Operator intent that is not legal in the current session state.
///
/// Recovered locally: the session is left untouched and the caller gets
/// the rejection back as a value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IntentError {
    #[error("a procedure is already active")]
    AlreadyActive,
    #[error("no procedure is active")]
    NotActive,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
