use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("scripted source needs at least one sample")]
    EmptyScript,
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("simulated capture failure at frame {frame}")]
    CaptureFailed { frame: u64 },
}

pub type Result<T> = std::result::Result<T, SimError>;
