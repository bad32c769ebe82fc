use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnelError {
    #[error("missing configuration: {0}")]
    MissingConfiguration(&'static str),

    #[error("please specify a query or a raw query")]
    AmbiguousQuery,

    #[error("storage engine error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("mapping error: {0}")]
    Mapping(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RunnelError {
    /// Wrap an engine failure without translating it.
    ///
    /// The core never inspects or retries storage errors; they surface to
    /// the caller exactly as the engine raised them.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RunnelError::Storage(anyhow::Error::new(err))
    }
}

pub type Result<T> = std::result::Result<T, RunnelError>;
