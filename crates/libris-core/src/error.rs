use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Empty query")]
    EmptyQuery,

    #[error("Index store failure: {0}")]
    IndexStore(String),

    #[error("Upstream {service} failed: {message}")]
    Upstream { service: &'static str, message: String },

    #[error("Upstream {service} timed out after {millis} ms")]
    Timeout { service: &'static str, millis: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Wraps a local store failure, keeping the whole cause chain.
    pub fn index_store(err: impl std::fmt::Display) -> Self { Self::IndexStore(format!("{err:#}")) }

    /// True for failures of a remote service, which only ever degrade one mode.
    pub fn is_upstream(&self) -> bool { matches!(self, Self::Upstream { .. } | Self::Timeout { .. }) }
}

pub type Result<T> = std::result::Result<T, Error>;
