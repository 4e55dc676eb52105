use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResmonError {
    /// A single metric group could not be read. Never surfaced to clients;
    /// the sampler turns it into an absent group.
    #[error("{0} metrics unavailable")]
    MetricUnavailable(&'static str),

    #[error("invalid PID {0}")]
    InvalidPid(i32),

    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("cache purge failed: {0}")]
    Purge(String),

    #[error("unable to enumerate processes: {0}")]
    Enumeration(String),

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ResmonError>;
