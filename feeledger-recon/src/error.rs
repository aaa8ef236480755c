use thiserror::Error;

/// A collaborator feed could not deliver its records.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid feed URL {0}")]
    InvalidUrl(String),

    #[error("invalid feed configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;

/// The expected-fee calculation hit a catalog entry it cannot total.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconError {
    #[error("fee rule '{fee_name}' has a non-finite amount")]
    NonFiniteAmount { fee_name: String },

    #[error("fee rule '{fee_name}' has a negative amount ({amount})")]
    NegativeAmount { fee_name: String, amount: f64 },
}
