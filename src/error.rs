use thiserror::Error;

/// Failure of the one-shot user lookup. Never retried; the lookup is an
/// authoritative check, not a transient network op.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("user lookup returned HTTP {status}")]
    NotFound { status: u16 },

    #[error("user lookup request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Failure of a single timeline page request. The collector treats every
/// variant as transient and retries against its budget; 429 is not an error
/// (it is reported as a rate-limit outcome with a reset time instead).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeline request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("timeline request returned HTTP {0}")]
    Status(u16),
}
