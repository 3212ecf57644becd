use thiserror::Error;

/// Failure of a single webhook round trip. Never shown to the end user
/// directly; the conversation falls back to a fixed message and the detail
/// goes to the console log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request timed out after {0} ms")]
    Timeout(u32),
}
