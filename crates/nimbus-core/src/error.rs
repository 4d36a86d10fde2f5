use thiserror::Error;

/// Failure to obtain a decodable answer from the weather backend.
///
/// Every variant is a transport failure from the conversation's point of
/// view; application-level failures arrive as `success: false` responses.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to weather backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode weather backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("weather request task ended unexpectedly: {0}")]
    Aborted(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("input is empty")]
    EmptyInput,

    #[error("an exchange is already in flight")]
    ExchangeInFlight,

    #[error("conversation invariant violated: {0}")]
    InvariantViolation(&'static str),
}
