use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{service} is rate limiting requests")]
    RateLimited { service: &'static str },
    #[error("access denied for {user}: the list is private or the client id is invalid")]
    AccessDenied { user: String },
    #[error("user {user} not found")]
    UserNotFound { user: String },
    #[error("unexpected response {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cookie unavailable: {0}")]
    Cookie(String),
    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        SourceError::Other(message.into())
    }
}
