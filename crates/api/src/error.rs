use thiserror::Error;

/// Errors produced by an [`AuthClient`](crate::AuthClient).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The request never produced a usable response (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with an error status or a negative acknowledgement.
    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },
    /// The server answered with a success status but an unreadable body.
    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),
    /// The configured base URL is malformed or not allowed.
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl AuthError {
    /// Text suitable for a user-facing notification.
    ///
    /// Rejections carry the server-supplied message (or the operation's
    /// fallback text); everything else collapses into a generic message so
    /// transport internals never reach the screen.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected { message, .. } => message.clone(),
            AuthError::Transport(_) => "Could not reach the authentication server".to_string(),
            AuthError::InvalidResponse(_) => "Unexpected response from the authentication server".to_string(),
            AuthError::InvalidBaseUrl(_) => "The authentication server address is misconfigured".to_string(),
        }
    }
}
