//! Error types for the interview session pipeline.

/// Top-level error type for a live interview session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Microphone or camera unavailable. Fatal when starting a session.
    #[error("device unavailable: {0}")]
    Device(String),

    /// Capture or turn-taking call made in the wrong state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Any failed request to the interview backend.
    #[error("network error: {0}")]
    Network(String),

    /// WAV or image encoding failure.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Synthesized audio could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Caller supplied unusable input (e.g. no context material).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// User-facing hint for errors the user can fix themselves.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            SessionError::Device(_) => Some(
                "Allow camera and microphone access for this application \
                 (or check the configured capture sources), then start the session again.",
            ),
            SessionError::Network(_) => Some("Check that the interview backend is reachable."),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        SessionError::Network(e.to_string())
    }
}

impl From<hound::Error> for SessionError {
    fn from(e: hound::Error) -> Self {
        SessionError::Encoding(format!("wav: {e}"))
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Encoding(format!("json: {e}"))
    }
}

impl From<image::ImageError> for SessionError {
    fn from(e: image::ImageError) -> Self {
        SessionError::Encoding(format!("image: {e}"))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SessionError>;
