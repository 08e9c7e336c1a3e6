/// Result alias that carries the custom [`ScopeError`] type.
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Free-form failure that does not belong to a more specific variant.
    #[error("{0}")]
    Message(String),
    /// Synthesis or geometry input that cannot be coerced into something
    /// meaningful (non-positive frequency, zero sample rate, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The output surface or its window could not be acquired.
    #[error("display unavailable: {0}")]
    Display(String),
    /// The audio output device could not be opened or written to.
    #[error("audio output failed: {0}")]
    Audio(String),
    /// The session was already released and refuses further work.
    #[error("session already released")]
    Released,
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or trace files that are not valid JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl ScopeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

impl From<&str> for ScopeError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ScopeError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
