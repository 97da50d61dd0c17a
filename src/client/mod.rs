//! Text-generation endpoint used by the judge.

mod gemini;

pub use gemini::GeminiClient;

/// Status marker that identifies a throttled request in an error description.
pub const RATE_LIMIT_MARKER: &str = "429";

/// Broad classification of an endpoint failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service is refusing requests because of quota or throughput limits.
    RateLimited,
    /// Any other transport or service failure.
    Other,
}

impl ErrorKind {
    /// Classify a raw error description: rate limited iff it mentions the 429 marker.
    pub fn classify(description: &str) -> Self {
        if description.contains(RATE_LIMIT_MARKER) {
            ErrorKind::RateLimited
        } else {
            ErrorKind::Other
        }
    }
}

/// Failure reported by a [`Generate`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GenerateError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerateError {
    /// Build an error from its description, deriving the kind from the description.
    pub fn from_description(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::classify(&message),
            message,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Other,
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ErrorKind::RateLimited
    }
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        // Host, port or path digits must not read as a 429
        Self::from_description(err.without_url().to_string())
    }
}

/// A synchronous prompt-in, text-out model endpoint.
pub trait Generate {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

impl<T: Generate + ?Sized> Generate for &T {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        (**self).generate(prompt)
    }
}
