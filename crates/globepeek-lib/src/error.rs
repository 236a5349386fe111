use thiserror::Error;

/// Convenient result alias for the Globe Peek library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a country lookup by name or code matched nothing upstream.
    #[error("unknown country: {name}{}", format_suggestions(.suggestions))]
    CountryNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when a client is used without its API key configured.
    #[error("no API key configured for {service}")]
    MissingApiKey { service: &'static str },

    /// Raised when an upstream service answered with a non-success status.
    #[error("{service} returned HTTP {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Raised when an upstream payload was well-formed JSON but unusable.
    #[error("unexpected {service} payload: {message}")]
    UnexpectedPayload {
        service: &'static str,
        message: String,
    },

    /// Raised when an operation requires a session and none is present.
    #[error("not signed in")]
    Unauthenticated,

    /// Raised when the auth provider rejected credentials or a token.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Raised when caller-provided input fails validation.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Raised when configuration (for example a base URL) is malformed.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    /// Attach "did you mean" suggestions to a not-found error.
    ///
    /// Other variants are returned unchanged.
    pub fn with_suggestions(self, suggestions: Vec<String>) -> Self {
        match self {
            Error::CountryNotFound { name, .. } => Error::CountryNotFound { name, suggestions },
            other => other,
        }
    }

    /// Whether the error is an upstream "nothing matched" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::CountryNotFound { .. })
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
