use thiserror::Error;

// Error kinds surfaced by lookups and aggregation.
#[derive(Error, Debug)]
pub enum AppError {
    /// The query key (or a referenced resource) does not resolve.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote service unreachable, timed out, or answered with an error status.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// A response arrived but did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Message shown to the user when a query fails.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(_) => {
                "Pokémon not found. Please check the name or ID and try again.".to_string()
            }
            AppError::Unavailable(msg) => format!("Failed to fetch Pokémon data: {}", msg),
            AppError::Malformed(msg) => format!("Received unexpected data: {}", msg),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Malformed(err.to_string())
        } else if err.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            AppError::NotFound(err.to_string())
        } else {
            AppError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Malformed(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
