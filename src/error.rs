#[derive(Debug, thiserror::Error)]
pub enum UserdeskError {
    /// The identity provider rejected the operation, the user cancelled,
    /// or no session is available.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A required field was missing; raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl UserdeskError {
    /// Transport failures and non-2xx responses both count as network errors.
    pub fn is_network(&self) -> bool {
        matches!(self, UserdeskError::Network(_) | UserdeskError::Api { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, UserdeskError::Auth(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, UserdeskError::Validation(_))
    }

    /// No usable session: nothing stored, or the server rejected the token.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            UserdeskError::Auth(_) | UserdeskError::Api { status: 401 | 403, .. }
        )
    }
}

impl From<anyhow::Error> for UserdeskError {
    fn from(err: anyhow::Error) -> Self {
        UserdeskError::Config(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, UserdeskError>;
