use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from reading listings, diffs or config files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path or URL provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A listing or diff payload that is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration that parsed but cannot be used.
    #[error("Config error: {0}")]
    Config(String),

    /// The data source could not be reached or answered with a failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The data source has nothing for this identity.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A node record missing fields the tree needs.
    #[error("Malformed node {id}: {reason}")]
    MalformedNode { id: String, reason: String },

    /// Two different node records share one identity.
    #[error("Identity collision for {0}: two different nodes share this key")]
    IdentityCollision(String),

    /// An identity that was never part of any listing.
    #[error("Unknown node: {0}")]
    UnknownNode(String),
}

impl AppError {
    /// Whether this error leaves the session in a state it must not continue from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::IdentityCollision(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}
