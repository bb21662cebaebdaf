use thiserror::Error;

#[derive(Error, Debug)]
pub enum NllbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Translation backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("{0}")]
    ModelNotFound(String),

    #[error("Tokenizer load failed: {0}")]
    TokenizerLoad(String),

    #[error("Tokenizer missing language code token for {0}")]
    MissingLanguageToken(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tokenization error: {0}")]
    Tokenize(String),

    #[error("Translation error: {0}")]
    Oracle(String),
}

/// Coarse classification used to decide how a failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required backend is not available in this build or on this machine
    Environment,
    /// Detected before any chunk is translated
    Configuration,
    /// Failure while translating a specific chunk, or plain I/O
    Runtime,
}

impl NllbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BackendUnavailable(_) => ErrorKind::Environment,
            Self::ModelNotFound(_)
            | Self::TokenizerLoad(_)
            | Self::MissingLanguageToken(_)
            | Self::Config(_) => ErrorKind::Configuration,
            Self::Io(_)
            | Self::Json(_)
            | Self::Toml(_)
            | Self::Join(_)
            | Self::Tokenize(_)
            | Self::Oracle(_) => ErrorKind::Runtime,
        }
    }

    /// Environment and configuration errors get a diagnostic and exit status 1
    pub fn is_reported(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Runtime)
    }
}

pub type Result<T> = std::result::Result<T, NllbError>;
