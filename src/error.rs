use thiserror::Error;

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors raised while configuring or running an evaluation.
#[derive(Error, Debug)]
pub enum EvalError {
    /// The label vocabulary has no entries.
    #[error("label vocabulary is empty")]
    EmptyVocabulary,

    /// A label appears twice in the vocabulary.
    #[error("duplicate label in vocabulary: '{0}'")]
    DuplicateLabel(String),

    /// The default label is also a vocabulary entry.
    #[error("default label '{0}' collides with a vocabulary entry")]
    DefaultLabelCollision(String),

    /// A matrix query used a label outside the vocabulary and the default label.
    #[error("unknown label: '{0}'")]
    UnknownLabel(String),

    /// Malformed label index entry.
    #[error("invalid label index: {0}")]
    LabelIndex(String),

    /// A record could not be decoded.
    #[error("invalid record: {0}")]
    Record(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parquet read error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Invalid key pattern.
    #[error("invalid key pattern: {0}")]
    Regex(#[from] regex::Error),
}

impl EvalError {
    /// Whether this error was raised while validating the label configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EvalError::EmptyVocabulary
                | EvalError::DuplicateLabel(_)
                | EvalError::DefaultLabelCollision(_)
        )
    }
}
