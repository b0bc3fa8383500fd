use thiserror::Error;

/// Failures raised while building or reading the inverted index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("invalid document: {reason}")]
    InvalidDocument { reason: String },

    #[error("index is frozen: documents cannot be added after commit")]
    IndexFrozen,

    #[error("index has not been committed")]
    NotCommitted,
}

/// Malformed required-term syntax in a raw query string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("required marker at byte {position} is not followed by a term")]
    DanglingMarker { position: usize },

    #[error("repeated required marker at byte {position}")]
    RepeatedMarker { position: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query analyzed to zero terms")]
    EmptyQuery,

    #[error("query parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl QueryError {
    /// Errors a caller should treat as "no results" rather than a failure.
    pub fn is_no_results(&self) -> bool {
        matches!(self, QueryError::EmptyQuery | QueryError::Parse(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {field} = {value} is out of range")]
    InvalidParam { field: &'static str, value: f32 },
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
