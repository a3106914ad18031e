use thiserror::Error;

/// Errors surfaced by the store boundary and the controllers.
///
/// `Network` and `Api` messages are passed through verbatim to the
/// notification layer. `Parse` is only ever returned from explicit
/// validation (format, save checks, malformed responses); decoding a
/// record never fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// Transport failure or non-2xx status
    #[error("{0}")]
    Network(String),

    /// 2xx response carrying `success: false` or an `error` field
    #[error("{0}")]
    Api(String),

    /// Malformed JSON
    #[error("invalid JSON: {0}")]
    Parse(String),

    /// Operation invoked without its precondition
    #[error("{0}")]
    Usage(String),
}

impl KvError {
    pub fn usage(msg: impl Into<String>) -> Self {
        KvError::Usage(msg.into())
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, KvError::Usage(_))
    }
}

impl From<serde_json::Error> for KvError {
    fn from(e: serde_json::Error) -> Self {
        KvError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KvError>;
