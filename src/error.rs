//! Error enum
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    Csv(csv::Error),
    /// Invalid invocation or missing/broken reference data. Raised before any work starts.
    Config(String),
    /// An audio file or record could not be read while scheduling or recording.
    ResourceRead { path: PathBuf, reason: String },
    /// A record that does not decode into a [crate::types::SampleRecord].
    InvalidRecord { path: PathBuf, reason: String },
    /// The audit found problems (the count is carried along, findings are reported separately).
    AuditFailed(usize),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Serde(e) => write!(f, "json error: {}", e),
            Error::Glob(e) => write!(f, "glob error: {}", e),
            Error::GlobPattern(e) => write!(f, "invalid glob pattern: {}", e),
            Error::Csv(e) => write!(f, "csv error: {}", e),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::ResourceRead { path, reason } => {
                write!(f, "could not read {}: {}", path.display(), reason)
            }
            Error::InvalidRecord { path, reason } => {
                write!(f, "invalid record {}: {}", path.display(), reason)
            }
            Error::AuditFailed(n) => write!(f, "audit failed with {} finding(s)", n),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Error {
        Error::Csv(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}
