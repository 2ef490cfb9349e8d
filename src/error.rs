use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `EpiError` and maps to other errors to
/// convert to an `EpiError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpiError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A parameter is missing or has a value the model cannot use
    ParameterError(String),
    /// A model definition is inconsistent (unknown compartment, bad fractions, ...)
    ModelError(String),
    /// A network operation was rejected (self loop, duplicate edge, unknown node)
    NetworkError(String),
    ReportError(String),
    EpiError(String),
}

impl From<io::Error> for EpiError {
    fn from(error: io::Error) -> Self {
        EpiError::IoError(error)
    }
}

impl From<serde_json::Error> for EpiError {
    fn from(error: serde_json::Error) -> Self {
        EpiError::JsonError(error)
    }
}

impl From<csv::Error> for EpiError {
    fn from(error: csv::Error) -> Self {
        EpiError::CSVError(error)
    }
}

impl From<String> for EpiError {
    fn from(error: String) -> Self {
        EpiError::EpiError(error)
    }
}

impl From<&str> for EpiError {
    fn from(error: &str) -> Self {
        EpiError::EpiError(error.to_string())
    }
}

impl std::error::Error for EpiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EpiError::IoError(error) => Some(error),
            EpiError::JsonError(error) => Some(error),
            EpiError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for EpiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpiError::ParameterError(message) => write!(f, "Parameter error: {message}"),
            EpiError::ModelError(message) => write!(f, "Model error: {message}"),
            EpiError::NetworkError(message) => write!(f, "Network error: {message}"),
            EpiError::ReportError(message) => write!(f, "Report error: {message}"),
            EpiError::EpiError(message) => write!(f, "Error: {message}"),
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
