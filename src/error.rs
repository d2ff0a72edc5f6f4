use std::fmt::{self, Display};
use std::io;

/// Provides `OutbreakError` and maps to other errors to
/// convert to an `OutbreakError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum OutbreakError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A draw without replacement asked for more indices than the window or cohort holds.
    InsufficientPool {
        requested: usize,
        available: usize,
    },
    /// A cohort sample was larger than the pool it is drawn from.
    InvalidPartition {
        cohort: &'static str,
        requested: usize,
        available: usize,
    },
    InvalidConfiguration(String),
    ReportError(String),
    /// The day counter already sits on the horizon.
    HorizonReached(u32),
    OutbreakError(String),
}

impl From<io::Error> for OutbreakError {
    fn from(error: io::Error) -> Self {
        OutbreakError::IoError(error)
    }
}

impl From<serde_json::Error> for OutbreakError {
    fn from(error: serde_json::Error) -> Self {
        OutbreakError::JsonError(error)
    }
}

impl From<csv::Error> for OutbreakError {
    fn from(error: csv::Error) -> Self {
        OutbreakError::CsvError(error)
    }
}

impl From<String> for OutbreakError {
    fn from(error: String) -> Self {
        OutbreakError::OutbreakError(error)
    }
}

impl From<&str> for OutbreakError {
    fn from(error: &str) -> Self {
        OutbreakError::OutbreakError(error.to_string())
    }
}

impl std::error::Error for OutbreakError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutbreakError::IoError(error) => Some(error),
            OutbreakError::JsonError(error) => Some(error),
            OutbreakError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for OutbreakError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutbreakError::InsufficientPool {
                requested,
                available,
            } => write!(
                f,
                "Error: requested {requested} individuals from a pool of {available}"
            ),
            OutbreakError::InvalidPartition {
                cohort,
                requested,
                available,
            } => write!(
                f,
                "Error: {cohort} cohort needs {requested} individuals but only {available} remain"
            ),
            OutbreakError::InvalidConfiguration(message) => {
                write!(f, "Error: invalid configuration: {message}")
            }
            OutbreakError::ReportError(message) => write!(f, "Error: {message}"),
            OutbreakError::HorizonReached(day) => {
                write!(f, "Error: simulation already reached its horizon on day {day}")
            }
            _ => write!(f, "Error: {self:?}"),
        }
    }
}
