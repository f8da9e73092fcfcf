use thiserror::Error;

/// Failures the engine reports to its callers.
///
/// Placing fewer sessions than demanded is not an error; see
/// [`crate::data::UnmetDemand`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Unknown {kind}: {key}")]
    UnknownEntity { kind: &'static str, key: String },
    #[error("CSV export failed: {0}")]
    Export(String),
}

impl ScheduleError {
    pub fn config(message: impl Into<String>) -> Self {
        ScheduleError::Configuration(message.into())
    }

    pub fn export(message: impl Into<String>) -> Self {
        ScheduleError::Export(message.into())
    }

    pub fn unknown(kind: &'static str, key: impl ToString) -> Self {
        ScheduleError::UnknownEntity {
            kind,
            key: key.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
