use crate::persistence::PersistenceError;
use thiserror::Error;

/// Fatal conditions of an export. Nothing is retried internally and no partial
/// file is produced once one of these is raised.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("structural inconsistency: {0}")]
    StructuralInconsistency(String),

    #[error("unsupported export format '{0}'")]
    UnsupportedFormat(String),

    #[error("invalid relation: {0}")]
    InvalidRelation(String),

    #[error("external id persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("failed to write project file: {0}")]
    Write(String),
}

impl ExportError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::StructuralInconsistency(message.into())
    }
}

impl From<std::fmt::Error> for ExportError {
    fn from(value: std::fmt::Error) -> Self {
        Self::Write(value.to_string())
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
