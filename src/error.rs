use thiserror::Error;

use crate::persistence::StorageError;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("malformed import document: {0}")]
    MalformedImport(#[source] serde_json::Error),

    #[error("could not serialize planner data: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
