//! Error types for PlanDesk

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanDeskError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Unknown feature state: {0}")]
    UnknownFeatureState(String),
}

pub type PlanDeskResult<T> = Result<T, PlanDeskError>;
