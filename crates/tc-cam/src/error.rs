use tc_core::operation::OperationKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CamError {
    #[error("invalid {operation} parameters: {detail}")]
    InvalidOperation {
        operation: OperationKind,
        detail: String,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] tc_core::Error),
}

impl CamError {
    pub fn invalid(operation: OperationKind, detail: impl Into<String>) -> Self {
        CamError::InvalidOperation {
            operation,
            detail: detail.into(),
        }
    }
}
