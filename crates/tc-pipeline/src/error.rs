use tc_cam::CamError;
use tc_core::operation::OperationKind;
use tc_profile::ProfileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("profile extraction failed: {reason}")]
    ProfileExtraction { reason: String },

    #[error("feature detection failed: {reason}")]
    FeatureDetection { reason: String },

    #[error("invalid {operation} parameters: {detail}")]
    OperationInvalid {
        operation: OperationKind,
        detail: String,
    },

    #[error("generation cancelled")]
    Cancelled,

    #[error("missing pipeline input: {field}")]
    MissingInput { field: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ProfileError> for PipelineError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Extraction { reason } => PipelineError::ProfileExtraction { reason },
            ProfileError::Detection { reason } => PipelineError::FeatureDetection { reason },
        }
    }
}

impl From<CamError> for PipelineError {
    fn from(err: CamError) -> Self {
        match err {
            CamError::InvalidOperation { operation, detail } => {
                PipelineError::OperationInvalid { operation, detail }
            }
            CamError::Cancelled => PipelineError::Cancelled,
            CamError::Core(core) => PipelineError::Internal(core.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_error_maps_to_extraction() {
        let err: PipelineError = ProfileError::extraction("no section").into();
        assert!(matches!(err, PipelineError::ProfileExtraction { .. }));
    }

    #[test]
    fn test_cam_cancelled_maps_to_cancelled() {
        let err: PipelineError = CamError::Cancelled.into();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    #[test]
    fn test_operation_invalid_keeps_operation() {
        let err: PipelineError =
            CamError::invalid(OperationKind::Threading, "pitch must be positive").into();
        match err {
            PipelineError::OperationInvalid { operation, .. } => {
                assert_eq!(operation, OperationKind::Threading)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_input_display() {
        let err = PipelineError::MissingInput { field: "parting_tool".into() };
        assert_eq!(err.to_string(), "missing pipeline input: parting_tool");
    }
}
