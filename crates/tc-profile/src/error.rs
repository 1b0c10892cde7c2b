use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("feature detection failed: {reason}")]
    Detection { reason: String },
}

impl ProfileError {
    pub fn extraction(reason: impl Into<String>) -> Self {
        ProfileError::Extraction { reason: reason.into() }
    }
}
