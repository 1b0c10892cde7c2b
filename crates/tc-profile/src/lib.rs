pub mod error;
pub mod extract;
pub mod features;
pub mod part;

pub use error::ProfileError;
pub use extract::{ExtractionParams, Profile, ProfileSegment, extract_profile};
pub use features::{DetectedFeature, FeatureKind, detect_features};
pub use part::{CylindricalFace, PartShape, TurnedSolid, TurningAxis};
