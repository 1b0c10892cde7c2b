pub mod error;
pub mod geometry;
pub mod library;
pub mod material;
pub mod operation;
pub mod tool;

pub use error::Error;
pub use geometry::{BoundingBox, Matrix4x4, Point3D, ProfilePoint, Vector3D};
pub use library::{MaterialLibrary, ToolLibrary};
pub use material::Material;
pub use operation::OperationKind;
pub use tool::{Tool, ToolKind};
