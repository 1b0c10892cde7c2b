pub mod cancel;
pub mod error;
pub mod ops;
pub mod toolpath;

pub use cancel::CancelToken;
pub use error::CamError;
pub use toolpath::{Movement, MovementKind, ToolRef, Toolpath};
