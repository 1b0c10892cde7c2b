pub mod display;
pub mod driver;
pub mod error;
pub mod inputs;

pub use display::{
    ColorScheme, DisplayObject, TimelineStats, color_for, depth_color, movement_color,
    operation_color, operation_line_width, rainbow_color, to_display_objects,
};
pub use driver::{NullReporter, Pipeline, ProgressReporter};
pub use error::PipelineError;
pub use inputs::{PipelineInputs, PipelineResult};
