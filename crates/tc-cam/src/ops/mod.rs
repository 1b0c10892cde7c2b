//! The operation library: one planner per canonical lathe operation.
//!
//! Every planner validates its parameter bundle, emits a single
//! [`Toolpath`](crate::Toolpath) and stamps each movement with the
//! operation kind and a short operation name. A planner that rejects its
//! parameters emits no movements at all.

pub mod chamfering;
pub mod drilling;
pub mod facing;
pub mod finishing;
pub mod grooving;
pub mod parting;
pub mod roughing;
pub mod threading;

pub use chamfering::{ChamferingParams, plan_chamfering};
pub use drilling::{DrillingParams, DrillingStrategy, plan_drilling};
pub use facing::{FacingParams, FacingStrategy, plan_facing};
pub use finishing::{
    FinishingParams, FinishingStrategy, InternalFinishingParams, plan_external_finishing,
    plan_internal_finishing,
};
pub use grooving::{GroovingParams, GroovingStrategy, plan_grooving};
pub use parting::{PartingParams, PartingStrategy, plan_parting};
pub use roughing::{
    ExternalRoughingParams, InternalRoughingParams, plan_external_roughing,
    plan_internal_roughing,
};
pub use threading::{ThreadingParams, plan_threading};
