use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tc_core::operation::OperationKind;
use tc_core::tool::Tool;

use crate::cancel::CancelToken;
use crate::error::CamError;
use crate::toolpath::{Movement, ToolRef, Toolpath};

/// Single-point threading. The feed of the cutting moves is the thread
/// pitch in mm/rev; the controller synchronises it to the spindle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadingParams {
    pub pitch: f64,
    pub major_diameter: f64,
    pub thread_depth: f64,
    pub start_z: f64,
    pub end_z: f64,
    pub passes: u32,
    /// Pass infeed exponent: depth share of pass i is `(i/n)^degression`,
    /// so later passes remove a diminishing share. 1.0 gives constant
    /// increments.
    pub degression: f64,
    pub constant_depth_passes: bool,
    pub lead_in: f64,
    pub clearance: f64,
    pub spindle_speed: f64,
    pub is_internal: bool,
}

impl Default for ThreadingParams {
    fn default() -> Self {
        Self {
            pitch: 1.5,
            major_diameter: 0.0,
            thread_depth: 0.9,
            start_z: 0.0,
            end_z: 0.0,
            passes: 3,
            degression: 0.8,
            constant_depth_passes: false,
            lead_in: 5.0,
            clearance: 3.0,
            spindle_speed: 300.0,
            is_internal: false,
        }
    }
}

impl ThreadingParams {
    fn validate(&self) -> Result<(), CamError> {
        let op = OperationKind::Threading;
        if self.pitch <= 0.0 {
            return Err(CamError::invalid(op, "pitch must be positive"));
        }
        if self.major_diameter <= 0.0 {
            return Err(CamError::invalid(op, "major diameter must be positive"));
        }
        if self.thread_depth <= 0.0 {
            return Err(CamError::invalid(op, "thread depth must be positive"));
        }
        if self.thread_depth >= self.major_diameter / 2.0 {
            return Err(CamError::invalid(op, "thread depth exceeds the major radius"));
        }
        if self.start_z <= self.end_z {
            return Err(CamError::invalid(op, "start Z must lie ahead of end Z"));
        }
        if self.passes == 0 {
            return Err(CamError::invalid(op, "at least one pass is required"));
        }
        Ok(())
    }

    /// Cumulative infeed after pass `i` of `n`.
    fn infeed(&self, i: u32) -> f64 {
        let share = i as f64 / self.passes as f64;
        if self.constant_depth_passes {
            self.thread_depth * share
        } else {
            self.thread_depth * share.powf(self.degression)
        }
    }

    fn pass_radius(&self, i: u32) -> f64 {
        let major_r = self.major_diameter / 2.0;
        if self.is_internal {
            // Internal threads cut outward from the minor diameter.
            (major_r - self.thread_depth) + self.infeed(i)
        } else {
            major_r - self.infeed(i)
        }
    }

    fn safe_radius(&self) -> f64 {
        let major_r = self.major_diameter / 2.0;
        if self.is_internal {
            (major_r - self.thread_depth - self.clearance).max(0.0)
        } else {
            major_r + self.clearance
        }
    }
}

pub fn plan_threading(
    params: &ThreadingParams,
    tool: &Tool,
    cancel: Option<&CancelToken>,
) -> Result<Toolpath, CamError> {
    params.validate()?;

    let op = OperationKind::Threading;
    let mut tp = Toolpath::new("Threading", op, ToolRef::new(&tool.id));

    let lead_z = params.start_z + params.lead_in;
    let safe_r = params.safe_radius();

    for i in 1..=params.passes {
        if let Some(token) = cancel
            && token.is_cancelled()
        {
            return Err(CamError::Cancelled);
        }

        let r = params.pass_radius(i);
        tp.push(Movement::rapid(ProfilePoint::new(lead_z, safe_r)));
        tp.push(Movement::rapid(ProfilePoint::new(lead_z, r)));
        tp.push(
            Movement::linear(ProfilePoint::new(params.end_z, r), params.pitch, params.spindle_speed)
                .with_comment("pitch-synchronized"),
        );
        tp.push(Movement::rapid(ProfilePoint::new(params.end_z, safe_r)));
        tp.push(Movement::rapid(ProfilePoint::new(lead_z, safe_r)));
    }

    tp.stamp(op, "Threading");
    Ok(tp)
}
