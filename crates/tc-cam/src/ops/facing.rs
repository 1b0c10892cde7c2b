use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tc_core::operation::OperationKind;
use tc_core::tool::Tool;

use crate::error::CamError;
use crate::toolpath::{Movement, ToolRef, Toolpath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingStrategy {
    InsideOut,
    OutsideIn,
    Conventional,
    Climb,
}

/// Facing parameters. `max_radius` is the part/stock envelope; the sweep
/// itself starts `clearance` outside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacingParams {
    /// First (roughing) pass level; the uncut stock face.
    pub start_z: f64,
    /// Final face position after the allowance is removed.
    pub end_z: f64,
    pub max_radius: f64,
    /// 0 for through-facing to centre.
    pub min_radius: f64,
    pub clearance: f64,
    pub depth_of_cut: f64,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub strategy: FacingStrategy,
}

impl Default for FacingParams {
    fn default() -> Self {
        Self {
            start_z: 0.0,
            end_z: 0.0,
            max_radius: 0.0,
            min_radius: 0.0,
            clearance: 2.0,
            depth_of_cut: 0.5,
            feed_rate: 120.0,
            spindle_speed: 1200.0,
            strategy: FacingStrategy::OutsideIn,
        }
    }
}

impl FacingParams {
    fn validate(&self) -> Result<(), CamError> {
        let op = OperationKind::Facing;
        if self.start_z <= self.end_z {
            return Err(CamError::invalid(op, "start Z must lie ahead of end Z"));
        }
        if self.max_radius <= self.min_radius {
            return Err(CamError::invalid(op, "max radius must exceed min radius"));
        }
        if self.min_radius < 0.0 {
            return Err(CamError::invalid(op, "min radius must be non-negative"));
        }
        if self.depth_of_cut <= 0.0 {
            return Err(CamError::invalid(op, "depth of cut must be positive"));
        }
        Ok(())
    }
}

/// Face the stock from `start_z` down to `end_z` in `depth_of_cut` steps,
/// finishing with one pass exactly at `end_z`.
pub fn plan_facing(params: &FacingParams, tool: &Tool) -> Result<Toolpath, CamError> {
    params.validate()?;

    let mut tp = Toolpath::new("Facing", OperationKind::Facing, ToolRef::new(&tool.id));

    let mut z = params.start_z;
    while z > params.end_z + 1e-9 {
        emit_pass(&mut tp, params, z);
        z -= params.depth_of_cut;
    }
    emit_pass(&mut tp, params, params.end_z);

    tp.stamp(OperationKind::Facing, "Facing Pass");
    Ok(tp)
}

fn emit_pass(tp: &mut Toolpath, params: &FacingParams, z: f64) {
    let outer = params.max_radius + params.clearance;
    let inner = params.min_radius;

    match params.strategy {
        FacingStrategy::OutsideIn | FacingStrategy::Conventional => {
            tp.push(Movement::rapid(ProfilePoint::new(z, outer)));
            tp.push(Movement::linear(
                ProfilePoint::new(z, inner),
                params.feed_rate,
                params.spindle_speed,
            ));
            tp.push(Movement::rapid(ProfilePoint::new(z + params.clearance, inner)));
        }
        FacingStrategy::InsideOut | FacingStrategy::Climb => {
            tp.push(Movement::rapid(ProfilePoint::new(z + params.clearance, inner)));
            tp.push(Movement::linear(
                ProfilePoint::new(z, inner),
                params.feed_rate,
                params.spindle_speed,
            ));
            tp.push(Movement::linear(
                ProfilePoint::new(z, outer),
                params.feed_rate,
                params.spindle_speed,
            ));
            tp.push(Movement::rapid(ProfilePoint::new(z + params.clearance, outer)));
        }
    }
}
