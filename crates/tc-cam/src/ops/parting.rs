use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tc_core::operation::OperationKind;
use tc_core::tool::Tool;

use crate::error::CamError;
use crate::toolpath::{Movement, ToolRef, Toolpath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartingStrategy {
    /// One continuous plunge to the centre.
    Straight,
    /// Progressive pecks with full retracts for chip clearing.
    Pecking,
}

/// Part-off cut: a radial plunge at the parting plane, down to the centre
/// or to a centre hole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartingParams {
    /// Axial position of the parting plane.
    pub parting_z: f64,
    /// Stock envelope radius at the parting plane.
    pub max_radius: f64,
    /// 0 to part through the centre.
    pub center_hole_diameter: f64,
    pub strategy: PartingStrategy,
    pub peck_increment: f64,
    /// Break the parted part's back edge before plunging.
    pub back_chamfer: bool,
    pub chamfer_size: f64,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub clearance: f64,
    pub retract: f64,
}

impl Default for PartingParams {
    fn default() -> Self {
        Self {
            parting_z: 0.0,
            max_radius: 0.0,
            center_hole_diameter: 0.0,
            strategy: PartingStrategy::Straight,
            peck_increment: 1.0,
            back_chamfer: false,
            chamfer_size: 0.5,
            feed_rate: 30.0,
            spindle_speed: 800.0,
            clearance: 2.0,
            retract: 5.0,
        }
    }
}

impl PartingParams {
    fn validate(&self, tool: &Tool) -> Result<(), CamError> {
        let op = OperationKind::Parting;
        if tool.diameter <= 0.0 {
            return Err(CamError::invalid(op, "parting tool width must be positive"));
        }
        if self.max_radius <= 0.0 {
            return Err(CamError::invalid(op, "stock radius must be positive"));
        }
        if self.center_hole_diameter < 0.0 {
            return Err(CamError::invalid(op, "centre hole diameter must be non-negative"));
        }
        if self.center_hole_diameter / 2.0 >= self.max_radius {
            return Err(CamError::invalid(op, "centre hole swallows the whole cut"));
        }
        if self.strategy == PartingStrategy::Pecking && self.peck_increment <= 0.0 {
            return Err(CamError::invalid(op, "peck increment must be positive"));
        }
        Ok(())
    }
}

pub fn plan_parting(params: &PartingParams, tool: &Tool) -> Result<Toolpath, CamError> {
    params.validate(tool)?;

    let op = OperationKind::Parting;
    let mut tp = Toolpath::new("Parting", op, ToolRef::new(&tool.id));

    let approach_r = params.max_radius + params.clearance;
    let center_r = params.center_hole_diameter / 2.0;

    // Axial positioning to the parting plane comes first; the plunge
    // starts only once the blade sits over the cut line.
    tp.push(Movement::rapid(ProfilePoint::new(params.parting_z, approach_r)));

    if params.back_chamfer && params.chamfer_size > 0.0 {
        let c = params.chamfer_size;
        tp.push(Movement::linear(
            ProfilePoint::new(params.parting_z + c, params.max_radius),
            params.feed_rate,
            params.spindle_speed,
        ));
        tp.push(Movement::linear(
            ProfilePoint::new(params.parting_z, params.max_radius - c),
            params.feed_rate,
            params.spindle_speed,
        ));
        tp.push(Movement::rapid(ProfilePoint::new(params.parting_z, approach_r)));
    }

    match params.strategy {
        PartingStrategy::Straight => {
            tp.push(Movement::linear(
                ProfilePoint::new(params.parting_z, center_r),
                params.feed_rate,
                params.spindle_speed,
            ));
        }
        PartingStrategy::Pecking => {
            let mut r = params.max_radius;
            while r > center_r + 1e-9 {
                r = (r - params.peck_increment).max(center_r);
                tp.push(Movement::linear(
                    ProfilePoint::new(params.parting_z, r),
                    params.feed_rate,
                    params.spindle_speed,
                ));
                if r > center_r + 1e-9 {
                    tp.push(Movement::rapid(ProfilePoint::new(params.parting_z, approach_r)));
                }
            }
        }
    }

    tp.push(Movement::rapid(ProfilePoint::new(
        params.parting_z,
        params.max_radius + params.retract,
    )));

    tp.stamp(op, "Parting");
    Ok(tp)
}
