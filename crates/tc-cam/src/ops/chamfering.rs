use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tc_core::operation::OperationKind;
use tc_core::tool::Tool;

use crate::error::CamError;
use crate::toolpath::{Movement, ToolRef, Toolpath};

/// A single chamfer cut on an edge of the part. The edge is located by
/// its axial position and the diameter it breaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamferingParams {
    pub edge_axial: f64,
    pub edge_diameter: f64,
    pub chamfer_size: f64,
    /// Degrees from the axis, 45 for a standard chamfer.
    pub chamfer_angle: f64,
    pub is_external: bool,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub clearance: f64,
}

impl Default for ChamferingParams {
    fn default() -> Self {
        Self {
            edge_axial: 0.0,
            edge_diameter: 0.0,
            chamfer_size: 1.0,
            chamfer_angle: 45.0,
            is_external: true,
            feed_rate: 80.0,
            spindle_speed: 1000.0,
            clearance: 5.0,
        }
    }
}

impl ChamferingParams {
    fn validate(&self) -> Result<(), CamError> {
        let op = OperationKind::Chamfering;
        if self.chamfer_size <= 0.0 {
            return Err(CamError::invalid(op, "chamfer size must be positive"));
        }
        if self.chamfer_angle <= 0.0 || self.chamfer_angle >= 90.0 {
            return Err(CamError::invalid(op, "chamfer angle must lie between 0 and 90 degrees"));
        }
        if self.edge_diameter <= 0.0 {
            return Err(CamError::invalid(op, "edge diameter must be positive"));
        }
        if self.is_external && self.chamfer_size * 2.0 >= self.edge_diameter {
            return Err(CamError::invalid(op, "chamfer size exceeds the edge radius"));
        }
        Ok(())
    }

    /// Axial run of the chamfer implied by its size and angle.
    fn axial_run(&self) -> f64 {
        self.chamfer_size / self.chamfer_angle.to_radians().tan()
    }
}

/// Cut a single chamfer leg between two diameters over the axial distance
/// implied by the chamfer size and angle.
pub fn plan_chamfering(params: &ChamferingParams, tool: &Tool) -> Result<Toolpath, CamError> {
    params.validate()?;

    let op = OperationKind::Chamfering;
    let mut tp = Toolpath::new("Chamfering", op, ToolRef::new(&tool.id));

    let r = params.edge_diameter / 2.0;
    let run = params.axial_run();

    if params.is_external {
        // From the face at the reduced radius up the slope to the full
        // diameter.
        let start = ProfilePoint::new(params.edge_axial, r - params.chamfer_size);
        let end = ProfilePoint::new(params.edge_axial - run, r);
        tp.push(Movement::rapid(ProfilePoint::new(
            params.edge_axial + params.clearance,
            start.radial,
        )));
        tp.push(Movement::linear(start, params.feed_rate, params.spindle_speed));
        tp.push(Movement::linear(end, params.feed_rate, params.spindle_speed));
        tp.push(Movement::rapid(ProfilePoint::new(
            end.axial,
            r + params.clearance,
        )));
    } else {
        // Bore mouth: from the enlarged radius at the face down to the
        // bore wall.
        let start = ProfilePoint::new(params.edge_axial, r + params.chamfer_size);
        let end = ProfilePoint::new(params.edge_axial - run, r);
        tp.push(Movement::rapid(ProfilePoint::new(
            params.edge_axial + params.clearance,
            start.radial,
        )));
        tp.push(Movement::linear(start, params.feed_rate, params.spindle_speed));
        tp.push(Movement::linear(end, params.feed_rate, params.spindle_speed));
        tp.push(Movement::rapid(ProfilePoint::new(
            params.edge_axial + params.clearance,
            r,
        )));
    }

    tp.stamp(op, "Chamfering");
    Ok(tp)
}
