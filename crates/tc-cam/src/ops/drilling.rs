use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tc_core::operation::OperationKind;
use tc_core::tool::Tool;

use crate::error::CamError;
use crate::toolpath::{Movement, ToolRef, Toolpath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillingStrategy {
    /// Single plunge to depth.
    Simple,
    /// Peck with retract to the retract height for chip clearing.
    Peck,
    /// Peck with full retract to the safety height every peck.
    DeepHole,
    /// Short chip-break retracts without leaving the hole.
    HighSpeed,
}

/// On-axis drilling along the turning axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillingParams {
    pub hole_diameter: f64,
    pub hole_depth: f64,
    /// Workpiece surface position where the hole starts.
    pub start_z: f64,
    pub peck_depth: f64,
    pub retract_height: f64,
    pub safety_height: f64,
    /// Seconds of dwell at full depth; 0 disables.
    pub dwell_time: f64,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub strategy: DrillingStrategy,
    pub chip_breaking: bool,
}

impl Default for DrillingParams {
    fn default() -> Self {
        Self {
            hole_diameter: 6.0,
            hole_depth: 0.0,
            start_z: 0.0,
            peck_depth: 2.0,
            retract_height: 1.0,
            safety_height: 5.0,
            dwell_time: 0.2,
            feed_rate: 80.0,
            spindle_speed: 1200.0,
            strategy: DrillingStrategy::Peck,
            chip_breaking: true,
        }
    }
}

impl DrillingParams {
    fn validate(&self) -> Result<(), CamError> {
        let op = OperationKind::Drilling;
        if self.hole_diameter <= 0.0 {
            return Err(CamError::invalid(op, "hole diameter must be positive"));
        }
        if self.hole_depth <= 0.0 {
            return Err(CamError::invalid(op, "hole depth must be positive"));
        }
        if matches!(
            self.strategy,
            DrillingStrategy::Peck | DrillingStrategy::DeepHole | DrillingStrategy::HighSpeed
        ) && self.peck_depth <= 0.0
        {
            return Err(CamError::invalid(op, "peck depth must be positive"));
        }
        Ok(())
    }
}

/// Drill a hole whose axis coincides with the turning axis. All moves sit
/// at radial 0.
pub fn plan_drilling(params: &DrillingParams, tool: &Tool) -> Result<Toolpath, CamError> {
    params.validate()?;

    let op = OperationKind::Drilling;
    let mut tp = Toolpath::new("Drilling", op, ToolRef::new(&tool.id));

    let safe = ProfilePoint::new(params.start_z + params.safety_height, 0.0);
    let bottom = params.start_z - params.hole_depth;

    tp.push(Movement::rapid(safe));

    match params.strategy {
        DrillingStrategy::Simple => {
            tp.push(Movement::linear(
                ProfilePoint::new(bottom, 0.0),
                params.feed_rate,
                params.spindle_speed,
            ));
        }
        DrillingStrategy::Peck | DrillingStrategy::DeepHole | DrillingStrategy::HighSpeed => {
            let mut depth = 0.0;
            while depth < params.hole_depth - 1e-9 {
                depth = (depth + params.peck_depth).min(params.hole_depth);
                let z = params.start_z - depth;
                tp.push(Movement::linear(
                    ProfilePoint::new(z, 0.0),
                    params.feed_rate,
                    params.spindle_speed,
                ));
                if depth < params.hole_depth - 1e-9 {
                    let retract_z = match params.strategy {
                        DrillingStrategy::DeepHole => params.start_z + params.safety_height,
                        DrillingStrategy::HighSpeed => z + params.retract_height,
                        // Without chip breaking, pecks pull clear of the
                        // hole instead of hovering at the retract height.
                        _ if !params.chip_breaking => params.start_z + params.safety_height,
                        _ => params.start_z + params.retract_height,
                    };
                    tp.push(Movement::rapid(ProfilePoint::new(retract_z, 0.0)));
                }
            }
        }
    }

    if params.dwell_time > 0.0 {
        tp.push(
            Movement::linear(
                ProfilePoint::new(bottom, 0.0),
                params.feed_rate,
                params.spindle_speed,
            )
            .with_comment(format!("dwell {:.1}s", params.dwell_time)),
        );
    }

    tp.push(Movement::rapid(safe));

    tp.stamp(op, "Center Drilling");
    Ok(tp)
}
