use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tc_core::operation::OperationKind;
use tc_core::tool::Tool;

use crate::error::CamError;
use crate::toolpath::{Movement, ToolRef, Toolpath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroovingStrategy {
    /// Full-depth plunge at each axial position.
    Plunge,
    /// Plunge in increments, retracting between pecks.
    Peck,
    /// Deepen all positions level by level.
    Progressive,
}

/// Plunge-cut grooving. External grooves cut inward from the surface,
/// internal grooves outward from a bore wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroovingParams {
    /// Surface the groove is sunk into: OD for external grooves, bore
    /// diameter for internal ones.
    pub surface_diameter: f64,
    /// Axial position of the groove centre.
    pub groove_axial: f64,
    pub groove_width: f64,
    pub groove_depth: f64,
    /// Cutting width of the insert.
    pub tool_width: f64,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub strategy: GroovingStrategy,
    pub peck_increment: f64,
    pub chamfer_edges: bool,
    pub edge_chamfer_size: f64,
    pub is_internal: bool,
    pub clearance: f64,
}

impl Default for GroovingParams {
    fn default() -> Self {
        Self {
            surface_diameter: 0.0,
            groove_axial: 0.0,
            groove_width: 3.0,
            groove_depth: 2.0,
            tool_width: 2.5,
            feed_rate: 40.0,
            spindle_speed: 800.0,
            strategy: GroovingStrategy::Plunge,
            peck_increment: 0.5,
            chamfer_edges: false,
            edge_chamfer_size: 0.2,
            is_internal: false,
            clearance: 2.0,
        }
    }
}

impl GroovingParams {
    fn operation(&self) -> OperationKind {
        if self.is_internal {
            OperationKind::InternalGrooving
        } else {
            OperationKind::ExternalGrooving
        }
    }

    fn validate(&self) -> Result<(), CamError> {
        let op = self.operation();
        if self.tool_width <= 0.0 {
            return Err(CamError::invalid(op, "tool width must be positive"));
        }
        if self.groove_width < self.tool_width {
            return Err(CamError::invalid(op, "groove is narrower than the tool"));
        }
        if self.groove_depth <= 0.0 {
            return Err(CamError::invalid(op, "groove depth must be positive"));
        }
        if self.surface_diameter <= 0.0 {
            return Err(CamError::invalid(op, "surface diameter must be positive"));
        }
        if !self.is_internal && self.groove_depth >= self.surface_diameter / 2.0 {
            return Err(CamError::invalid(op, "groove depth exceeds the surface radius"));
        }
        Ok(())
    }

    fn surface_radius(&self) -> f64 {
        self.surface_diameter / 2.0
    }

    fn bottom_radius(&self) -> f64 {
        if self.is_internal {
            self.surface_radius() + self.groove_depth
        } else {
            self.surface_radius() - self.groove_depth
        }
    }

    fn approach_radius(&self) -> f64 {
        if self.is_internal {
            (self.surface_radius() - self.clearance).max(0.0)
        } else {
            self.surface_radius() + self.clearance
        }
    }

    /// Axial plunge positions covering the groove width.
    fn plunge_positions(&self) -> Vec<f64> {
        let left = self.groove_axial - self.groove_width / 2.0 + self.tool_width / 2.0;
        let n = (self.groove_width / self.tool_width).ceil() as u32;
        if n <= 1 {
            return vec![self.groove_axial];
        }
        let step = (self.groove_width - self.tool_width) / (n - 1) as f64;
        (0..n).map(|i| left + step * i as f64).collect()
    }

    /// Radii from the surface toward the bottom in peck increments,
    /// ending exactly at the bottom.
    fn depth_levels(&self) -> Vec<f64> {
        let mut levels = Vec::new();
        let mut cut = self.peck_increment;
        while cut < self.groove_depth - 1e-9 {
            levels.push(self.level_at(cut));
            cut += self.peck_increment;
        }
        levels.push(self.bottom_radius());
        levels
    }

    fn level_at(&self, cut: f64) -> f64 {
        if self.is_internal {
            self.surface_radius() + cut
        } else {
            self.surface_radius() - cut
        }
    }
}

pub fn plan_grooving(params: &GroovingParams, tool: &Tool) -> Result<Toolpath, CamError> {
    params.validate()?;

    let op = params.operation();
    let mut tp = Toolpath::new(op.label(), op, ToolRef::new(&tool.id));

    let approach = params.approach_radius();
    let bottom = params.bottom_radius();
    let positions = params.plunge_positions();

    match params.strategy {
        GroovingStrategy::Plunge => {
            for &z in &positions {
                tp.push(Movement::rapid(ProfilePoint::new(z, approach)));
                tp.push(Movement::linear(
                    ProfilePoint::new(z, bottom),
                    params.feed_rate,
                    params.spindle_speed,
                ));
                tp.push(Movement::rapid(ProfilePoint::new(z, approach)));
            }
        }
        GroovingStrategy::Peck => {
            for &z in &positions {
                tp.push(Movement::rapid(ProfilePoint::new(z, approach)));
                for level in params.depth_levels() {
                    tp.push(Movement::linear(
                        ProfilePoint::new(z, level),
                        params.feed_rate,
                        params.spindle_speed,
                    ));
                    tp.push(Movement::rapid(ProfilePoint::new(z, approach)));
                }
            }
        }
        GroovingStrategy::Progressive => {
            for level in params.depth_levels() {
                for &z in &positions {
                    tp.push(Movement::rapid(ProfilePoint::new(z, approach)));
                    tp.push(Movement::linear(
                        ProfilePoint::new(z, level),
                        params.feed_rate,
                        params.spindle_speed,
                    ));
                    tp.push(Movement::rapid(ProfilePoint::new(z, approach)));
                }
            }
        }
    }

    if params.chamfer_edges {
        emit_edge_chamfers(&mut tp, params);
    }

    let name = match op {
        OperationKind::InternalGrooving => "Internal Grooving",
        _ => "External Grooving",
    };
    tp.stamp(op, name);
    Ok(tp)
}

/// Break the groove's two surface edges with small 45-degree lead cuts.
fn emit_edge_chamfers(tp: &mut Toolpath, params: &GroovingParams) {
    let c = params.edge_chamfer_size;
    if c <= 0.0 {
        return;
    }
    let surface = params.surface_radius();
    let approach = params.approach_radius();
    let into = params.level_at(c);
    let left = params.groove_axial - params.groove_width / 2.0;
    let right = params.groove_axial + params.groove_width / 2.0;

    for (edge, outside) in [(left, left - c), (right, right + c)] {
        tp.push(Movement::rapid(ProfilePoint::new(outside, approach)));
        tp.push(Movement::linear(
            ProfilePoint::new(outside, surface),
            params.feed_rate,
            params.spindle_speed,
        ));
        tp.push(Movement::linear(
            ProfilePoint::new(edge, into),
            params.feed_rate,
            params.spindle_speed,
        ));
        tp.push(Movement::rapid(ProfilePoint::new(outside, approach)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groove_tool() -> Tool {
        Tool::grooving_insert(2.5)
    }

    fn base_params() -> GroovingParams {
        GroovingParams {
            surface_diameter: 20.0,
            groove_axial: 25.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_external_groove_reaches_bottom() {
        let tp = plan_grooving(&base_params(), &groove_tool()).unwrap();
        let min_radial = tp
            .movements
            .iter()
            .filter(|m| m.is_cutting())
            .map(|m| m.position.radial)
            .fold(f64::MAX, f64::min);
        assert!((min_radial - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_wide_groove_needs_multiple_plunges() {
        let params = GroovingParams {
            groove_width: 6.0,
            ..base_params()
        };
        let positions = params.plunge_positions();
        assert_eq!(positions.len(), 3);
        // Positions span the groove width minus the tool width.
        assert!((positions[0] - 23.25).abs() < 1e-9);
        assert!((positions[2] - 26.75).abs() < 1e-9);
    }

    #[test]
    fn test_narrow_groove_single_plunge_centred() {
        let params = GroovingParams {
            groove_width: 2.5,
            ..base_params()
        };
        let positions = params.plunge_positions();
        assert_eq!(positions, vec![25.0]);
    }

    #[test]
    fn test_peck_strategy_retracts_each_level() {
        let params = GroovingParams {
            strategy: GroovingStrategy::Peck,
            groove_width: 2.5,
            ..base_params()
        };
        let tp = plan_grooving(&params, &groove_tool()).unwrap();
        // 2mm deep at 0.5 pecks: levels 0.5, 1.0, 1.5 and bottom = 4
        // plunges, each followed by a retract.
        let plunges = tp.movements.iter().filter(|m| m.is_cutting()).count();
        assert_eq!(plunges, 4);
    }

    #[test]
    fn test_internal_groove_cuts_outward() {
        let params = GroovingParams {
            is_internal: true,
            surface_diameter: 12.0,
            ..base_params()
        };
        let tp = plan_grooving(&params, &groove_tool()).unwrap();
        let max_cut = tp
            .movements
            .iter()
            .filter(|m| m.is_cutting())
            .map(|m| m.position.radial)
            .fold(f64::MIN, f64::max);
        // 6mm bore radius + 2mm depth
        assert!((max_cut - 8.0).abs() < 1e-9);
        assert_eq!(tp.operation_kind, OperationKind::InternalGrooving);
    }

    #[test]
    fn test_edge_chamfers_emitted() {
        let params = GroovingParams {
            chamfer_edges: true,
            groove_width: 2.5,
            ..base_params()
        };
        let without = plan_grooving(&GroovingParams { chamfer_edges: false, ..params.clone() }, &groove_tool())
            .unwrap();
        let with = plan_grooving(&params, &groove_tool()).unwrap();
        assert!(with.movements.len() > without.movements.len());
    }

    #[test]
    fn test_zero_tool_width_rejected() {
        let params = GroovingParams {
            tool_width: 0.0,
            ..base_params()
        };
        let err = plan_grooving(&params, &groove_tool()).unwrap_err();
        assert!(err.to_string().contains("tool width"));
    }

    #[test]
    fn test_groove_deeper_than_radius_rejected() {
        let params = GroovingParams {
            groove_depth: 11.0,
            ..base_params()
        };
        assert!(plan_grooving(&params, &groove_tool()).is_err());
    }

    #[test]
    fn test_movements_stamped() {
        let tp = plan_grooving(&base_params(), &groove_tool()).unwrap();
        for m in &tp.movements {
            assert_eq!(m.operation_kind, OperationKind::ExternalGrooving);
            assert_eq!(m.operation_name, "External Grooving");
        }
    }
}
