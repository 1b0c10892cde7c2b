use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tc_core::operation::OperationKind;
use tc_core::tool::Tool;
use tc_profile::extract::Profile;

use crate::cancel::CancelToken;
use crate::error::CamError;
use crate::toolpath::{Movement, ToolRef, Toolpath};

/// Length of cut between chip-breaking back-offs.
const CHIP_BREAK_INTERVAL: f64 = 5.0;

/// Axial back-off distance for a chip break.
const CHIP_BREAK_RETRACT: f64 = 0.3;

/// External roughing: axial sweeps at descending pass radii, following the
/// profile envelope at `stock_allowance` offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalRoughingParams {
    pub start_diameter: f64,
    pub end_diameter: f64,
    pub start_z: f64,
    pub end_z: f64,
    /// Maximum radial engagement of a single pass.
    pub depth_of_cut: f64,
    /// Radial advance between passes; capped at the depth of cut.
    pub stepover: f64,
    pub stock_allowance: f64,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub max_spindle_speed: f64,
    /// Stop each pass where the profile envelope rises above the pass
    /// radius; with this off the part is roughed as a plain cylinder.
    pub follow_profile: bool,
    pub chip_breaking: bool,
    pub clearance: f64,
}

impl Default for ExternalRoughingParams {
    fn default() -> Self {
        Self {
            start_diameter: 0.0,
            end_diameter: 0.0,
            start_z: 0.0,
            end_z: 0.0,
            depth_of_cut: 2.0,
            stepover: 1.5,
            stock_allowance: 0.5,
            feed_rate: 150.0,
            spindle_speed: 1000.0,
            max_spindle_speed: 3000.0,
            follow_profile: true,
            chip_breaking: true,
            clearance: 2.0,
        }
    }
}

impl ExternalRoughingParams {
    fn validate(&self) -> Result<(), CamError> {
        let op = OperationKind::ExternalRoughing;
        if self.start_z <= self.end_z {
            return Err(CamError::invalid(op, "start Z must lie ahead of end Z"));
        }
        if self.start_diameter <= 0.0 {
            return Err(CamError::invalid(op, "start diameter must be positive"));
        }
        if self.end_diameter < 0.0 {
            return Err(CamError::invalid(op, "end diameter must be non-negative"));
        }
        if self.depth_of_cut <= 0.0 {
            return Err(CamError::invalid(op, "depth of cut must be positive"));
        }
        if self.stepover <= 0.0 {
            return Err(CamError::invalid(op, "stepover must be positive"));
        }
        if self.stock_allowance < 0.0 {
            return Err(CamError::invalid(op, "stock allowance must be non-negative"));
        }
        Ok(())
    }
}

pub fn plan_external_roughing(
    profile: &Profile,
    params: &ExternalRoughingParams,
    tool: &Tool,
    cancel: Option<&CancelToken>,
) -> Result<Toolpath, CamError> {
    params.validate()?;

    let start_r = params.start_diameter / 2.0;
    let floor = pass_floor(profile, params);

    let mut tp = Toolpath::new(
        "External Roughing",
        OperationKind::ExternalRoughing,
        ToolRef::new(&tool.id),
    );

    let step = params.stepover.min(params.depth_of_cut);
    let mut radii = Vec::new();
    let mut r = start_r - step;
    while r > floor + 1e-9 {
        radii.push(r);
        r -= step;
    }
    radii.push(floor);

    let retract_r = start_r + params.clearance;
    let approach_z = params.start_z + params.clearance;

    for r in radii {
        if let Some(token) = cancel
            && token.is_cancelled()
        {
            return Err(CamError::Cancelled);
        }

        let z_stop = if params.follow_profile && !profile.is_empty() {
            pass_stop(profile, params, r)
        } else {
            params.end_z
        };

        tp.push(Movement::rapid(ProfilePoint::new(approach_z, r)));
        emit_cut(&mut tp, params, r, z_stop);
        tp.push(Movement::rapid(ProfilePoint::new(z_stop, retract_r)));
        tp.push(Movement::rapid(ProfilePoint::new(approach_z, retract_r)));
    }

    tp.stamp(OperationKind::ExternalRoughing, "External Roughing");
    Ok(tp)
}

/// Cut from `start_z` to `z_stop` at radius `r`, with periodic
/// chip-breaking back-offs on long cuts.
fn emit_cut(tp: &mut Toolpath, params: &ExternalRoughingParams, r: f64, z_stop: f64) {
    let speed = params.spindle_speed.min(params.max_spindle_speed);
    if params.chip_breaking {
        let mut z = params.start_z;
        while z - z_stop > CHIP_BREAK_INTERVAL {
            z -= CHIP_BREAK_INTERVAL;
            tp.push(Movement::linear(ProfilePoint::new(z, r), params.feed_rate, speed));
            tp.push(Movement::linear(
                ProfilePoint::new(z + CHIP_BREAK_RETRACT, r),
                params.feed_rate,
                speed,
            ));
        }
    }
    tp.push(Movement::linear(ProfilePoint::new(z_stop, r), params.feed_rate, speed));
}

/// Lowest radius any pass may reach: the smallest envelope radius in the
/// machined range plus the stock allowance, but never below the requested
/// end diameter.
fn pass_floor(profile: &Profile, params: &ExternalRoughingParams) -> f64 {
    let end_r = params.end_diameter / 2.0;
    if !params.follow_profile || profile.is_empty() {
        return end_r;
    }

    let mut samples: Vec<f64> = vec![params.end_z, params.start_z];
    for seg in profile.segments() {
        for a in [seg.start.axial, seg.end.axial] {
            if a >= params.end_z - 1e-9 && a <= params.start_z + 1e-9 {
                samples.push(a);
            }
        }
    }
    let min_envelope = samples
        .iter()
        .map(|&a| profile.radius_at(a))
        .filter(|&r| r > 0.0)
        .fold(f64::MAX, f64::min);
    if min_envelope == f64::MAX {
        return end_r;
    }
    (min_envelope + params.stock_allowance).max(end_r)
}

/// Where a pass at radius `r` must stop: the largest axial position at
/// which the envelope plus allowance rises above the pass radius.
fn pass_stop(profile: &Profile, params: &ExternalRoughingParams, r: f64) -> f64 {
    let mut stop = params.end_z;
    for seg in profile.segments() {
        let (a0, r0) = (seg.start.axial, seg.start.radial + params.stock_allowance);
        let (a1, r1) = (seg.end.axial, seg.end.radial + params.stock_allowance);

        let lo_a = a0.min(a1);
        let hi_a = a0.max(a1);
        if hi_a < params.end_z || lo_a > params.start_z {
            continue;
        }

        let blocking_z = if (r0 - r1).abs() < 1e-12 {
            // Constant radius: blocks along its whole span or not at all.
            (r0 > r + 1e-9).then_some(hi_a)
        } else {
            // Linear radius: the blocked sub-interval ends where the
            // segment crosses the pass radius.
            let t = (r - r0) / (r1 - r0);
            let cross_a = a0 + t * (a1 - a0);
            let blocked_at_lo = radial_at(seg, lo_a) + params.stock_allowance > r + 1e-9;
            let blocked_at_hi = radial_at(seg, hi_a) + params.stock_allowance > r + 1e-9;
            match (blocked_at_lo, blocked_at_hi) {
                (_, true) => Some(hi_a),
                (true, false) => Some(cross_a.clamp(lo_a, hi_a)),
                (false, false) => None,
            }
        };

        if let Some(z) = blocking_z {
            stop = stop.max(z.min(params.start_z));
        }
    }
    stop
}

fn radial_at(seg: &tc_profile::extract::ProfileSegment, axial: f64) -> f64 {
    let (a0, a1) = (seg.start.axial, seg.end.axial);
    if (a1 - a0).abs() < 1e-12 {
        return seg.start.radial.max(seg.end.radial);
    }
    let t = (axial - a0) / (a1 - a0);
    seg.start.radial + t * (seg.end.radial - seg.start.radial)
}

/// Internal roughing: enlarge a drilled pilot bore toward the target
/// diameter, leaving `stock_allowance` on the wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalRoughingParams {
    /// Diameter of the pre-drilled pilot bore.
    pub start_diameter: f64,
    /// Final bore diameter.
    pub end_diameter: f64,
    pub start_z: f64,
    pub end_z: f64,
    pub depth_of_cut: f64,
    /// Radial advance between passes; capped at the depth of cut.
    pub stepover: f64,
    pub stock_allowance: f64,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub chip_breaking: bool,
    pub clearance: f64,
}

impl Default for InternalRoughingParams {
    fn default() -> Self {
        Self {
            start_diameter: 0.0,
            end_diameter: 0.0,
            start_z: 0.0,
            end_z: 0.0,
            depth_of_cut: 1.0,
            stepover: 0.8,
            stock_allowance: 0.3,
            feed_rate: 120.0,
            spindle_speed: 1000.0,
            chip_breaking: true,
            clearance: 2.0,
        }
    }
}

impl InternalRoughingParams {
    fn validate(&self) -> Result<(), CamError> {
        let op = OperationKind::InternalRoughing;
        if self.start_z <= self.end_z {
            return Err(CamError::invalid(op, "start Z must lie ahead of end Z"));
        }
        if self.start_diameter <= 0.0 {
            return Err(CamError::invalid(op, "pilot diameter must be positive"));
        }
        if self.end_diameter <= self.start_diameter {
            return Err(CamError::invalid(op, "target bore must exceed the pilot"));
        }
        if self.depth_of_cut <= 0.0 {
            return Err(CamError::invalid(op, "depth of cut must be positive"));
        }
        let ceiling = self.end_diameter / 2.0 - self.stock_allowance;
        if ceiling <= self.start_diameter / 2.0 {
            return Err(CamError::invalid(
                op,
                "stock allowance leaves nothing to rough",
            ));
        }
        Ok(())
    }
}

pub fn plan_internal_roughing(
    params: &InternalRoughingParams,
    tool: &Tool,
    cancel: Option<&CancelToken>,
) -> Result<Toolpath, CamError> {
    params.validate()?;

    let pilot_r = params.start_diameter / 2.0;
    let ceiling = params.end_diameter / 2.0 - params.stock_allowance;

    let mut tp = Toolpath::new(
        "Internal Roughing",
        OperationKind::InternalRoughing,
        ToolRef::new(&tool.id),
    );

    let step = params.stepover.min(params.depth_of_cut);
    let mut radii = Vec::new();
    let mut r = pilot_r + step;
    while r < ceiling - 1e-9 {
        radii.push(r);
        r += step;
    }
    radii.push(ceiling);

    let approach_z = params.start_z + params.clearance;

    for r in radii {
        if let Some(token) = cancel
            && token.is_cancelled()
        {
            return Err(CamError::Cancelled);
        }

        tp.push(Movement::rapid(ProfilePoint::new(approach_z, r)));
        tp.push(Movement::linear(
            ProfilePoint::new(params.end_z, r),
            params.feed_rate,
            params.spindle_speed,
        ));
        // Retract into the open pilot, then back out of the bore.
        tp.push(Movement::rapid(ProfilePoint::new(params.end_z, pilot_r)));
        tp.push(Movement::rapid(ProfilePoint::new(approach_z, pilot_r)));
    }

    tp.stamp(OperationKind::InternalRoughing, "Internal Roughing");
    Ok(tp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_profile::extract::{ExtractionParams, extract_profile};
    use tc_profile::part::{TurnedSolid, TurningAxis};

    fn cylinder_profile() -> Profile {
        let part = TurnedSolid::cylinder(20.0, 50.0);
        extract_profile(&part, &TurningAxis::z_axis(), &ExtractionParams::default()).unwrap()
    }

    fn billet_params() -> ExternalRoughingParams {
        ExternalRoughingParams {
            start_diameter: 21.0,
            end_diameter: 0.0,
            start_z: 50.0,
            end_z: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_roughing_floor_respects_allowance() {
        let profile = cylinder_profile();
        let tp = plan_external_roughing(
            &profile,
            &billet_params(),
            &Tool::general_turning(),
            None,
        )
        .unwrap();

        let min_radial = tp
            .movements
            .iter()
            .map(|m| m.position.radial)
            .fold(f64::MAX, f64::min);
        assert!((min_radial - 10.5).abs() < 1e-9, "got {min_radial}");
    }

    #[test]
    fn test_roughing_stamps_movements() {
        let profile = cylinder_profile();
        let tp = plan_external_roughing(
            &profile,
            &billet_params(),
            &Tool::general_turning(),
            None,
        )
        .unwrap();
        for m in &tp.movements {
            assert_eq!(m.operation_kind, OperationKind::ExternalRoughing);
            assert_eq!(m.operation_name, "External Roughing");
        }
    }

    #[test]
    fn test_stepped_shaft_pass_stops_at_shoulder() {
        // 30mm long: 20mm diameter up to z=15, then 12mm diameter to the
        // front. A pass below radius 10 must stop at the z=15 shoulder.
        let part = TurnedSolid::from_outline(vec![
            ProfilePoint::new(0.0, 0.0),
            ProfilePoint::new(0.0, 10.0),
            ProfilePoint::new(15.0, 10.0),
            ProfilePoint::new(15.0, 6.0),
            ProfilePoint::new(30.0, 6.0),
            ProfilePoint::new(30.0, 0.0),
        ])
        .unwrap();
        let profile =
            extract_profile(&part, &TurningAxis::z_axis(), &ExtractionParams::default()).unwrap();

        let params = ExternalRoughingParams {
            start_diameter: 22.0,
            end_diameter: 0.0,
            start_z: 30.0,
            end_z: 0.0,
            depth_of_cut: 2.0,
            chip_breaking: false,
            ..Default::default()
        };
        let tp =
            plan_external_roughing(&profile, &params, &Tool::general_turning(), None).unwrap();

        // Cuts below the shoulder radius must not go past z=15.
        for pair in tp.movements.windows(2) {
            let m = &pair[1];
            if m.is_cutting() && m.position.radial < 10.0 + params.stock_allowance - 1e-9 {
                assert!(
                    m.position.axial >= 15.0 - 1e-9,
                    "pass at r={} cut to z={}",
                    m.position.radial,
                    m.position.axial
                );
            }
        }

        // The deepest pass still reaches the small-diameter floor.
        let min_radial = tp
            .movements
            .iter()
            .map(|m| m.position.radial)
            .fold(f64::MAX, f64::min);
        assert!((min_radial - 6.5).abs() < 1e-9, "got {min_radial}");
    }

    #[test]
    fn test_chip_breaking_inserts_backoffs() {
        let profile = cylinder_profile();
        let params = ExternalRoughingParams {
            chip_breaking: true,
            ..billet_params()
        };
        let tp =
            plan_external_roughing(&profile, &params, &Tool::general_turning(), None).unwrap();

        // A 50mm cut with 5mm intervals produces several back-off moves
        // (consecutive cutting moves that step back in +z).
        let mut backoffs = 0;
        for pair in tp.movements.windows(2) {
            if pair[0].is_cutting()
                && pair[1].is_cutting()
                && pair[1].position.axial > pair[0].position.axial + 1e-9
            {
                backoffs += 1;
            }
        }
        assert!(backoffs > 0, "expected chip-breaking back-offs");
    }

    #[test]
    fn test_cancel_between_passes() {
        let profile = cylinder_profile();
        let token = CancelToken::new();
        token.cancel();
        let err = plan_external_roughing(
            &profile,
            &billet_params(),
            &Tool::general_turning(),
            Some(&token),
        )
        .unwrap_err();
        assert!(matches!(err, CamError::Cancelled));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let profile = cylinder_profile();
        let params = ExternalRoughingParams {
            start_diameter: 21.0,
            start_z: 0.0,
            end_z: 50.0, // inverted
            ..Default::default()
        };
        assert!(
            plan_external_roughing(&profile, &params, &Tool::general_turning(), None).is_err()
        );
    }

    #[test]
    fn test_internal_roughing_enlarges_pilot() {
        let params = InternalRoughingParams {
            start_diameter: 6.0,
            end_diameter: 12.0,
            start_z: 50.0,
            end_z: 35.0,
            ..Default::default()
        };
        let tp = plan_internal_roughing(&params, &Tool::boring_bar(), None).unwrap();

        let max_radial = tp
            .movements
            .iter()
            .filter(|m| m.is_cutting())
            .map(|m| m.position.radial)
            .fold(f64::MIN, f64::max);
        // 12/2 - 0.3 allowance
        assert!((max_radial - 5.7).abs() < 1e-9, "got {max_radial}");

        for m in &tp.movements {
            assert_eq!(m.operation_kind, OperationKind::InternalRoughing);
        }
    }

    #[test]
    fn test_internal_roughing_needs_room() {
        let params = InternalRoughingParams {
            start_diameter: 6.0,
            end_diameter: 6.4, // allowance eats the whole cut
            start_z: 50.0,
            end_z: 35.0,
            ..Default::default()
        };
        assert!(plan_internal_roughing(&params, &Tool::boring_bar(), None).is_err());
    }
}
