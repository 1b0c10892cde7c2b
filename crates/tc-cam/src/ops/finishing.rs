use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tc_core::operation::OperationKind;
use tc_core::tool::Tool;
use tc_profile::extract::Profile;

use crate::error::CamError;
use crate::toolpath::{Movement, ToolRef, Toolpath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishingStrategy {
    SinglePass,
    MultiPass,
    /// Multi-pass plus a repeat of the final pass at reduced feed.
    SpringPass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishingParams {
    /// Material left on the surface after this operation.
    pub stock_allowance: f64,
    pub passes: u32,
    pub strategy: FinishingStrategy,
    pub feed_rate: f64,
    pub spring_pass_feed_rate: f64,
    /// m/min, used for constant-surface-speed spindle control.
    pub surface_speed: f64,
    pub max_spindle_speed: f64,
    pub constant_surface_speed: bool,
    pub profile_tolerance: f64,
    pub clearance: f64,
}

impl Default for FinishingParams {
    fn default() -> Self {
        Self {
            stock_allowance: 0.05,
            passes: 2,
            strategy: FinishingStrategy::MultiPass,
            feed_rate: 80.0,
            spring_pass_feed_rate: 50.0,
            surface_speed: 200.0,
            max_spindle_speed: 1500.0,
            constant_surface_speed: true,
            profile_tolerance: 0.002,
            clearance: 2.0,
        }
    }
}

impl FinishingParams {
    fn validate(&self, op: OperationKind) -> Result<(), CamError> {
        if self.passes == 0 {
            return Err(CamError::invalid(op, "at least one pass is required"));
        }
        if self.stock_allowance < 0.0 {
            return Err(CamError::invalid(op, "stock allowance must be non-negative"));
        }
        if self.feed_rate <= 0.0 {
            return Err(CamError::invalid(op, "feed rate must be positive"));
        }
        Ok(())
    }

    fn pass_offsets(&self) -> Vec<(f64, f64)> {
        // (radial offset, feed) per pass, ending at the stock allowance.
        match self.strategy {
            FinishingStrategy::SinglePass => vec![(self.stock_allowance, self.feed_rate)],
            FinishingStrategy::MultiPass | FinishingStrategy::SpringPass => {
                let n = self.passes.max(1);
                let mut offsets: Vec<(f64, f64)> = (0..n)
                    .map(|i| (self.stock_allowance * (n - i) as f64, self.feed_rate))
                    .collect();
                if self.strategy == FinishingStrategy::SpringPass {
                    offsets.push((self.stock_allowance, self.spring_pass_feed_rate));
                }
                offsets
            }
        }
    }

    fn spindle_at(&self, radius: f64) -> f64 {
        if !self.constant_surface_speed || radius <= 0.0 {
            return self.max_spindle_speed;
        }
        let rpm = self.surface_speed * 1000.0 / (std::f64::consts::PI * 2.0 * radius);
        rpm.min(self.max_spindle_speed)
    }
}

/// Finish the external envelope of the profile at the configured stock
/// allowance. The path follows the turnable surface from the front face
/// toward the chuck; the end faces themselves belong to facing and
/// parting.
pub fn plan_external_finishing(
    profile: &Profile,
    params: &FinishingParams,
    tool: &Tool,
) -> Result<Toolpath, CamError> {
    let op = OperationKind::ExternalFinishing;
    params.validate(op)?;
    if profile.is_empty() {
        return Err(CamError::invalid(op, "finishing requires an extracted profile"));
    }

    let path = external_envelope_path(profile, params.profile_tolerance);
    if path.len() < 2 {
        return Err(CamError::invalid(op, "profile has no turnable surface"));
    }

    let mut tp = Toolpath::new(
        "External Finishing",
        op,
        ToolRef::new(&tool.id),
    );

    let retract_r = profile.radial_max() + params.clearance;

    for (offset, feed) in params.pass_offsets() {
        let first = path[0];
        tp.push(Movement::rapid(ProfilePoint::new(
            first.axial + params.clearance,
            first.radial + offset,
        )));
        for p in &path {
            let radius = p.radial + offset;
            tp.push(Movement::linear(
                ProfilePoint::new(p.axial, radius),
                feed,
                params.spindle_at(radius),
            ));
        }
        let last = path[path.len() - 1];
        tp.push(Movement::rapid(ProfilePoint::new(last.axial, retract_r + offset)));
    }

    tp.stamp(op, "External Finishing");
    Ok(tp)
}

/// The turnable external surface: profile points walked front-to-back,
/// skipping the end-face segments at the axial extremes. The walk stops
/// at the front face so bore geometry behind it is never traced.
fn external_envelope_path(profile: &Profile, tolerance: f64) -> Vec<ProfilePoint> {
    let segs = profile.segments();
    let tol = tolerance.max(1e-9);

    let mut kept: Vec<ProfilePoint> = Vec::new();
    for seg in segs {
        // End faces sit at the axial extremes and run purely radially.
        let at_back = seg.is_radial(tol) && (seg.start.axial - profile.axial_min()).abs() < tol;
        let at_front = seg.is_radial(tol) && (seg.start.axial - profile.axial_max()).abs() < tol;
        if at_back {
            continue;
        }
        if at_front {
            break;
        }
        if kept.is_empty() {
            kept.push(seg.start);
        }
        kept.push(seg.end);
    }

    kept.reverse();
    kept
}

/// Internal finishing of a bore wall. The bore is described directly by
/// its target geometry rather than the external profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalFinishingParams {
    pub bore_diameter: f64,
    pub start_z: f64,
    pub end_z: f64,
    pub finishing: FinishingParams,
}

impl Default for InternalFinishingParams {
    fn default() -> Self {
        Self {
            bore_diameter: 0.0,
            start_z: 0.0,
            end_z: 0.0,
            finishing: FinishingParams::default(),
        }
    }
}

pub fn plan_internal_finishing(
    params: &InternalFinishingParams,
    tool: &Tool,
) -> Result<Toolpath, CamError> {
    let op = OperationKind::InternalFinishing;
    params.finishing.validate(op)?;
    if params.bore_diameter <= 0.0 {
        return Err(CamError::invalid(op, "bore diameter must be positive"));
    }
    if params.start_z <= params.end_z {
        return Err(CamError::invalid(op, "start Z must lie ahead of end Z"));
    }

    let bore_r = params.bore_diameter / 2.0;
    let fin = &params.finishing;

    let mut tp = Toolpath::new("Internal Finishing", op, ToolRef::new(&tool.id));
    let approach_z = params.start_z + fin.clearance;

    for (offset, feed) in fin.pass_offsets() {
        // Inside a bore the allowance is left on the wall, so the pass
        // radius sits below the target radius.
        let radius = (bore_r - offset).max(0.0);
        tp.push(Movement::rapid(ProfilePoint::new(approach_z, radius)));
        tp.push(Movement::linear(
            ProfilePoint::new(params.end_z, radius),
            feed,
            fin.spindle_at(radius),
        ));
        let pullback = (radius - fin.clearance).max(0.0);
        tp.push(Movement::rapid(ProfilePoint::new(params.end_z, pullback)));
        tp.push(Movement::rapid(ProfilePoint::new(approach_z, pullback)));
    }

    tp.stamp(op, "Internal Finishing");
    Ok(tp)
}
