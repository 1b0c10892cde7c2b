use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::Profile;
use crate::part::PartShape;

/// Feature categories the detector can produce. Threads are listed for
/// completeness but never emitted automatically; they arrive through user
/// face selection in the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Hole,
    Groove,
    Chamfer,
    Thread,
}

/// A machining feature found on the part, in lathe coordinates. `axial`
/// and `radial` locate the feature's reference point (hole mouth, groove
/// bottom centre, chamfer edge).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedFeature {
    pub kind: FeatureKind,
    pub axial: f64,
    pub radial: f64,
    pub depth: f64,
    pub diameter: f64,
    pub is_internal: bool,
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}

/// Maximum axial width for a radial excursion to count as a groove.
const MAX_GROOVE_WIDTH: f64 = 10.0;

/// Slope window around 45 degrees accepted as a chamfer.
const CHAMFER_ANGLE_WINDOW: f64 = 10.0;

/// Maximum chamfer leg length.
const MAX_CHAMFER_LENGTH: f64 = 5.0;

/// Matching tolerance for dedup and 3D confirmation.
const MATCH_TOLERANCE: f64 = 0.05;

/// Detect holes, grooves and chamfers on the profile, confirming hole
/// candidates against the solid's cylindrical faces. The detector is
/// conservative: an unconfirmed or ambiguous candidate is dropped, not
/// guessed at.
pub fn detect_features(profile: &Profile, part: &dyn PartShape) -> Vec<DetectedFeature> {
    let mut features = Vec::new();

    detect_holes(profile, part, &mut features);
    detect_grooves(profile, &mut features);
    detect_chamfers(profile, &mut features);

    dedup_features(&mut features);

    debug!(count = features.len(), "feature detection complete");
    features
}

/// Holes: internal cylindrical faces from the 3D shape, cross-checked
/// against the profile (the bore wall must appear as an axial run at the
/// face radius). The face supplies the authoritative diameter.
fn detect_holes(profile: &Profile, part: &dyn PartShape, out: &mut Vec<DetectedFeature>) {
    for face in part.cylindrical_faces() {
        if !face.is_internal || face.radius <= 0.0 {
            continue;
        }

        let confirmed = profile.segments().iter().any(|seg| {
            seg.is_axial(MATCH_TOLERANCE) && (seg.start.radial - face.radius).abs() < MATCH_TOLERANCE
        });
        if !confirmed {
            continue;
        }

        out.push(DetectedFeature {
            kind: FeatureKind::Hole,
            axial: face.axial_max,
            radial: face.radius,
            depth: face.axial_span(),
            diameter: face.radius * 2.0,
            is_internal: true,
            extra: BTreeMap::new(),
        });
    }
}

/// Grooves: a radial dip bounded by two axial runs at a common shoulder
/// radius, narrower than `MAX_GROOVE_WIDTH`. A dip below the shoulder is
/// an external groove; a rise above a bore wall is an internal one.
fn detect_grooves(profile: &Profile, out: &mut Vec<DetectedFeature>) {
    let segs = profile.segments();
    for i in 0..segs.len() {
        // Pattern: axial run / radial step / axial bottom / radial step
        // back / axial run.
        if i + 4 >= segs.len() {
            break;
        }
        let before = &segs[i];
        let step_in = &segs[i + 1];
        let bottom = &segs[i + 2];
        let step_out = &segs[i + 3];
        let after = &segs[i + 4];

        let tol = MATCH_TOLERANCE;
        if !(before.is_axial(tol) && bottom.is_axial(tol) && after.is_axial(tol)) {
            continue;
        }
        if !(step_in.is_radial(tol) && step_out.is_radial(tol)) {
            continue;
        }

        let shoulder = before.end.radial;
        if (after.start.radial - shoulder).abs() > tol {
            continue;
        }

        let floor = bottom.start.radial;
        let depth = shoulder - floor;
        let width = (step_out.start.axial - step_in.end.axial).abs();
        if depth.abs() < tol || width > MAX_GROOVE_WIDTH {
            continue;
        }

        // depth > 0: dip below the shoulder (external); depth < 0: rise
        // into the wall of a bore (internal).
        let is_internal = depth < 0.0;
        out.push(DetectedFeature {
            kind: FeatureKind::Groove,
            axial: (step_in.end.axial + step_out.start.axial) / 2.0,
            radial: floor,
            depth: depth.abs(),
            diameter: floor * 2.0,
            is_internal,
            extra: BTreeMap::from([("width".into(), width)]),
        });
    }
}

/// Chamfers: a short slanted segment at ~45 degrees adjacent to at least
/// one axial run.
fn detect_chamfers(profile: &Profile, out: &mut Vec<DetectedFeature>) {
    let segs = profile.segments();
    for (i, seg) in segs.iter().enumerate() {
        let da = (seg.end.axial - seg.start.axial).abs();
        let dr = (seg.end.radial - seg.start.radial).abs();
        if da < 1e-9 || dr < 1e-9 || seg.length > MAX_CHAMFER_LENGTH {
            continue;
        }

        let angle = dr.atan2(da).to_degrees();
        if (angle - 45.0).abs() > CHAMFER_ANGLE_WINDOW {
            continue;
        }

        let prev_axial = i > 0 && segs[i - 1].is_axial(MATCH_TOLERANCE);
        let next_axial = i + 1 < segs.len() && segs[i + 1].is_axial(MATCH_TOLERANCE);
        if !prev_axial && !next_axial {
            continue;
        }

        let outer = if seg.start.radial > seg.end.radial {
            seg.start
        } else {
            seg.end
        };
        out.push(DetectedFeature {
            kind: FeatureKind::Chamfer,
            axial: outer.axial,
            radial: outer.radial,
            depth: dr,
            diameter: outer.radial * 2.0,
            is_internal: false,
            extra: BTreeMap::from([("size".into(), dr), ("angle".into(), angle)]),
        });
    }
}

/// Drop features that duplicate an earlier one of the same kind at the
/// same location.
fn dedup_features(features: &mut Vec<DetectedFeature>) {
    let mut kept: Vec<DetectedFeature> = Vec::with_capacity(features.len());
    for f in features.drain(..) {
        let duplicate = kept.iter().any(|k| {
            k.kind == f.kind
                && (k.axial - f.axial).abs() < MATCH_TOLERANCE
                && (k.radial - f.radial).abs() < MATCH_TOLERANCE
        });
        if !duplicate {
            kept.push(f);
        }
    }
    *features = kept;
}
