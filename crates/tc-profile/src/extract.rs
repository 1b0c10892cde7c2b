use serde::{Deserialize, Serialize};
use tc_core::geometry::ProfilePoint;
use tracing::debug;

use crate::error::ProfileError;
use crate::part::{PartShape, TurningAxis};

/// Tuning knobs for profile extraction. Defaults match the values the
/// pipeline has always used for STEP-loaded parts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExtractionParams {
    /// Chord deviation and stitching tolerance, mm.
    pub tolerance: f64,
    /// Segments shorter than this are merged into their successor.
    pub min_segment_length: f64,
    /// Order segments into a connected axial walk.
    pub sort_segments: bool,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            min_segment_length: 0.001,
            sort_segments: true,
        }
    }
}

/// One chord of the 2D profile. Consecutive segments share endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSegment {
    pub start: ProfilePoint,
    pub end: ProfilePoint,
    pub is_linear: bool,
    pub length: f64,
}

impl ProfileSegment {
    pub fn new(start: ProfilePoint, end: ProfilePoint) -> Self {
        Self {
            start,
            end,
            is_linear: true,
            length: start.distance_to(end),
        }
    }

    /// True when the segment runs parallel to the axis within `tol`.
    pub fn is_axial(&self, tol: f64) -> bool {
        (self.start.radial - self.end.radial).abs() <= tol
    }

    /// True when the segment runs perpendicular to the axis within `tol`.
    pub fn is_radial(&self, tol: f64) -> bool {
        (self.start.axial - self.end.axial).abs() <= tol
    }
}

/// An ordered, connected 2D profile of the part in the lathe half-plane,
/// with its exact bounding extrema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    segments: Vec<ProfileSegment>,
    axial_min: f64,
    axial_max: f64,
    radial_min: f64,
    radial_max: f64,
}

impl Profile {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a profile from ordered segments, enforcing the profile
    /// invariants: connectivity within `tolerance`, non-negative radial
    /// values, no self-intersection in the half-plane.
    pub fn from_segments(
        segments: Vec<ProfileSegment>,
        tolerance: f64,
    ) -> Result<Self, ProfileError> {
        if segments.is_empty() {
            return Ok(Self::empty());
        }

        for pair in segments.windows(2) {
            let gap = pair[0].end.distance_to(pair[1].start);
            if gap > tolerance {
                return Err(ProfileError::extraction(format!(
                    "disconnected segments: gap of {gap:.4}mm exceeds tolerance"
                )));
            }
        }

        for seg in &segments {
            if seg.start.radial < -tolerance || seg.end.radial < -tolerance {
                return Err(ProfileError::extraction(
                    "profile contains negative radial values",
                ));
            }
        }

        if let Some((i, j)) = first_self_intersection(&segments) {
            return Err(ProfileError::extraction(format!(
                "profile self-intersects (segments {i} and {j})"
            )));
        }

        let mut axial_min = f64::MAX;
        let mut axial_max = f64::MIN;
        let mut radial_min = f64::MAX;
        let mut radial_max = f64::MIN;
        for seg in &segments {
            for p in [seg.start, seg.end] {
                axial_min = axial_min.min(p.axial);
                axial_max = axial_max.max(p.axial);
                radial_min = radial_min.min(p.radial);
                radial_max = radial_max.max(p.radial);
            }
        }

        Ok(Self {
            segments,
            axial_min,
            axial_max,
            radial_min: radial_min.max(0.0),
            radial_max,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[ProfileSegment] {
        &self.segments
    }

    /// `(axial_min, axial_max, radial_min, radial_max)`, exact endpoint
    /// extrema.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.axial_min, self.axial_max, self.radial_min, self.radial_max)
    }

    pub fn axial_min(&self) -> f64 {
        self.axial_min
    }

    pub fn axial_max(&self) -> f64 {
        self.axial_max
    }

    pub fn radial_min(&self) -> f64 {
        self.radial_min
    }

    pub fn radial_max(&self) -> f64 {
        self.radial_max
    }

    pub fn axial_extent(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.axial_max - self.axial_min
        }
    }

    /// The ordered polyline: each segment start plus the final end.
    pub fn points(&self) -> Vec<ProfilePoint> {
        let mut pts: Vec<ProfilePoint> = self.segments.iter().map(|s| s.start).collect();
        if let Some(last) = self.segments.last() {
            pts.push(last.end);
        }
        pts
    }

    /// External envelope radius at `axial`: the largest radial value the
    /// profile reaches there. Returns 0 outside the profile's axial range.
    pub fn radius_at(&self, axial: f64) -> f64 {
        let mut best: f64 = 0.0;
        for seg in &self.segments {
            let (a0, a1) = (seg.start.axial, seg.end.axial);
            let lo = a0.min(a1);
            let hi = a0.max(a1);
            if axial < lo - 1e-9 || axial > hi + 1e-9 {
                continue;
            }
            if (hi - lo) < 1e-9 {
                best = best.max(seg.start.radial.max(seg.end.radial));
            } else {
                let t = (axial - a0) / (a1 - a0);
                best = best.max(seg.start.radial + t * (seg.end.radial - seg.start.radial));
            }
        }
        best
    }
}

/// Reduce a solid to its ordered 2D lathe profile.
///
/// The solid is sectioned by the half-plane containing `axis`; the
/// resulting curves are projected into `(axial, radial)`, stitched into a
/// single chain, oriented to walk in ascending axial direction (radially
/// ascending where the walk reverses axially), and cleaned of
/// sub-threshold slivers. Failure never yields a partial profile.
pub fn extract_profile(
    part: &dyn PartShape,
    axis: &TurningAxis,
    params: &ExtractionParams,
) -> Result<Profile, ProfileError> {
    let curves = part.half_plane_section(axis, params.tolerance);
    if curves.is_empty() || curves.iter().all(|c| c.len() < 2) {
        return Err(ProfileError::extraction(
            "solid has no intersection with the section half-plane",
        ));
    }

    // Project into the lathe frame, dropping degenerate duplicates.
    let mut chains: Vec<Vec<ProfilePoint>> = Vec::new();
    for curve in &curves {
        let mut chain: Vec<ProfilePoint> = Vec::with_capacity(curve.len());
        for p in curve {
            let lp = axis.to_profile(*p);
            if chain
                .last()
                .map(|prev: &ProfilePoint| prev.distance_to(lp) < 1e-9)
                .unwrap_or(false)
            {
                continue;
            }
            chain.push(lp);
        }
        if chain.len() >= 2 {
            chains.push(chain);
        }
    }
    if chains.is_empty() {
        return Err(ProfileError::extraction("section produced no usable curves"));
    }

    let mut chain = stitch_chains(chains, params.tolerance)?;
    chain.dedup_by(|a, b| a.distance_to(*b) < 1e-9);
    let chain = if params.sort_segments {
        orient_chain(chain)
    } else {
        chain
    };

    let mut segments: Vec<ProfileSegment> = chain
        .windows(2)
        .map(|w| ProfileSegment::new(w[0], w[1]))
        .collect();
    merge_short_segments(&mut segments, params.min_segment_length);

    if segments.is_empty() {
        return Err(ProfileError::extraction("profile collapsed to zero length"));
    }

    let profile = Profile::from_segments(segments, params.tolerance)?;
    debug!(
        segments = profile.segment_count(),
        axial_min = profile.axial_min(),
        axial_max = profile.axial_max(),
        radial_max = profile.radial_max(),
        "extracted profile"
    );
    Ok(profile)
}

/// Greedily connect chains whose endpoints coincide within `tolerance`.
/// Chains may be reversed to match. Fails if more than one piece remains.
fn stitch_chains(
    mut chains: Vec<Vec<ProfilePoint>>,
    tolerance: f64,
) -> Result<Vec<ProfilePoint>, ProfileError> {
    let mut current = chains.swap_remove(0);

    while !chains.is_empty() {
        // Every chain holds at least two points by construction.
        let tail = current[current.len() - 1];
        let head = current[0];

        let mut attached = false;
        for i in 0..chains.len() {
            let c_head = chains[i][0];
            let c_tail = chains[i][chains[i].len() - 1];

            if tail.distance_to(c_head) <= tolerance {
                let mut c = chains.swap_remove(i);
                current.append(&mut c);
                attached = true;
            } else if tail.distance_to(c_tail) <= tolerance {
                let mut c = chains.swap_remove(i);
                c.reverse();
                current.append(&mut c);
                attached = true;
            } else if head.distance_to(c_tail) <= tolerance {
                let mut c = chains.swap_remove(i);
                c.append(&mut current);
                current = c;
                attached = true;
            } else if head.distance_to(c_head) <= tolerance {
                let mut c = chains.swap_remove(i);
                c.reverse();
                c.append(&mut current);
                current = c;
                attached = true;
            }
            if attached {
                break;
            }
        }

        if !attached {
            return Err(ProfileError::extraction(format!(
                "disconnected section: {} piece(s) could not be stitched",
                chains.len()
            )));
        }
    }

    Ok(current)
}

/// Orient the chain so the walk starts at the lower-axial end; when both
/// ends sit at the same axial position, start from the smaller radius so
/// reversals (the front face) are walked radially ascending.
fn orient_chain(mut chain: Vec<ProfilePoint>) -> Vec<ProfilePoint> {
    let first = chain[0];
    let last = chain[chain.len() - 1];
    let same_axial = (first.axial - last.axial).abs() < 1e-12;
    let reversed = if same_axial {
        first.radial > last.radial
    } else {
        first.axial > last.axial
    };
    if reversed {
        chain.reverse();
    }
    chain
}

/// Drop segments shorter than `min_length` by folding each into its
/// successor: the successor keeps the dropped segment's start point.
fn merge_short_segments(segments: &mut Vec<ProfileSegment>, min_length: f64) {
    let mut merged: Vec<ProfileSegment> = Vec::with_capacity(segments.len());
    let mut pending_start: Option<ProfilePoint> = None;
    let mut trailing_end: Option<ProfilePoint> = None;

    for seg in segments.iter() {
        let start = pending_start.take().unwrap_or(seg.start);
        let candidate = ProfileSegment::new(start, seg.end);
        if candidate.length < min_length {
            pending_start = Some(start);
            trailing_end = Some(seg.end);
        } else {
            merged.push(candidate);
            trailing_end = None;
        }
    }

    // A trailing sliver has no successor; fold it backwards into the last
    // kept segment.
    if let (Some(end), Some(last)) = (trailing_end, merged.last_mut()) {
        *last = ProfileSegment::new(last.start, end);
    }

    *segments = merged;
}

/// Index pair of the first properly intersecting non-adjacent segments.
fn first_self_intersection(segments: &[ProfileSegment]) -> Option<(usize, usize)> {
    for i in 0..segments.len() {
        for j in (i + 2)..segments.len() {
            // The chain may legitimately close on itself at the very ends.
            if i == 0 && j == segments.len() - 1 {
                let closes = segments[j].end.distance_to(segments[i].start) < 1e-9;
                if closes {
                    continue;
                }
            }
            if segments_properly_intersect(&segments[i], &segments[j]) {
                return Some((i, j));
            }
        }
    }
    None
}

fn segments_properly_intersect(a: &ProfileSegment, b: &ProfileSegment) -> bool {
    let d1 = cross(b.start, b.end, a.start);
    let d2 = cross(b.start, b.end, a.end);
    let d3 = cross(a.start, a.end, b.start);
    let d4 = cross(a.start, a.end, b.end);

    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn cross(o: ProfilePoint, a: ProfilePoint, b: ProfilePoint) -> f64 {
    (a.axial - o.axial) * (b.radial - o.radial) - (a.radial - o.radial) * (b.axial - o.axial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::TurnedSolid;
    use tc_core::geometry::{BoundingBox, Point3D};

    fn extract_cylinder() -> Profile {
        let part = TurnedSolid::cylinder(20.0, 50.0);
        extract_profile(&part, &TurningAxis::z_axis(), &ExtractionParams::default()).unwrap()
    }

    #[test]
    fn test_cylinder_profile_bounds_are_exact() {
        let profile = extract_cylinder();
        let (zmin, zmax, rmin, rmax) = profile.bounds();
        assert_eq!(zmin, 0.0);
        assert_eq!(zmax, 50.0);
        assert_eq!(rmin, 0.0);
        assert_eq!(rmax, 10.0);
    }

    #[test]
    fn test_bounds_equal_endpoint_extrema() {
        let profile = extract_cylinder();
        let endpoints: Vec<ProfilePoint> = profile
            .segments()
            .iter()
            .flat_map(|s| [s.start, s.end])
            .collect();
        let rmin = endpoints.iter().map(|p| p.radial).fold(f64::MAX, f64::min);
        let rmax = endpoints.iter().map(|p| p.radial).fold(f64::MIN, f64::max);
        assert_eq!(profile.radial_min(), rmin);
        assert_eq!(profile.radial_max(), rmax);
    }

    #[test]
    fn test_cylinder_profile_is_connected() {
        let profile = extract_cylinder();
        for pair in profile.segments().windows(2) {
            assert!(pair[0].end.distance_to(pair[1].start) <= 0.01);
        }
    }

    #[test]
    fn test_profile_radial_non_negative() {
        let profile = extract_cylinder();
        for seg in profile.segments() {
            assert!(seg.start.radial >= 0.0);
            assert!(seg.end.radial >= 0.0);
        }
    }

    #[test]
    fn test_radius_at_envelope() {
        let profile = extract_cylinder();
        assert!((profile.radius_at(25.0) - 10.0).abs() < 1e-9);
        assert!((profile.radius_at(0.0) - 10.0).abs() < 1e-9);
        assert_eq!(profile.radius_at(60.0), 0.0);
    }

    #[test]
    fn test_bored_cylinder_profile() {
        let part = TurnedSolid::cylinder(20.0, 50.0).with_bore(8.0, 15.0).unwrap();
        let profile =
            extract_profile(&part, &TurningAxis::z_axis(), &ExtractionParams::default()).unwrap();
        let (_, _, rmin, rmax) = profile.bounds();
        assert_eq!(rmin, 0.0);
        assert_eq!(rmax, 10.0);
        // Bore wall shows up as a segment at radius 4.
        assert!(
            profile
                .segments()
                .iter()
                .any(|s| s.is_axial(1e-9) && (s.start.radial - 4.0).abs() < 1e-9)
        );
    }

    /// Section producer returning its curves in arbitrary order and
    /// orientation, to exercise stitching.
    struct ScrambledSection;

    impl PartShape for ScrambledSection {
        fn bounding_box(&self) -> BoundingBox {
            BoundingBox::new(Point3D::new(-10.0, -10.0, 0.0), Point3D::new(10.0, 10.0, 30.0))
        }

        fn cylindrical_faces(&self) -> Vec<crate::part::CylindricalFace> {
            Vec::new()
        }

        fn half_plane_section(&self, _axis: &TurningAxis, _tol: f64) -> Vec<Vec<Point3D>> {
            // Three pieces of [(0,0)-(0,10)-(30,10)-(30,0)], shuffled and
            // partially reversed.
            vec![
                vec![Point3D::new(10.0, 0.0, 30.0), Point3D::new(10.0, 0.0, 0.0)],
                vec![Point3D::new(0.0, 0.0, 30.0), Point3D::new(10.0, 0.0, 30.0)],
                vec![Point3D::new(0.0, 0.0, 0.0), Point3D::new(10.0, 0.0, 0.0)],
            ]
        }
    }

    #[test]
    fn test_stitching_scrambled_curves() {
        let profile = extract_profile(
            &ScrambledSection,
            &TurningAxis::z_axis(),
            &ExtractionParams::default(),
        )
        .unwrap();
        assert_eq!(profile.segment_count(), 3);
        let (zmin, zmax, rmin, rmax) = profile.bounds();
        assert_eq!((zmin, zmax, rmin, rmax), (0.0, 30.0, 0.0, 10.0));
        // Walk starts at the low-axial end.
        assert!(profile.segments()[0].start.axial <= profile.segments()[2].end.axial);
    }

    struct EmptySection;

    impl PartShape for EmptySection {
        fn bounding_box(&self) -> BoundingBox {
            BoundingBox::new(Point3D::origin(), Point3D::origin())
        }
        fn cylindrical_faces(&self) -> Vec<crate::part::CylindricalFace> {
            Vec::new()
        }
        fn half_plane_section(&self, _axis: &TurningAxis, _tol: f64) -> Vec<Vec<Point3D>> {
            Vec::new()
        }
    }

    #[test]
    fn test_empty_solid_fails_extraction() {
        let err = extract_profile(
            &EmptySection,
            &TurningAxis::z_axis(),
            &ExtractionParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ProfileError::Extraction { .. }));
    }

    struct DisconnectedSection;

    impl PartShape for DisconnectedSection {
        fn bounding_box(&self) -> BoundingBox {
            BoundingBox::new(Point3D::new(-10.0, -10.0, 0.0), Point3D::new(10.0, 10.0, 30.0))
        }
        fn cylindrical_faces(&self) -> Vec<crate::part::CylindricalFace> {
            Vec::new()
        }
        fn half_plane_section(&self, _axis: &TurningAxis, _tol: f64) -> Vec<Vec<Point3D>> {
            vec![
                vec![Point3D::new(0.0, 0.0, 0.0), Point3D::new(10.0, 0.0, 0.0)],
                vec![Point3D::new(10.0, 0.0, 20.0), Point3D::new(10.0, 0.0, 30.0)],
            ]
        }
    }

    #[test]
    fn test_disconnected_section_fails() {
        let err = extract_profile(
            &DisconnectedSection,
            &TurningAxis::z_axis(),
            &ExtractionParams::default(),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("stitched") || msg.contains("disconnected"), "{msg}");
    }

    #[test]
    fn test_short_segments_merged_into_successor() {
        let pts = vec![
            ProfilePoint::new(0.0, 0.0),
            ProfilePoint::new(0.0, 10.0),
            ProfilePoint::new(0.0005, 10.0), // sliver
            ProfilePoint::new(30.0, 10.0),
            ProfilePoint::new(30.0, 0.0),
        ];
        let mut segments: Vec<ProfileSegment> =
            pts.windows(2).map(|w| ProfileSegment::new(w[0], w[1])).collect();
        merge_short_segments(&mut segments, 0.001);
        assert_eq!(segments.len(), 3);
        // The sliver's start survives as the start of the merged segment.
        assert_eq!(segments[1].start, ProfilePoint::new(0.0, 10.0));
        assert_eq!(segments[1].end, ProfilePoint::new(30.0, 10.0));
    }

    #[test]
    fn test_self_intersecting_profile_rejected() {
        let segments = vec![
            ProfileSegment::new(ProfilePoint::new(0.0, 0.0), ProfilePoint::new(10.0, 10.0)),
            ProfileSegment::new(ProfilePoint::new(10.0, 10.0), ProfilePoint::new(10.0, 0.0)),
            ProfileSegment::new(ProfilePoint::new(10.0, 0.0), ProfilePoint::new(0.0, 10.0)),
        ];
        let err = Profile::from_segments(segments, 0.01).unwrap_err();
        assert!(err.to_string().contains("self-intersect"));
    }

    #[test]
    fn test_disconnected_segments_rejected() {
        let segments = vec![
            ProfileSegment::new(ProfilePoint::new(0.0, 0.0), ProfilePoint::new(10.0, 0.0)),
            ProfileSegment::new(ProfilePoint::new(20.0, 0.0), ProfilePoint::new(30.0, 0.0)),
        ];
        assert!(Profile::from_segments(segments, 0.01).is_err());
    }

    #[test]
    fn test_negative_radial_rejected() {
        let segments = vec![ProfileSegment::new(
            ProfilePoint::new(0.0, -1.0),
            ProfilePoint::new(10.0, 5.0),
        )];
        assert!(Profile::from_segments(segments, 0.01).is_err());
    }

    #[test]
    fn test_empty_profile() {
        let profile = Profile::empty();
        assert!(profile.is_empty());
        assert_eq!(profile.segment_count(), 0);
        assert_eq!(profile.axial_extent(), 0.0);
    }
}
