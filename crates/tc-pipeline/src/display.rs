use std::time::Duration;

use serde::{Deserialize, Serialize};
use tc_cam::toolpath::{MovementKind, Toolpath};
use tc_core::geometry::{Matrix4x4, Point3D};
use tc_core::operation::OperationKind;

/// How display objects colour their segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    #[default]
    OperationType,
    MovementType,
    DepthBased,
    Rainbow,
}

/// The operation colour palette. Values match the operation tile colours
/// in the host UI and are pinned by tests.
pub fn operation_color(kind: OperationKind) -> [f64; 3] {
    match kind {
        OperationKind::Facing => [0.0, 0.8, 0.2],
        OperationKind::ExternalRoughing => [0.9, 0.1, 0.1],
        OperationKind::InternalRoughing => [0.65, 0.1, 0.25],
        OperationKind::ExternalFinishing => [0.0, 0.4, 0.9],
        OperationKind::InternalFinishing => [0.0, 0.6, 0.7],
        OperationKind::Drilling => [0.9, 0.9, 0.0],
        OperationKind::ExternalGrooving => [0.9, 0.0, 0.9],
        OperationKind::InternalGrooving => [0.7, 0.0, 0.7],
        OperationKind::Chamfering => [0.0, 0.9, 0.9],
        OperationKind::Threading => [0.5, 0.0, 0.9],
        OperationKind::Parting => [1.0, 0.5, 0.0],
        OperationKind::Unknown => [0.5, 0.5, 0.5],
    }
}

/// Line width per operation kind, in viewer pixels.
pub fn operation_line_width(kind: OperationKind) -> f64 {
    match kind {
        OperationKind::Facing => 2.5,
        OperationKind::ExternalRoughing | OperationKind::InternalRoughing => 2.0,
        OperationKind::ExternalFinishing | OperationKind::InternalFinishing => 1.5,
        OperationKind::Drilling => 2.0,
        OperationKind::ExternalGrooving | OperationKind::InternalGrooving => 2.5,
        OperationKind::Chamfering => 1.5,
        OperationKind::Threading => 2.0,
        OperationKind::Parting => 3.0,
        OperationKind::Unknown => 2.0,
    }
}

/// Fallback colouring by movement kind.
pub fn movement_color(kind: MovementKind) -> [f64; 3] {
    match kind {
        MovementKind::Rapid => [0.7, 0.7, 0.7],
        MovementKind::Linear => [0.0, 0.8, 0.0],
        MovementKind::CircularCW | MovementKind::CircularCCW => [0.0, 0.0, 0.8],
    }
}

/// Blue (deep) to red (shallow) ramp over `[min, max]`.
pub fn depth_color(z: f64, min: f64, max: f64) -> [f64; 3] {
    if max <= min {
        return [0.5, 0.5, 0.5];
    }
    let normalized = ((z - min) / (max - min)).clamp(0.0, 1.0);
    [normalized, 0.0, 1.0 - normalized]
}

/// HSV rainbow over `[min, max]`, blue through red.
pub fn rainbow_color(value: f64, min: f64, max: f64) -> [f64; 3] {
    if max <= min {
        return [0.5, 0.5, 0.5];
    }
    let normalized = ((value - min) / (max - min)).clamp(0.0, 1.0);
    let hue = normalized * 240.0;

    let c = 1.0;
    let x = c * (1.0 - ((hue / 60.0).rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = if hue < 60.0 {
        (c, x, 0.0)
    } else if hue < 120.0 {
        (x, c, 0.0)
    } else if hue < 180.0 {
        (0.0, c, x)
    } else if hue < 240.0 {
        (0.0, x, c)
    } else {
        (x, 0.0, c)
    };
    [r, g, b]
}

/// Resolve a segment colour under the given scheme. `axial_range` feeds
/// the depth and rainbow ramps.
pub fn color_for(
    scheme: ColorScheme,
    operation: OperationKind,
    movement: MovementKind,
    axial: f64,
    axial_range: (f64, f64),
) -> [f64; 3] {
    match scheme {
        ColorScheme::OperationType => operation_color(operation),
        ColorScheme::MovementType => movement_color(movement),
        ColorScheme::DepthBased => depth_color(axial, axial_range.0, axial_range.1),
        ColorScheme::Rainbow => rainbow_color(axial, axial_range.0, axial_range.1),
    }
}

/// An immutable line-strip overlay for the 3D viewer. `polyline` holds
/// one vertex per movement in display coordinates; `rapid_mask[i]` marks
/// whether the segment arriving at vertex `i` is a rapid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayObject {
    pub name: String,
    pub operation_kind: OperationKind,
    pub color: [f64; 3],
    pub line_width: f64,
    pub polyline: Vec<Point3D>,
    pub rapid_mask: Vec<bool>,
}

impl DisplayObject {
    pub fn vertex_count(&self) -> usize {
        self.polyline.len()
    }
}

/// Project a timeline into viewer-frame display objects.
///
/// Each toolpath is cloned, mapped through the workpiece transform and
/// projected by the fixed lathe-to-display mapping `(axial, radial) ->
/// (x = radial, y = 0, z = axial)`. Empty toolpaths produce no object.
pub fn to_display_objects(
    timeline: &[Toolpath],
    workpiece_transform: &Matrix4x4,
) -> Vec<DisplayObject> {
    let mut objects = Vec::with_capacity(timeline.len());

    for toolpath in timeline {
        if toolpath.is_empty() {
            continue;
        }

        let mut transformed = toolpath.clone();
        transformed.apply_transform(workpiece_transform);

        let polyline: Vec<Point3D> = transformed
            .movements
            .iter()
            .map(|m| {
                let p = m.position;
                Point3D::new(p.radial, 0.0, p.axial)
            })
            .collect();
        let rapid_mask: Vec<bool> = transformed
            .movements
            .iter()
            .map(|m| m.kind == MovementKind::Rapid)
            .collect();

        objects.push(DisplayObject {
            name: transformed.name.clone(),
            operation_kind: transformed.operation_kind,
            color: operation_color(transformed.operation_kind),
            line_width: operation_line_width(transformed.operation_kind),
            polyline,
            rapid_mask,
        });
    }

    objects
}

/// Aggregate statistics over a timeline, for status displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStats {
    pub movement_count: usize,
    pub rapid_distance: f64,
    pub cut_distance: f64,
    pub estimated_duration: Duration,
}

/// Assumed rapid traverse rate for time estimates, mm/min.
const RAPID_TRAVERSE: f64 = 3000.0;

impl TimelineStats {
    pub fn compute(timeline: &[Toolpath]) -> Self {
        let mut movement_count = 0;
        let mut rapid_distance = 0.0;
        let mut cut_distance = 0.0;
        let mut feed_sum = 0.0;
        let mut feed_count = 0u32;

        for tp in timeline {
            movement_count += tp.movements.len();
            rapid_distance += tp.total_rapid_length();
            cut_distance += tp.total_cut_length();
            for m in &tp.movements {
                if m.is_cutting() && m.feed_rate > 0.0 {
                    feed_sum += m.feed_rate;
                    feed_count += 1;
                }
            }
        }

        let avg_feed = if feed_count > 0 {
            feed_sum / feed_count as f64
        } else {
            0.0
        };
        let minutes = if avg_feed > 0.0 {
            cut_distance / avg_feed + rapid_distance / RAPID_TRAVERSE
        } else {
            rapid_distance / RAPID_TRAVERSE
        };

        Self {
            movement_count,
            rapid_distance,
            cut_distance,
            estimated_duration: Duration::from_secs_f64(minutes * 60.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_cam::toolpath::{Movement, ToolRef};
    use tc_core::geometry::{ProfilePoint, Vector3D};

    fn sample_toolpath(kind: OperationKind) -> Toolpath {
        let mut tp = Toolpath::new(kind.label(), kind, ToolRef::new("turning-55"));
        tp.push(Movement::rapid(ProfilePoint::new(51.0, 12.0)));
        tp.push(Movement::linear(ProfilePoint::new(51.0, 0.0), 120.0, 1200.0));
        tp.push(Movement::linear(ProfilePoint::new(49.0, 0.0), 120.0, 1200.0));
        tp.stamp(kind, kind.label());
        tp
    }

    #[test]
    fn test_palette_exact_values() {
        assert_eq!(operation_color(OperationKind::ExternalRoughing), [0.9, 0.1, 0.1]);
        assert_eq!(operation_color(OperationKind::InternalRoughing), [0.65, 0.1, 0.25]);
        assert_eq!(operation_color(OperationKind::Facing), [0.0, 0.8, 0.2]);
        assert_eq!(operation_color(OperationKind::ExternalFinishing), [0.0, 0.4, 0.9]);
        assert_eq!(operation_color(OperationKind::Drilling), [0.9, 0.9, 0.0]);
        assert_eq!(operation_color(OperationKind::Parting), [1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_line_widths() {
        assert_eq!(operation_line_width(OperationKind::Facing), 2.5);
        assert_eq!(operation_line_width(OperationKind::Parting), 3.0);
        assert_eq!(operation_line_width(OperationKind::ExternalFinishing), 1.5);
    }

    #[test]
    fn test_projection_maps_radial_to_x_axial_to_z() {
        let timeline = vec![sample_toolpath(OperationKind::Facing)];
        let objects = to_display_objects(&timeline, &Matrix4x4::identity());
        assert_eq!(objects.len(), 1);

        let obj = &objects[0];
        assert_eq!(obj.polyline[0], Point3D::new(12.0, 0.0, 51.0));
        assert_eq!(obj.polyline[2], Point3D::new(0.0, 0.0, 49.0));
        assert_eq!(obj.rapid_mask, vec![true, false, false]);
        assert_eq!(obj.color, [0.0, 0.8, 0.2]);
    }

    #[test]
    fn test_rotation_about_axis_leaves_display_unchanged() {
        let timeline = vec![sample_toolpath(OperationKind::ExternalRoughing)];
        let identity = to_display_objects(&timeline, &Matrix4x4::identity());
        let rotated = to_display_objects(
            &timeline,
            &Matrix4x4::rotation(Vector3D::new(0.0, 0.0, 1.0), std::f64::consts::PI),
        );

        for (a, b) in identity[0].polyline.iter().zip(&rotated[0].polyline) {
            assert!((a.x - b.x).abs() < 1e-9, "X must be preserved");
            assert_eq!(b.y, 0.0, "Y must stay zero");
            assert!((a.z - b.z).abs() < 1e-9, "Z must be preserved");
        }
    }

    #[test]
    fn test_translations_commute_with_projection() {
        let timeline = vec![sample_toolpath(OperationKind::Facing)];

        // Two in-plane translations (radial -> world X, axial -> world Z).
        let t1 = Matrix4x4::translation(Vector3D::new(1.5, 0.0, -2.0));
        let t2 = Matrix4x4::translation(Vector3D::new(0.5, 0.0, 4.0));
        let combined = t1.then(&t2);

        let transformed_then_projected = to_display_objects(&timeline, &combined);
        let projected = to_display_objects(&timeline, &Matrix4x4::identity());

        for (a, b) in projected[0]
            .polyline
            .iter()
            .zip(&transformed_then_projected[0].polyline)
        {
            // Translating display geometry by the combined offset matches.
            assert!((a.x + 2.0 - b.x).abs() < 1e-9);
            assert!((a.z + 2.0 - b.z).abs() < 1e-9);
            assert_eq!(b.y, 0.0);
        }
    }

    #[test]
    fn test_display_does_not_mutate_timeline() {
        let timeline = vec![sample_toolpath(OperationKind::Facing)];
        let before = timeline[0].movements[0].position;
        let _ = to_display_objects(
            &timeline,
            &Matrix4x4::translation(Vector3D::new(0.0, 0.0, 100.0)),
        );
        assert_eq!(timeline[0].movements[0].position, before);
    }

    #[test]
    fn test_empty_toolpaths_are_skipped() {
        let timeline = vec![Toolpath::new(
            "Empty",
            OperationKind::Facing,
            ToolRef::new("turning-55"),
        )];
        let objects = to_display_objects(&timeline, &Matrix4x4::identity());
        assert!(objects.is_empty());
    }

    #[test]
    fn test_movement_fallback_colors() {
        assert_eq!(movement_color(MovementKind::Rapid), [0.7, 0.7, 0.7]);
        assert_eq!(movement_color(MovementKind::Linear), [0.0, 0.8, 0.0]);
        assert_eq!(movement_color(MovementKind::CircularCW), [0.0, 0.0, 0.8]);
    }

    #[test]
    fn test_depth_color_endpoints() {
        assert_eq!(depth_color(0.0, 0.0, 10.0), [0.0, 0.0, 1.0]);
        assert_eq!(depth_color(10.0, 0.0, 10.0), [1.0, 0.0, 0.0]);
        assert_eq!(depth_color(5.0, 5.0, 5.0), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_rainbow_color_range() {
        let low = rainbow_color(0.0, 0.0, 1.0);
        let high = rainbow_color(1.0, 0.0, 1.0);
        assert_eq!(low, [1.0, 0.0, 0.0]);
        // 240 degrees lands on blue.
        assert!((high[2] - 1.0).abs() < 1e-9);
        assert_eq!(rainbow_color(1.0, 1.0, 0.0), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_timeline_stats() {
        let timeline = vec![sample_toolpath(OperationKind::Facing)];
        let stats = TimelineStats::compute(&timeline);
        assert_eq!(stats.movement_count, 3);
        assert!((stats.cut_distance - 14.0).abs() < 1e-9);
        assert!(stats.estimated_duration > Duration::ZERO);
    }

    #[test]
    fn test_color_for_dispatches_schemes() {
        let op = OperationKind::Threading;
        assert_eq!(
            color_for(ColorScheme::OperationType, op, MovementKind::Linear, 0.0, (0.0, 1.0)),
            [0.5, 0.0, 0.9]
        );
        assert_eq!(
            color_for(ColorScheme::MovementType, op, MovementKind::Rapid, 0.0, (0.0, 1.0)),
            [0.7, 0.7, 0.7]
        );
        assert_eq!(
            color_for(ColorScheme::DepthBased, op, MovementKind::Linear, 0.0, (0.0, 10.0)),
            [0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_display_object_serde_round_trip() {
        let timeline = vec![sample_toolpath(OperationKind::Parting)];
        let objects = to_display_objects(&timeline, &Matrix4x4::identity());
        let json = serde_json::to_string(&objects).unwrap();
        let back: Vec<DisplayObject> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0].color, [1.0, 0.5, 0.0]);
        assert_eq!(back[0].vertex_count(), 3);
    }

    #[test]
    fn test_stats_empty_timeline() {
        let stats = TimelineStats::compute(&[]);
        assert_eq!(stats.movement_count, 0);
        assert_eq!(stats.estimated_duration, Duration::ZERO);
    }
}
