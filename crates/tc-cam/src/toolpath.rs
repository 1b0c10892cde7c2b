use serde::{Deserialize, Serialize};
use tc_core::geometry::{Matrix4x4, ProfilePoint};
use tc_core::operation::OperationKind;

/// Motion classification of a single move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Rapid,
    Linear,
    CircularCW,
    CircularCCW,
}

/// One move of a toolpath, in lathe coordinates. `arc_center` is present
/// exactly for the circular kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub kind: MovementKind,
    pub position: ProfilePoint,
    pub arc_center: Option<ProfilePoint>,
    /// Feed in mm/min for linear moves, mm/rev where an operation works in
    /// per-revolution feed (threading). Zero for rapids.
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub operation_kind: OperationKind,
    pub operation_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Movement {
    pub fn rapid(position: ProfilePoint) -> Self {
        Self {
            kind: MovementKind::Rapid,
            position,
            arc_center: None,
            feed_rate: 0.0,
            spindle_speed: 0.0,
            operation_kind: OperationKind::Unknown,
            operation_name: String::new(),
            comment: None,
        }
    }

    pub fn linear(position: ProfilePoint, feed_rate: f64, spindle_speed: f64) -> Self {
        Self {
            kind: MovementKind::Linear,
            position,
            arc_center: None,
            feed_rate,
            spindle_speed,
            operation_kind: OperationKind::Unknown,
            operation_name: String::new(),
            comment: None,
        }
    }

    pub fn arc(
        kind: MovementKind,
        position: ProfilePoint,
        center: ProfilePoint,
        feed_rate: f64,
        spindle_speed: f64,
    ) -> Self {
        debug_assert!(matches!(
            kind,
            MovementKind::CircularCW | MovementKind::CircularCCW
        ));
        Self {
            kind,
            position,
            arc_center: Some(center),
            feed_rate,
            spindle_speed,
            operation_kind: OperationKind::Unknown,
            operation_name: String::new(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_cutting(&self) -> bool {
        !matches!(self.kind, MovementKind::Rapid)
    }
}

/// Identifier of the library tool a toolpath was planned for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolRef(pub String);

impl ToolRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ToolRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A complete move sequence for one operation. Owned by the pipeline
/// timeline; display holds an immutable view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Toolpath {
    pub name: String,
    pub operation_kind: OperationKind,
    pub tool: ToolRef,
    pub movements: Vec<Movement>,
}

impl Toolpath {
    pub fn new(name: impl Into<String>, operation_kind: OperationKind, tool: ToolRef) -> Self {
        Self {
            name: name.into(),
            operation_kind,
            tool,
            movements: Vec::new(),
        }
    }

    pub fn push(&mut self, movement: Movement) {
        self.movements.push(movement);
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    /// Re-stamp the toolpath and every movement with the operation tag and
    /// a short operation name.
    pub fn stamp(&mut self, kind: OperationKind, name: &str) {
        self.operation_kind = kind;
        for m in &mut self.movements {
            m.operation_kind = kind;
            m.operation_name = name.to_string();
        }
    }

    /// Map every movement position and arc centre through a 4x4 affine.
    /// Positions are embedded on the lathe half-plane, transformed in
    /// world space and re-extracted, so radial values stay non-negative
    /// and rotations about the turning axis leave the path unchanged.
    pub fn apply_transform(&mut self, m: &Matrix4x4) {
        for movement in &mut self.movements {
            movement.position =
                ProfilePoint::from_world(m.transform_point(movement.position.to_world()));
            if let Some(center) = movement.arc_center {
                movement.arc_center =
                    Some(ProfilePoint::from_world(m.transform_point(center.to_world())));
            }
        }
    }

    pub fn total_cut_length(&self) -> f64 {
        self.path_length(true)
    }

    pub fn total_rapid_length(&self) -> f64 {
        self.path_length(false)
    }

    fn path_length(&self, cutting: bool) -> f64 {
        let mut total = 0.0;
        for pair in self.movements.windows(2) {
            if pair[1].is_cutting() == cutting {
                total += pair[0].position.distance_to(pair[1].position);
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_core::geometry::Vector3D;

    fn sample_toolpath() -> Toolpath {
        let mut tp = Toolpath::new(
            "Facing Pass",
            OperationKind::Facing,
            ToolRef::new("turning-55"),
        );
        tp.push(Movement::rapid(ProfilePoint::new(51.0, 12.0)));
        tp.push(Movement::linear(ProfilePoint::new(51.0, 0.0), 150.0, 1200.0));
        tp.push(Movement::rapid(ProfilePoint::new(52.0, 0.0)));
        tp.stamp(OperationKind::Facing, "Facing Pass");
        tp
    }

    #[test]
    fn test_stamp_marks_every_movement() {
        let tp = sample_toolpath();
        for m in &tp.movements {
            assert_eq!(m.operation_kind, OperationKind::Facing);
            assert_eq!(m.operation_name, "Facing Pass");
        }
    }

    #[test]
    fn test_cut_and_rapid_lengths() {
        let tp = sample_toolpath();
        assert!((tp.total_cut_length() - 12.0).abs() < 1e-10);
        assert!((tp.total_rapid_length() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_translation_along_axis_shifts_axial() {
        let mut tp = sample_toolpath();
        tp.apply_transform(&Matrix4x4::translation(Vector3D::new(0.0, 0.0, 5.0)));
        assert!((tp.movements[0].position.axial - 56.0).abs() < 1e-10);
        assert!((tp.movements[0].position.radial - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_rotation_about_axis_is_identity() {
        let mut tp = sample_toolpath();
        let before: Vec<ProfilePoint> = tp.movements.iter().map(|m| m.position).collect();
        tp.apply_transform(&Matrix4x4::rotation(
            Vector3D::new(0.0, 0.0, 1.0),
            std::f64::consts::PI,
        ));
        for (b, m) in before.iter().zip(&tp.movements) {
            assert!((b.axial - m.position.axial).abs() < 1e-9);
            assert!((b.radial - m.position.radial).abs() < 1e-9);
        }
    }

    #[test]
    fn test_arc_requires_center() {
        let arc = Movement::arc(
            MovementKind::CircularCW,
            ProfilePoint::new(10.0, 5.0),
            ProfilePoint::new(10.0, 4.0),
            100.0,
            800.0,
        );
        assert!(arc.arc_center.is_some());
        let linear = Movement::linear(ProfilePoint::new(0.0, 0.0), 100.0, 800.0);
        assert!(linear.arc_center.is_none());
    }

    #[test]
    fn test_toolpath_serde_round_trip() {
        let tp = sample_toolpath();
        let json = serde_json::to_string(&tp).unwrap();
        let back: Toolpath = serde_json::from_str(&json).unwrap();
        assert_eq!(back.movements.len(), 3);
        assert_eq!(back.operation_kind, OperationKind::Facing);
        assert_eq!(back.tool, ToolRef::new("turning-55"));
    }
}
