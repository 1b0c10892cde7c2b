use serde::{Deserialize, Serialize};
use tc_core::error::Error;
use tc_core::geometry::{BoundingBox, Point3D, ProfilePoint, Vector3D};

/// The workpiece rotation axis, a ray in the same frame as the part solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurningAxis {
    pub origin: Point3D,
    pub direction: Vector3D,
}

impl TurningAxis {
    pub fn new(origin: Point3D, direction: Vector3D) -> Self {
        Self {
            origin,
            direction: direction.normalized(),
        }
    }

    /// The conventional lathe axis: world Z through the origin.
    pub fn z_axis() -> Self {
        Self::new(Point3D::origin(), Vector3D::new(0.0, 0.0, 1.0))
    }

    /// Signed distance of `p` along the axis from its origin.
    pub fn axial_of(&self, p: Point3D) -> f64 {
        (p - self.origin).dot(self.direction)
    }

    /// Perpendicular distance of `p` from the axis. Always non-negative.
    pub fn radial_of(&self, p: Point3D) -> f64 {
        let v = p - self.origin;
        let along = v.dot(self.direction);
        let perp = Vector3D::new(
            v.x - along * self.direction.x,
            v.y - along * self.direction.y,
            v.z - along * self.direction.z,
        );
        perp.length()
    }

    pub fn to_profile(&self, p: Point3D) -> ProfilePoint {
        ProfilePoint::new(self.axial_of(p), self.radial_of(p))
    }
}

/// A cylindrical face of the part, as reported by the shape kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylindricalFace {
    pub radius: f64,
    pub axial_min: f64,
    pub axial_max: f64,
    pub is_internal: bool,
}

impl CylindricalFace {
    pub fn axial_span(&self) -> f64 {
        self.axial_max - self.axial_min
    }
}

/// Query surface the pipeline needs from a part solid. Hosts wrap their
/// BRep kernel behind this; `TurnedSolid` is a kernel-free implementation
/// for tests and simple revolved stock.
pub trait PartShape {
    fn bounding_box(&self) -> BoundingBox;

    fn cylindrical_faces(&self) -> Vec<CylindricalFace>;

    /// Section the solid by the half-plane containing `axis`, returning
    /// world-space polylines. Curved boundary curves must be linearised to
    /// chords within `tolerance`.
    fn half_plane_section(&self, axis: &TurningAxis, tolerance: f64) -> Vec<Vec<Point3D>>;
}

/// A solid of revolution described by its generating outline in the lathe
/// half-plane, with an optional centre bore from the front face. The
/// outline starts and ends on the axis and is stored with ascending axial
/// start. Its own turning axis is world Z through the origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnedSolid {
    outline: Vec<ProfilePoint>,
    bore: Option<Bore>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Bore {
    diameter: f64,
    depth: f64,
}

impl TurnedSolid {
    /// A plain billet: back face, cylindrical side, front face.
    pub fn cylinder(diameter: f64, length: f64) -> Self {
        let r = diameter / 2.0;
        Self {
            outline: vec![
                ProfilePoint::new(0.0, 0.0),
                ProfilePoint::new(0.0, r),
                ProfilePoint::new(length, r),
                ProfilePoint::new(length, 0.0),
            ],
            bore: None,
        }
    }

    pub fn from_outline(outline: Vec<ProfilePoint>) -> Result<Self, Error> {
        if outline.len() < 2 {
            return Err(Error::InvalidDimension(
                "outline needs at least two points".into(),
            ));
        }
        if outline.iter().any(|p| p.radial < 0.0) {
            return Err(Error::InvalidDimension(
                "outline radial values must be non-negative".into(),
            ));
        }
        Ok(Self { outline, bore: None })
    }

    /// Add a blind centre bore from the front face. The outline must end on
    /// the axis at the front face, which is where the bore opens.
    pub fn with_bore(mut self, diameter: f64, depth: f64) -> Result<Self, Error> {
        if diameter <= 0.0 || depth <= 0.0 {
            return Err(Error::InvalidDimension(
                "bore diameter and depth must be positive".into(),
            ));
        }
        let front = self
            .outline
            .last()
            .copied()
            .ok_or_else(|| Error::InvalidDimension("empty outline".into()))?;
        if front.radial.abs() > 1e-9 {
            return Err(Error::InvalidDimension(
                "outline must end on the axis to accept a bore".into(),
            ));
        }
        let rb = diameter / 2.0;
        // Replace the on-axis front point with the bore mouth, wall and
        // bottom.
        self.outline.pop();
        self.outline.push(ProfilePoint::new(front.axial, rb));
        self.outline.push(ProfilePoint::new(front.axial - depth, rb));
        self.outline.push(ProfilePoint::new(front.axial - depth, 0.0));
        self.bore = Some(Bore { diameter, depth });
        Ok(self)
    }

    pub fn outline(&self) -> &[ProfilePoint] {
        &self.outline
    }

    fn max_radius(&self) -> f64 {
        self.outline.iter().map(|p| p.radial).fold(0.0, f64::max)
    }
}

impl PartShape for TurnedSolid {
    fn bounding_box(&self) -> BoundingBox {
        let r = self.max_radius();
        let (mut zmin, mut zmax) = (f64::MAX, f64::MIN);
        for p in &self.outline {
            zmin = zmin.min(p.axial);
            zmax = zmax.max(p.axial);
        }
        if self.outline.is_empty() {
            return BoundingBox::new(Point3D::origin(), Point3D::origin());
        }
        BoundingBox::new(Point3D::new(-r, -r, zmin), Point3D::new(r, r, zmax))
    }

    fn cylindrical_faces(&self) -> Vec<CylindricalFace> {
        let bore_radius = self.bore.map(|b| b.diameter / 2.0);
        let mut faces = Vec::new();
        for pair in self.outline.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if (a.radial - b.radial).abs() > 1e-9 || a.radial < 1e-9 {
                continue;
            }
            let span = (b.axial - a.axial).abs();
            if span < 1e-9 {
                continue;
            }
            let is_internal = bore_radius
                .map(|rb| (a.radial - rb).abs() < 1e-9)
                .unwrap_or(false);
            faces.push(CylindricalFace {
                radius: a.radial,
                axial_min: a.axial.min(b.axial),
                axial_max: a.axial.max(b.axial),
                is_internal,
            });
        }
        faces
    }

    fn half_plane_section(&self, _axis: &TurningAxis, _tolerance: f64) -> Vec<Vec<Point3D>> {
        if self.outline.is_empty() {
            return Vec::new();
        }
        vec![self.outline.iter().map(|p| p.to_world()).collect()]
    }
}
