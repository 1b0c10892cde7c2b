use serde::{Deserialize, Serialize};

/// A point in the 2D lathe frame. `axial` is the distance along the turning
/// axis from the chuck face (positive away from the chuck), `radial` the
/// distance from the axis. Radial values are non-negative in well-formed
/// profiles and toolpaths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub axial: f64,
    pub radial: f64,
}

impl ProfilePoint {
    pub fn new(axial: f64, radial: f64) -> Self {
        Self { axial, radial }
    }

    pub fn distance_to(self, other: ProfilePoint) -> f64 {
        let da = other.axial - self.axial;
        let dr = other.radial - self.radial;
        (da * da + dr * dr).sqrt()
    }

    /// Embed into world coordinates on the XZ half-plane: the turning axis
    /// runs along world Z and the lathe half-plane is `y = 0, x >= 0`.
    pub fn to_world(self) -> Point3D {
        Point3D::new(self.radial, 0.0, self.axial)
    }

    /// Re-extract lathe coordinates from a world point. Radial is the
    /// transverse distance from the turning axis, so it is non-negative by
    /// construction and rotations about the axis are the identity here.
    pub fn from_world(p: Point3D) -> Self {
        Self {
            axial: p.z,
            radial: (p.x * p.x + p.y * p.y).sqrt(),
        }
    }
}

/// A point in world/display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn distance_to(self, other: Point3D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A direction or displacement in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalized(self) -> Vector3D {
        let len = self.length();
        if len < 1e-12 {
            return Vector3D::new(0.0, 0.0, 1.0);
        }
        Vector3D::new(self.x / len, self.y / len, self.z / len)
    }

    pub fn dot(self, other: Vector3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vector3D) -> Vector3D {
        Vector3D::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }
}

impl std::ops::Sub for Point3D {
    type Output = Vector3D;
    fn sub(self, other: Point3D) -> Vector3D {
        Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Add<Vector3D> for Point3D {
    type Output = Point3D;
    fn add(self, v: Vector3D) -> Point3D {
        Point3D::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

/// A 4x4 affine transform. The rotation/scale rows occupy slots 0..=10 in
/// row-major order and the translation column sits in slots 12..=14, so
/// `x' = d[0]x + d[1]y + d[2]z + d[12]` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix4x4 {
    pub data: [f64; 16],
}

impl Matrix4x4 {
    pub fn identity() -> Self {
        let mut data = [0.0; 16];
        data[0] = 1.0;
        data[5] = 1.0;
        data[10] = 1.0;
        data[15] = 1.0;
        Self { data }
    }

    pub fn translation(t: Vector3D) -> Self {
        let mut m = Self::identity();
        m.data[12] = t.x;
        m.data[13] = t.y;
        m.data[14] = t.z;
        m
    }

    /// Axis-angle rotation (Rodrigues). `angle` in radians; `axis` need not
    /// be normalised.
    pub fn rotation(axis: Vector3D, angle: f64) -> Self {
        let a = axis.normalized();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;

        let mut m = Self::identity();
        m.data[0] = t * a.x * a.x + c;
        m.data[1] = t * a.x * a.y - s * a.z;
        m.data[2] = t * a.x * a.z + s * a.y;
        m.data[4] = t * a.x * a.y + s * a.z;
        m.data[5] = t * a.y * a.y + c;
        m.data[6] = t * a.y * a.z - s * a.x;
        m.data[8] = t * a.x * a.z - s * a.y;
        m.data[9] = t * a.y * a.z + s * a.x;
        m.data[10] = t * a.z * a.z + c;
        m
    }

    pub fn transform_point(&self, p: Point3D) -> Point3D {
        let d = &self.data;
        Point3D::new(
            d[0] * p.x + d[1] * p.y + d[2] * p.z + d[12],
            d[4] * p.x + d[5] * p.y + d[6] * p.z + d[13],
            d[8] * p.x + d[9] * p.y + d[10] * p.z + d[14],
        )
    }

    /// Compose so that `self` is applied first, then `next`.
    pub fn then(&self, next: &Matrix4x4) -> Matrix4x4 {
        let a = &next.data;
        let b = &self.data;
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[row * 4 + k] * b[k * 4 + col];
                }
                out[row * 4 + col] = sum;
            }
        }
        // Keep the affine layout: translation lives in the last column.
        let tx = a[0] * b[12] + a[1] * b[13] + a[2] * b[14] + a[12];
        let ty = a[4] * b[12] + a[5] * b[13] + a[6] * b[14] + a[13];
        let tz = a[8] * b[12] + a[9] * b[13] + a[10] * b[14] + a[14];
        out[12] = tx;
        out[13] = ty;
        out[14] = tz;
        out[3] = 0.0;
        out[7] = 0.0;
        out[11] = 0.0;
        out[15] = 1.0;
        Matrix4x4 { data: out }
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::identity()
    }
}

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3D,
    pub max: Point3D,
}

impl BoundingBox {
    pub fn new(min: Point3D, max: Point3D) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> Vector3D {
        self.max - self.min
    }

    pub fn center(&self) -> Point3D {
        Point3D::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    pub fn contains(&self, p: Point3D) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}
