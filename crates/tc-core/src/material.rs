use serde::{Deserialize, Serialize};

/// A workpiece material record. The pipeline uses these values to fill in
/// operation defaults the caller left unset; it never writes them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: String,

    /// Recommended cutting speed in m/min.
    pub recommended_surface_speed: f64,

    /// Recommended feed in mm/rev.
    pub recommended_feed_rate: f64,

    /// Maximum depth of cut in mm for roughing passes.
    pub max_depth_of_cut: f64,

    /// Relative machinability, 1.0 = free-machining reference.
    pub machinability_rating: f64,
}

impl Material {
    pub fn mild_steel() -> Self {
        Self {
            id: "steel-1045".into(),
            recommended_surface_speed: 200.0,
            recommended_feed_rate: 0.15,
            max_depth_of_cut: 2.5,
            machinability_rating: 0.6,
        }
    }

    pub fn aluminium_6061() -> Self {
        Self {
            id: "aluminium-6061".into(),
            recommended_surface_speed: 400.0,
            recommended_feed_rate: 0.2,
            max_depth_of_cut: 4.0,
            machinability_rating: 0.9,
        }
    }

    pub fn brass_360() -> Self {
        Self {
            id: "brass-360".into(),
            recommended_surface_speed: 350.0,
            recommended_feed_rate: 0.18,
            max_depth_of_cut: 3.0,
            machinability_rating: 1.0,
        }
    }

    /// Spindle speed in RPM delivering the recommended surface speed at a
    /// given workpiece diameter, capped at `max_spindle_speed`.
    pub fn spindle_speed_at(&self, diameter: f64, max_spindle_speed: f64) -> f64 {
        if diameter <= 0.0 {
            return max_spindle_speed;
        }
        let rpm = self.recommended_surface_speed * 1000.0 / (std::f64::consts::PI * diameter);
        rpm.min(max_spindle_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spindle_speed_at_diameter() {
        let mat = Material::mild_steel();
        // 200 m/min at 20mm: 200000 / (pi * 20) ~= 3183 RPM
        let rpm = mat.spindle_speed_at(20.0, 5000.0);
        assert!((rpm - 3183.098).abs() < 0.01);
    }

    #[test]
    fn test_spindle_speed_capped() {
        let mat = Material::aluminium_6061();
        let rpm = mat.spindle_speed_at(5.0, 3000.0);
        assert!((rpm - 3000.0).abs() < 1e-10);
    }

    #[test]
    fn test_spindle_speed_zero_diameter_uses_cap() {
        let mat = Material::brass_360();
        assert!((mat.spindle_speed_at(0.0, 2500.0) - 2500.0).abs() < 1e-10);
    }

    #[test]
    fn test_material_serde_round_trip() {
        let mat = Material::aluminium_6061();
        let json = serde_json::to_string(&mat).unwrap();
        let back: Material = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "aluminium-6061");
        assert!((back.machinability_rating - 0.9).abs() < 1e-10);
    }
}
