use std::time::Duration;

use serde::{Deserialize, Serialize};
use tc_cam::toolpath::{ToolRef, Toolpath};
use tc_core::library::ToolLibrary;
use tc_core::material::Material;
use tc_profile::extract::Profile;
use tc_profile::features::DetectedFeature;
use tc_profile::part::TurningAxis;

use crate::error::PipelineError;

/// Everything one pipeline run needs. The tool library is a snapshot
/// taken at run start; the driver never reads shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInputs {
    pub axis: TurningAxis,
    pub profile: Profile,

    pub raw_material_diameter: f64,
    pub raw_material_length: f64,
    /// Axial position of the raw stock front face; the pipeline datum.
    pub z0: f64,
    pub part_length: f64,

    pub facing_allowance: f64,
    pub facing_depth_of_cut: f64,
    pub roughing_allowance: f64,
    pub roughing_depth_of_cut: f64,
    pub finishing_allowance: f64,
    pub parting_allowance: f64,
    pub largest_drill_size: f64,

    pub machine_internal_features: bool,

    pub facing: bool,
    pub drilling: bool,
    pub internal_roughing: bool,
    pub internal_finishing: bool,
    pub internal_grooving: bool,
    pub external_roughing: bool,
    pub external_finishing: bool,
    pub external_grooving: bool,
    pub chamfering: bool,
    pub threading: bool,
    pub parting: bool,

    pub internal_finishing_passes: u32,
    pub external_finishing_passes: u32,

    pub facing_tool: ToolRef,
    pub drilling_tool: ToolRef,
    pub internal_roughing_tool: ToolRef,
    pub internal_finishing_tool: ToolRef,
    pub internal_grooving_tool: ToolRef,
    pub external_roughing_tool: ToolRef,
    pub external_finishing_tool: ToolRef,
    pub external_grooving_tool: ToolRef,
    pub chamfering_tool: ToolRef,
    pub threading_tool: ToolRef,
    pub parting_tool: ToolRef,

    pub features_to_drill: Vec<DetectedFeature>,
    pub internal_grooves: Vec<DetectedFeature>,
    pub external_grooves: Vec<DetectedFeature>,
    pub chamfers: Vec<DetectedFeature>,
    pub threads: Vec<DetectedFeature>,

    pub tools: ToolLibrary,
    pub material: Option<Material>,
}

impl Default for PipelineInputs {
    fn default() -> Self {
        Self {
            axis: TurningAxis::z_axis(),
            profile: Profile::empty(),
            raw_material_diameter: 0.0,
            raw_material_length: 0.0,
            z0: 0.0,
            part_length: 0.0,
            facing_allowance: 1.0,
            facing_depth_of_cut: 0.5,
            roughing_allowance: 0.5,
            roughing_depth_of_cut: 2.0,
            finishing_allowance: 0.05,
            parting_allowance: 1.0,
            largest_drill_size: 12.0,
            machine_internal_features: false,
            facing: false,
            drilling: false,
            internal_roughing: false,
            internal_finishing: false,
            internal_grooving: false,
            external_roughing: false,
            external_finishing: false,
            external_grooving: false,
            chamfering: false,
            threading: false,
            parting: false,
            internal_finishing_passes: 2,
            external_finishing_passes: 2,
            facing_tool: ToolRef::default(),
            drilling_tool: ToolRef::default(),
            internal_roughing_tool: ToolRef::default(),
            internal_finishing_tool: ToolRef::default(),
            internal_grooving_tool: ToolRef::default(),
            external_roughing_tool: ToolRef::default(),
            external_finishing_tool: ToolRef::default(),
            external_grooving_tool: ToolRef::default(),
            chamfering_tool: ToolRef::default(),
            threading_tool: ToolRef::default(),
            parting_tool: ToolRef::default(),
            features_to_drill: Vec::new(),
            internal_grooves: Vec::new(),
            external_grooves: Vec::new(),
            chamfers: Vec::new(),
            threads: Vec::new(),
            tools: ToolLibrary::default(),
            material: None,
        }
    }
}

impl PipelineInputs {
    /// Report the first absent required input.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.raw_material_diameter <= 0.0 {
            return Err(missing("raw_material_diameter"));
        }
        if self.raw_material_length <= 0.0 {
            return Err(missing("raw_material_length"));
        }
        if self.z0 <= 0.0 {
            return Err(missing("z0"));
        }

        let tool_checks: [(bool, &ToolRef, &str); 11] = [
            (self.facing, &self.facing_tool, "facing_tool"),
            (self.drilling, &self.drilling_tool, "drilling_tool"),
            (self.internal_roughing, &self.internal_roughing_tool, "internal_roughing_tool"),
            (self.internal_finishing, &self.internal_finishing_tool, "internal_finishing_tool"),
            (self.internal_grooving, &self.internal_grooving_tool, "internal_grooving_tool"),
            (self.external_roughing, &self.external_roughing_tool, "external_roughing_tool"),
            (self.external_finishing, &self.external_finishing_tool, "external_finishing_tool"),
            (self.external_grooving, &self.external_grooving_tool, "external_grooving_tool"),
            (self.chamfering, &self.chamfering_tool, "chamfering_tool"),
            (self.threading, &self.threading_tool, "threading_tool"),
            (self.parting, &self.parting_tool, "parting_tool"),
        ];
        for (enabled, tool, field) in tool_checks {
            if enabled && tool.is_empty() {
                return Err(missing(field));
            }
        }
        Ok(())
    }

    /// Facing depth of cut, falling back to the material's limit when the
    /// caller left it unset.
    pub fn effective_facing_depth(&self) -> f64 {
        if self.facing_depth_of_cut > 0.0 {
            return self.facing_depth_of_cut;
        }
        self.material
            .as_ref()
            .map(|m| m.max_depth_of_cut.min(1.0))
            .unwrap_or(0.5)
    }

    /// Roughing depth of cut, falling back to the material's limit.
    pub fn effective_roughing_depth(&self) -> f64 {
        if self.roughing_depth_of_cut > 0.0 {
            return self.roughing_depth_of_cut;
        }
        self.material.as_ref().map(|m| m.max_depth_of_cut).unwrap_or(2.0)
    }
}

fn missing(field: &str) -> PipelineError {
    PipelineError::MissingInput { field: field.into() }
}

/// Outcome of one `execute_pipeline` call. Created per call, never
/// mutated after return; the timeline owns its toolpaths.
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub success: bool,
    pub error: Option<PipelineError>,
    /// Human-readable message for the UI on failure.
    pub error_message: Option<String>,
    pub timeline: Vec<Toolpath>,
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_inputs() -> PipelineInputs {
        PipelineInputs {
            raw_material_diameter: 21.0,
            raw_material_length: 60.0,
            z0: 60.0,
            part_length: 50.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_requires_stock() {
        let inputs = PipelineInputs::default();
        let err = inputs.validate().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingInput { ref field } if field == "raw_material_diameter"
        ));
    }

    #[test]
    fn test_validate_requires_tool_for_enabled_operation() {
        let inputs = PipelineInputs {
            facing: true,
            ..stock_inputs()
        };
        let err = inputs.validate().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingInput { ref field } if field == "facing_tool"
        ));
    }

    #[test]
    fn test_validate_passes_with_tool_assigned() {
        let inputs = PipelineInputs {
            facing: true,
            facing_tool: ToolRef::new("turning-55"),
            ..stock_inputs()
        };
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn test_disabled_operation_needs_no_tool() {
        let inputs = stock_inputs();
        assert!(inputs.validate().is_ok());
    }

    #[test]
    fn test_effective_depths_fall_back_to_material() {
        let inputs = PipelineInputs {
            facing_depth_of_cut: 0.0,
            roughing_depth_of_cut: 0.0,
            material: Some(Material::aluminium_6061()),
            ..stock_inputs()
        };
        assert!((inputs.effective_roughing_depth() - 4.0).abs() < 1e-12);
        assert!((inputs.effective_facing_depth() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_effective_depths_prefer_explicit_values() {
        let inputs = stock_inputs();
        assert!((inputs.effective_facing_depth() - 0.5).abs() < 1e-12);
        assert!((inputs.effective_roughing_depth() - 2.0).abs() < 1e-12);
    }
}
