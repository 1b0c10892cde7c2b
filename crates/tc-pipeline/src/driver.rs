use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use tc_cam::cancel::CancelToken;
use tc_cam::ops::{
    ChamferingParams, DrillingParams, FacingParams, FinishingParams, FinishingStrategy,
    GroovingParams, InternalFinishingParams, InternalRoughingParams, PartingParams,
    ExternalRoughingParams, ThreadingParams, plan_chamfering, plan_drilling,
    plan_external_finishing, plan_external_roughing, plan_facing, plan_grooving,
    plan_internal_finishing, plan_internal_roughing, plan_parting, plan_threading,
};
use tc_cam::toolpath::{ToolRef, Toolpath};
use tc_core::library::ToolLibrary;
use tc_core::tool::Tool;
use tc_profile::extract::{ExtractionParams, extract_profile};
use tc_profile::features::{DetectedFeature, FeatureKind, detect_features};
use tc_profile::part::{PartShape, TurningAxis};

use crate::error::PipelineError;
use crate::inputs::{PipelineInputs, PipelineResult};

/// Axial clearance ahead of the reference face for the first facing pass.
const FACING_APPROACH: f64 = 1.0;

/// Hard spindle cap applied to material-derived speeds.
const MAX_SPINDLE_SPEED: f64 = 3000.0;

/// Receives pipeline progress on the driver thread. Implementations must
/// not block for more than a few milliseconds.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, fraction: f64, status: &str);
}

/// No-op reporter for when progress isn't needed.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _fraction: f64, _status: &str) {}
}

/// The toolpath generation pipeline. One instance may serve many runs;
/// each run is single-threaded and snapshots its inputs.
#[derive(Debug, Default)]
pub struct Pipeline {
    cancel: CancelToken,
    running: AtomicBool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cooperative cancellation. Takes effect at the next stage
    /// boundary or between passes of a long-running operation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the canonical operation sequence over `inputs`. A cancelled run
    /// discards its partial timeline; a failed operation keeps whatever
    /// was generated before it.
    pub fn execute_pipeline(
        &self,
        inputs: &PipelineInputs,
        reporter: &dyn ProgressReporter,
    ) -> PipelineResult {
        let started = Instant::now();
        self.running.store(true, Ordering::SeqCst);

        let mut timeline = Vec::new();
        let outcome = self.run_stages(inputs, reporter, &mut timeline);

        self.running.store(false, Ordering::SeqCst);
        self.cancel.reset();

        match outcome {
            Ok(()) => {
                reporter.report(1.0, "Toolpath generation complete");
                info!(toolpaths = timeline.len(), "pipeline finished");
                PipelineResult {
                    success: true,
                    error: None,
                    error_message: None,
                    timeline,
                    duration: started.elapsed(),
                }
            }
            Err(error) => {
                if matches!(error, PipelineError::Cancelled) {
                    timeline.clear();
                }
                let message = error.to_string();
                warn!(%message, "pipeline failed");
                PipelineResult {
                    success: false,
                    error_message: Some(message),
                    error: Some(error),
                    timeline,
                    duration: started.elapsed(),
                }
            }
        }
    }

    fn run_stages(
        &self,
        inputs: &PipelineInputs,
        reporter: &dyn ProgressReporter,
        timeline: &mut Vec<Toolpath>,
    ) -> Result<(), PipelineError> {
        reporter.report(0.0, "Starting toolpath generation pipeline");
        inputs.validate()?;

        // Facing always comes first: it establishes the reference face.
        if inputs.facing {
            self.checkpoint(reporter, 0.1, "Generating facing toolpaths")?;
            timeline.push(self.facing_stage(inputs)?);
        }

        // Internal features, innermost tooling first.
        if inputs.drilling && inputs.machine_internal_features {
            self.checkpoint(reporter, 0.2, "Generating drilling toolpaths")?;
            self.drilling_stage(inputs, timeline)?;
        }
        if inputs.internal_roughing && inputs.machine_internal_features {
            self.checkpoint(reporter, 0.3, "Generating internal roughing toolpaths")?;
            self.internal_roughing_stage(inputs, timeline)?;
        }
        if inputs.internal_finishing && inputs.machine_internal_features {
            self.checkpoint(reporter, 0.4, "Generating internal finishing toolpaths")?;
            self.internal_finishing_stage(inputs, timeline)?;
        }
        if inputs.internal_grooving && inputs.machine_internal_features {
            self.checkpoint(reporter, 0.5, "Generating internal grooving toolpaths")?;
            self.grooving_stage(inputs, &inputs.internal_grooves, true, timeline)?;
        }

        // External envelope.
        if inputs.external_roughing {
            self.checkpoint(reporter, 0.6, "Generating external roughing toolpaths")?;
            timeline.push(self.external_roughing_stage(inputs)?);
        }
        if inputs.external_finishing {
            self.checkpoint(reporter, 0.7, "Generating external finishing toolpaths")?;
            self.external_finishing_stage(inputs, timeline)?;
        }
        if inputs.external_grooving {
            self.checkpoint(reporter, 0.75, "Generating external grooving toolpaths")?;
            self.grooving_stage(inputs, &inputs.external_grooves, false, timeline)?;
        }

        if inputs.chamfering {
            self.checkpoint(reporter, 0.8, "Generating chamfering toolpaths")?;
            self.chamfering_stage(inputs, timeline)?;
        }
        if inputs.threading {
            self.checkpoint(reporter, 0.85, "Generating threading toolpaths")?;
            self.threading_stage(inputs, timeline)?;
        }

        // Parting always comes last.
        if inputs.parting {
            self.checkpoint(reporter, 0.9, "Generating parting toolpaths")?;
            timeline.push(self.parting_stage(inputs)?);
        }

        Ok(())
    }

    fn checkpoint(
        &self,
        reporter: &dyn ProgressReporter,
        fraction: f64,
        status: &str,
    ) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        debug!(fraction, status, "pipeline stage");
        reporter.report(fraction, status);
        Ok(())
    }

    fn facing_stage(&self, inputs: &PipelineInputs) -> Result<Toolpath, PipelineError> {
        let tool = resolve_tool(&inputs.tools, &inputs.facing_tool, "facing_tool")?;

        // Prefer profile bounds; fall back to raw stock. Both branches
        // start the sweep from the envelope radius plus clearance.
        let (ref_z, max_radius) = if !inputs.profile.is_empty() {
            (inputs.profile.axial_max(), inputs.profile.radial_max())
        } else {
            (inputs.z0, inputs.raw_material_diameter / 2.0)
        };

        let mut params = FacingParams {
            start_z: ref_z + FACING_APPROACH,
            end_z: ref_z - inputs.facing_allowance,
            max_radius,
            min_radius: 0.0,
            depth_of_cut: inputs.effective_facing_depth(),
            ..Default::default()
        };
        if let Some(material) = &inputs.material {
            params.spindle_speed =
                material.spindle_speed_at(inputs.raw_material_diameter, MAX_SPINDLE_SPEED);
        }

        Ok(plan_facing(&params, tool)?)
    }

    fn drilling_stage(
        &self,
        inputs: &PipelineInputs,
        timeline: &mut Vec<Toolpath>,
    ) -> Result<(), PipelineError> {
        let tool = resolve_tool(&inputs.tools, &inputs.drilling_tool, "drilling_tool")?;

        for feature in &inputs.features_to_drill {
            if feature.diameter > inputs.largest_drill_size {
                warn!(
                    diameter = feature.diameter,
                    largest = inputs.largest_drill_size,
                    "hole exceeds available drills; left for boring"
                );
                continue;
            }
            let params = DrillingParams {
                hole_diameter: feature.diameter,
                hole_depth: feature.depth,
                start_z: feature.axial,
                peck_depth: (feature.depth / 3.0).min(2.0),
                ..Default::default()
            };
            timeline.push(plan_drilling(&params, tool)?);
        }
        Ok(())
    }

    fn internal_roughing_stage(
        &self,
        inputs: &PipelineInputs,
        timeline: &mut Vec<Toolpath>,
    ) -> Result<(), PipelineError> {
        let Some(bore) = inputs.features_to_drill.first() else {
            debug!("no bore feature; skipping internal roughing");
            return Ok(());
        };

        let pilot = bore.diameter.min(inputs.largest_drill_size);
        if bore.diameter / 2.0 - inputs.roughing_allowance <= pilot / 2.0 {
            debug!("pilot drill covers the bore; skipping internal roughing");
            return Ok(());
        }

        let tool = resolve_tool(
            &inputs.tools,
            &inputs.internal_roughing_tool,
            "internal_roughing_tool",
        )?;
        let params = InternalRoughingParams {
            start_diameter: pilot,
            end_diameter: bore.diameter,
            start_z: bore.axial,
            end_z: bore.axial - bore.depth,
            stock_allowance: inputs.roughing_allowance,
            ..Default::default()
        };
        timeline.push(plan_internal_roughing(&params, tool, Some(&self.cancel))?);
        Ok(())
    }

    fn internal_finishing_stage(
        &self,
        inputs: &PipelineInputs,
        timeline: &mut Vec<Toolpath>,
    ) -> Result<(), PipelineError> {
        let Some(bore) = inputs.features_to_drill.first() else {
            debug!("no bore feature; skipping internal finishing");
            return Ok(());
        };

        let tool = resolve_tool(
            &inputs.tools,
            &inputs.internal_finishing_tool,
            "internal_finishing_tool",
        )?;
        let params = InternalFinishingParams {
            bore_diameter: bore.diameter,
            start_z: bore.axial,
            end_z: bore.axial - bore.depth,
            finishing: self.finishing_params(inputs, inputs.internal_finishing_passes),
        };
        timeline.push(plan_internal_finishing(&params, tool)?);
        Ok(())
    }

    fn external_roughing_stage(&self, inputs: &PipelineInputs) -> Result<Toolpath, PipelineError> {
        let tool = resolve_tool(
            &inputs.tools,
            &inputs.external_roughing_tool,
            "external_roughing_tool",
        )?;

        let mut params = if !inputs.profile.is_empty() {
            ExternalRoughingParams {
                start_diameter: inputs.raw_material_diameter,
                end_diameter: inputs.profile.radial_min() * 2.0,
                start_z: inputs.profile.axial_max(),
                end_z: inputs.profile.axial_min(),
                follow_profile: true,
                ..Default::default()
            }
        } else {
            ExternalRoughingParams {
                start_diameter: inputs.raw_material_diameter,
                end_diameter: (inputs.raw_material_diameter - 4.0).max(0.0),
                start_z: inputs.z0,
                end_z: inputs.z0 - 20.0,
                follow_profile: false,
                ..Default::default()
            }
        };
        params.depth_of_cut = inputs.effective_roughing_depth();
        params.stock_allowance = inputs.roughing_allowance;
        if let Some(material) = &inputs.material {
            params.spindle_speed =
                material.spindle_speed_at(inputs.raw_material_diameter, MAX_SPINDLE_SPEED);
        }

        Ok(plan_external_roughing(
            &inputs.profile,
            &params,
            tool,
            Some(&self.cancel),
        )?)
    }

    fn external_finishing_stage(
        &self,
        inputs: &PipelineInputs,
        timeline: &mut Vec<Toolpath>,
    ) -> Result<(), PipelineError> {
        if inputs.profile.is_empty() {
            warn!("no profile available; skipping external finishing");
            return Ok(());
        }
        let tool = resolve_tool(
            &inputs.tools,
            &inputs.external_finishing_tool,
            "external_finishing_tool",
        )?;
        let params = self.finishing_params(inputs, inputs.external_finishing_passes);
        timeline.push(plan_external_finishing(&inputs.profile, &params, tool)?);
        Ok(())
    }

    fn finishing_params(&self, inputs: &PipelineInputs, passes: u32) -> FinishingParams {
        FinishingParams {
            stock_allowance: inputs.finishing_allowance,
            passes: passes.max(1),
            strategy: if passes <= 1 {
                FinishingStrategy::SinglePass
            } else {
                FinishingStrategy::MultiPass
            },
            ..Default::default()
        }
    }

    fn grooving_stage(
        &self,
        inputs: &PipelineInputs,
        grooves: &[DetectedFeature],
        internal: bool,
        timeline: &mut Vec<Toolpath>,
    ) -> Result<(), PipelineError> {
        if grooves.is_empty() {
            return Ok(());
        }
        let (tool_ref, field) = if internal {
            (&inputs.internal_grooving_tool, "internal_grooving_tool")
        } else {
            (&inputs.external_grooving_tool, "external_grooving_tool")
        };
        let tool = resolve_tool(&inputs.tools, tool_ref, field)?;

        for groove in grooves {
            let surface_diameter = if internal {
                (groove.radial - groove.depth) * 2.0
            } else {
                (groove.radial + groove.depth) * 2.0
            };
            let params = GroovingParams {
                surface_diameter,
                groove_axial: groove.axial,
                groove_width: groove.extra.get("width").copied().unwrap_or(3.0),
                groove_depth: groove.depth,
                tool_width: tool.diameter,
                is_internal: internal,
                ..Default::default()
            };
            timeline.push(plan_grooving(&params, tool)?);
        }
        Ok(())
    }

    fn chamfering_stage(
        &self,
        inputs: &PipelineInputs,
        timeline: &mut Vec<Toolpath>,
    ) -> Result<(), PipelineError> {
        if inputs.chamfers.is_empty() {
            return Ok(());
        }
        let tool = resolve_tool(&inputs.tools, &inputs.chamfering_tool, "chamfering_tool")?;

        for chamfer in &inputs.chamfers {
            let params = ChamferingParams {
                edge_axial: chamfer.axial,
                edge_diameter: chamfer.diameter,
                chamfer_size: chamfer.extra.get("size").copied().unwrap_or(1.0),
                chamfer_angle: chamfer.extra.get("angle").copied().unwrap_or(45.0),
                is_external: !chamfer.is_internal,
                ..Default::default()
            };
            timeline.push(plan_chamfering(&params, tool)?);
        }
        Ok(())
    }

    fn threading_stage(
        &self,
        inputs: &PipelineInputs,
        timeline: &mut Vec<Toolpath>,
    ) -> Result<(), PipelineError> {
        if inputs.threads.is_empty() {
            return Ok(());
        }
        let tool = resolve_tool(&inputs.tools, &inputs.threading_tool, "threading_tool")?;

        for thread in &inputs.threads {
            let pitch = thread.extra.get("pitch").copied().unwrap_or(1.5);
            let params = ThreadingParams {
                pitch,
                major_diameter: thread.diameter,
                thread_depth: thread.extra.get("depth").copied().unwrap_or(pitch * 0.6),
                start_z: thread.axial,
                end_z: thread.axial - thread.depth,
                passes: thread.extra.get("passes").copied().unwrap_or(3.0) as u32,
                is_internal: thread.is_internal,
                ..Default::default()
            };
            timeline.push(plan_threading(&params, tool, Some(&self.cancel))?);
        }
        Ok(())
    }

    fn parting_stage(&self, inputs: &PipelineInputs) -> Result<Toolpath, PipelineError> {
        let tool = resolve_tool(&inputs.tools, &inputs.parting_tool, "parting_tool")?;
        let params = PartingParams {
            parting_z: inputs.z0 - inputs.part_length - inputs.parting_allowance,
            max_radius: inputs.raw_material_diameter / 2.0,
            ..Default::default()
        };
        Ok(plan_parting(&params, tool)?)
    }

    /// Build pipeline inputs from a part solid: extract the profile, fill
    /// stock defaults from the part dimensions and route detected
    /// features to their operations.
    pub fn extract_inputs_from_part(
        &self,
        part: &dyn PartShape,
        axis: &TurningAxis,
    ) -> Result<PipelineInputs, PipelineError> {
        let profile = extract_profile(part, axis, &ExtractionParams::default())?;
        let part_length = profile.axial_extent();
        let max_radius = profile.radial_max();

        let raw_material_length = part_length * 1.2;
        let mut inputs = PipelineInputs {
            axis: *axis,
            raw_material_diameter: max_radius * 2.1,
            raw_material_length,
            z0: raw_material_length,
            part_length,
            facing: true,
            external_roughing: true,
            external_finishing: true,
            parting: true,
            facing_tool: ToolRef::new("turning-55"),
            drilling_tool: ToolRef::new("drill-6"),
            internal_roughing_tool: ToolRef::new("boring-10"),
            internal_finishing_tool: ToolRef::new("boring-10"),
            internal_grooving_tool: ToolRef::new("groove-2.5"),
            external_roughing_tool: ToolRef::new("turning-55"),
            external_finishing_tool: ToolRef::new("turning-55"),
            external_grooving_tool: ToolRef::new("groove-2.5"),
            chamfering_tool: ToolRef::new("turning-55"),
            threading_tool: ToolRef::new("thread-60"),
            parting_tool: ToolRef::new("parting-3"),
            tools: ToolLibrary::standard(),
            ..Default::default()
        };

        for feature in detect_features(&profile, part) {
            match feature.kind {
                FeatureKind::Hole => inputs.features_to_drill.push(feature),
                FeatureKind::Groove if feature.is_internal => {
                    inputs.internal_grooves.push(feature)
                }
                FeatureKind::Groove => inputs.external_grooves.push(feature),
                FeatureKind::Chamfer => inputs.chamfers.push(feature),
                FeatureKind::Thread => inputs.threads.push(feature),
            }
        }

        inputs.machine_internal_features = !inputs.features_to_drill.is_empty();
        inputs.drilling = inputs.machine_internal_features;
        inputs.internal_roughing = inputs.machine_internal_features;
        inputs.internal_finishing = inputs.machine_internal_features;
        inputs.internal_grooving = !inputs.internal_grooves.is_empty();
        inputs.external_grooving = !inputs.external_grooves.is_empty();
        inputs.chamfering = !inputs.chamfers.is_empty();

        info!(
            part_length,
            max_radius,
            raw_diameter = inputs.raw_material_diameter,
            holes = inputs.features_to_drill.len(),
            "extracted pipeline inputs from part"
        );

        inputs.profile = profile;
        Ok(inputs)
    }
}

fn resolve_tool<'a>(
    tools: &'a ToolLibrary,
    tool_ref: &ToolRef,
    field: &str,
) -> Result<&'a Tool, PipelineError> {
    tools.find(&tool_ref.0).ok_or_else(|| PipelineError::MissingInput {
        field: format!("{field} '{}'", tool_ref.0),
    })
}
