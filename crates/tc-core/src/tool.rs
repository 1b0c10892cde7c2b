use serde::{Deserialize, Serialize};

use crate::operation::OperationKind;

/// A lathe tool in the tool library. The pipeline consumes tool records
/// read-only; geometry fields are in millimetres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Library identifier, referenced by toolpaths.
    pub id: String,

    pub kind: ToolKind,

    /// Cutting diameter for drills, insert inscribed circle otherwise.
    pub diameter: f64,

    /// Usable cutting length.
    pub length: f64,

    /// Nose/corner radius of the insert.
    pub corner_radius: f64,

    /// Operations this tool may be assigned to.
    pub capabilities: Vec<OperationKind>,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Turning,
    Facing,
    Parting,
    Grooving,
    Threading,
    Drill,
    Boring,
}

impl Tool {
    /// A 55-degree general turning insert, usable for most external work.
    pub fn general_turning() -> Self {
        Self {
            id: "turning-55".into(),
            kind: ToolKind::Turning,
            diameter: 12.0,
            length: 25.0,
            corner_radius: 0.4,
            capabilities: vec![
                OperationKind::Facing,
                OperationKind::ExternalRoughing,
                OperationKind::ExternalFinishing,
                OperationKind::Chamfering,
            ],
            description: "55° general turning insert".into(),
        }
    }

    /// A boring bar for internal roughing and finishing.
    pub fn boring_bar() -> Self {
        Self {
            id: "boring-10".into(),
            kind: ToolKind::Boring,
            diameter: 10.0,
            length: 60.0,
            corner_radius: 0.2,
            capabilities: vec![
                OperationKind::InternalRoughing,
                OperationKind::InternalFinishing,
            ],
            description: "10mm boring bar".into(),
        }
    }

    pub fn center_drill(diameter: f64) -> Self {
        Self {
            id: format!("drill-{diameter}"),
            kind: ToolKind::Drill,
            diameter,
            length: diameter * 8.0,
            corner_radius: 0.0,
            capabilities: vec![OperationKind::Drilling],
            description: format!("{diameter}mm twist drill"),
        }
    }

    pub fn parting_blade() -> Self {
        Self {
            id: "parting-3".into(),
            kind: ToolKind::Parting,
            diameter: 3.0,
            length: 20.0,
            corner_radius: 0.1,
            capabilities: vec![OperationKind::Parting, OperationKind::ExternalGrooving],
            description: "3mm parting blade".into(),
        }
    }

    pub fn grooving_insert(width: f64) -> Self {
        Self {
            id: format!("groove-{width}"),
            kind: ToolKind::Grooving,
            diameter: width,
            length: 12.0,
            corner_radius: 0.1,
            capabilities: vec![
                OperationKind::ExternalGrooving,
                OperationKind::InternalGrooving,
            ],
            description: format!("{width}mm grooving insert"),
        }
    }

    pub fn threading_insert() -> Self {
        Self {
            id: "thread-60".into(),
            kind: ToolKind::Threading,
            diameter: 16.0,
            length: 16.0,
            corner_radius: 0.0,
            capabilities: vec![OperationKind::Threading],
            description: "60° metric threading insert".into(),
        }
    }

    pub fn can_perform(&self, operation: OperationKind) -> bool {
        self.capabilities.contains(&operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let tool = Tool::general_turning();
        assert!(tool.can_perform(OperationKind::Facing));
        assert!(tool.can_perform(OperationKind::ExternalRoughing));
        assert!(!tool.can_perform(OperationKind::Threading));
    }

    #[test]
    fn test_center_drill_id_includes_diameter() {
        let drill = Tool::center_drill(6.0);
        assert_eq!(drill.id, "drill-6");
        assert_eq!(drill.kind, ToolKind::Drill);
        assert!(drill.can_perform(OperationKind::Drilling));
    }

    #[test]
    fn test_tool_serde_round_trip() {
        let tool = Tool::parting_blade();
        let json = serde_json::to_string(&tool).unwrap();
        let back: Tool = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "parting-3");
        assert_eq!(back.kind, ToolKind::Parting);
        assert!(back.can_perform(OperationKind::ExternalGrooving));
    }
}
