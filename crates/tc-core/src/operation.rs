use serde::{Deserialize, Serialize};

/// The canonical lathe operations, in no particular order. The pipeline
/// driver fixes the machining sequence; this enum only tags toolpaths and
/// movements with the operation that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Facing,
    ExternalRoughing,
    InternalRoughing,
    ExternalFinishing,
    InternalFinishing,
    Drilling,
    ExternalGrooving,
    InternalGrooving,
    Chamfering,
    Threading,
    Parting,
    #[default]
    Unknown,
}

impl OperationKind {
    /// Human-readable label used in movement stamps and log lines.
    pub fn label(self) -> &'static str {
        match self {
            OperationKind::Facing => "Facing",
            OperationKind::ExternalRoughing => "External Roughing",
            OperationKind::InternalRoughing => "Internal Roughing",
            OperationKind::ExternalFinishing => "External Finishing",
            OperationKind::InternalFinishing => "Internal Finishing",
            OperationKind::Drilling => "Drilling",
            OperationKind::ExternalGrooving => "External Grooving",
            OperationKind::InternalGrooving => "Internal Grooving",
            OperationKind::Chamfering => "Chamfering",
            OperationKind::Threading => "Threading",
            OperationKind::Parting => "Parting",
            OperationKind::Unknown => "Unknown",
        }
    }

    /// True for the operations that cut inside a bore.
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            OperationKind::InternalRoughing
                | OperationKind::InternalFinishing
                | OperationKind::InternalGrooving
                | OperationKind::Drilling
        )
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(OperationKind::Facing.label(), "Facing");
        assert_eq!(OperationKind::ExternalRoughing.label(), "External Roughing");
        assert_eq!(OperationKind::Parting.to_string(), "Parting");
    }

    #[test]
    fn test_internal_classification() {
        assert!(OperationKind::Drilling.is_internal());
        assert!(OperationKind::InternalGrooving.is_internal());
        assert!(!OperationKind::ExternalRoughing.is_internal());
        assert!(!OperationKind::Facing.is_internal());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&OperationKind::ExternalFinishing).unwrap();
        assert_eq!(json, "\"external_finishing\"");
        let back: OperationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OperationKind::ExternalFinishing);
    }
}
