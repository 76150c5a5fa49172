/// Inventory data model
use serde::Serialize;
use std::fmt;

/// A Google Cloud project id, kept in the order gcloud listed it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Project(String);

impl Project {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// GKE cluster mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterMode {
    /// User-managed node pools (COS nodes)
    Standard,
    /// Google-managed nodes, no visible node pools
    Autopilot,
}

impl fmt::Display for ClusterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterMode::Standard => write!(f, "Standard"),
            ClusterMode::Autopilot => write!(f, "Autopilot"),
        }
    }
}

/// Node count as reported by the control plane.
///
/// `Unknown` means the field was absent, which is not the same as a cluster
/// reporting zero nodes. Serializes as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeCount {
    Known(u64),
    Unknown,
}

impl NodeCount {
    /// Contribution to the aggregate; unknown counts add nothing
    pub fn for_total(&self) -> u64 {
        match self {
            NodeCount::Known(n) => *n,
            NodeCount::Unknown => 0,
        }
    }
}

/// One classified cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub mode: ClusterMode,
    pub node_count: NodeCount,
}

/// What happened when one project's clusters were listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProjectOutcome {
    /// Listing parsed; `rejected` holds one reason per cluster element that could not be classified
    Success {
        clusters: Vec<ClusterRecord>,
        rejected: Vec<String>,
    },
    NoClusters,
    /// Kubernetes Engine API disabled for the project, or an empty response in its place
    ApiNotEnabled { detail: String },
    ParseError { detail: String },
    ExecutionError { detail: String },
}

impl ProjectOutcome {
    /// True for the outcomes that count as a failed project
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ProjectOutcome::ApiNotEnabled { .. }
                | ProjectOutcome::ParseError { .. }
                | ProjectOutcome::ExecutionError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_count_adds_nothing() {
        assert_eq!(NodeCount::Unknown.for_total(), 0);
        assert_eq!(NodeCount::Known(0).for_total(), 0);
        assert_ne!(NodeCount::Unknown, NodeCount::Known(0));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ProjectOutcome::Success {
            clusters: vec![ClusterRecord {
                name: "prod".to_string(),
                location: None,
                mode: ClusterMode::Autopilot,
                node_count: NodeCount::Unknown,
            }],
            rejected: vec![],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["clusters"][0]["mode"], "autopilot");
        assert!(json["clusters"][0]["node_count"].is_null());

        let json = serde_json::to_value(ProjectOutcome::NoClusters).unwrap();
        assert_eq!(json["status"], "no_clusters");
    }

    #[test]
    fn test_failure_outcomes() {
        assert!(!ProjectOutcome::NoClusters.is_failure());
        assert!(ProjectOutcome::ParseError {
            detail: "x".to_string()
        }
        .is_failure());
    }
}
