/// Cluster mode and node count decision rules shared by both listing strategies
use thiserror::Error;

use super::models::{ClusterMode, ClusterRecord, NodeCount};

/// What a listing told us about the cluster's mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSignal {
    /// JSON record has `autopilot.enabled` (any value)
    AutopilotEnabledField,
    /// JSON record has no `autopilot.enabled`
    NoAutopilotField,
    /// Node-pool query printed at least one pool name
    NodePoolsListed,
    /// Node-pool query printed nothing and wrote to its error stream
    NodePoolQueryFailed,
    /// Node-pool query gave neither pool names nor an error
    Inconclusive,
}

/// Fields pulled out of one cluster element before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCluster {
    pub name: Option<String>,
    pub location: Option<String>,
    pub signal: ModeSignal,
    /// Textual node count exactly as listed, `None` when the field was absent
    pub node_count: Option<String>,
}

/// Reasons a single cluster element is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusterParseError {
    #[error("cluster element {0} is not an object")]
    NotAnObject(usize),

    #[error("cluster element has no name")]
    MissingName,

    #[error("cluster {cluster} has an invalid node count {value:?}")]
    InvalidNodeCount { cluster: String, value: String },

    #[error("cluster {0}: node-pool query returned neither pools nor an error")]
    ModeUndetermined(String),
}

/// Decide mode and node count for one cluster
pub fn classify(raw: RawCluster) -> Result<ClusterRecord, ClusterParseError> {
    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or(ClusterParseError::MissingName)?;

    let mode = match raw.signal {
        ModeSignal::AutopilotEnabledField | ModeSignal::NodePoolQueryFailed => {
            ClusterMode::Autopilot
        }
        ModeSignal::NoAutopilotField | ModeSignal::NodePoolsListed => ClusterMode::Standard,
        ModeSignal::Inconclusive => return Err(ClusterParseError::ModeUndetermined(name)),
    };

    let node_count = match raw.node_count {
        None => NodeCount::Unknown,
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) => NodeCount::Known(n),
            Err(_) => {
                return Err(ClusterParseError::InvalidNodeCount {
                    cluster: name,
                    value,
                })
            }
        },
    };

    Ok(ClusterRecord {
        name,
        location: raw.location,
        mode,
        node_count,
    })
}
