/// Structured acquisition: `gcloud container clusters list --format=json`
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::classify::{classify, ClusterParseError, ModeSignal, RawCluster};
use super::models::{Project, ProjectOutcome};
use super::{blank_listing_outcome, ClusterLister};
use crate::gcloud::GcloudClient;

/// Reads mode from the `autopilot.enabled` field of each JSON cluster
pub struct StructuredLister {
    gcloud: GcloudClient,
}

impl StructuredLister {
    pub fn new(gcloud: GcloudClient) -> Self {
        Self { gcloud }
    }
}

#[async_trait]
impl ClusterLister for StructuredLister {
    fn name(&self) -> &'static str {
        "structured"
    }

    async fn list_clusters(&self, project: &Project) -> ProjectOutcome {
        let output = match self.gcloud.list_clusters_json(project).await {
            Ok(output) => output,
            Err(e) => {
                return ProjectOutcome::ExecutionError {
                    detail: format!("{:#}", e),
                }
            }
        };

        if output.stdout_is_blank() {
            // gcloud prints `[]` for an empty list, so silence means the call did not really answer
            return blank_listing_outcome(
                &output,
                ProjectOutcome::ApiNotEnabled {
                    detail: "empty response from cluster listing".to_string(),
                },
            );
        }

        let outcome = parse_cluster_json(&output.stdout);
        if let ProjectOutcome::Success { rejected, .. } = &outcome {
            for reason in rejected {
                warn!("Project {}: skipping cluster: {}", project, reason);
            }
        }
        outcome
    }
}

/// Parse a JSON cluster listing into an outcome.
///
/// A document that is not an array is a `ParseError`; individual malformed
/// elements are rejected without affecting their siblings.
pub fn parse_cluster_json(raw: &str) -> ProjectOutcome {
    let elements = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(elements)) => elements,
        Ok(other) => {
            return ProjectOutcome::ParseError {
                detail: format!("expected a JSON array, got {}", json_kind(&other)),
            }
        }
        Err(e) => {
            return ProjectOutcome::ParseError {
                detail: e.to_string(),
            }
        }
    };

    if elements.is_empty() {
        return ProjectOutcome::NoClusters;
    }

    let mut clusters = Vec::new();
    let mut rejected = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        match raw_cluster(index, element).and_then(classify) {
            Ok(record) => clusters.push(record),
            Err(e) => rejected.push(e.to_string()),
        }
    }

    ProjectOutcome::Success { clusters, rejected }
}

fn raw_cluster(index: usize, element: &Value) -> Result<RawCluster, ClusterParseError> {
    let object = element
        .as_object()
        .ok_or(ClusterParseError::NotAnObject(index))?;

    let autopilot_enabled = object
        .get("autopilot")
        .and_then(Value::as_object)
        .is_some_and(|autopilot| autopilot.contains_key("enabled"));

    let node_count = match object.get("currentNodeCount") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    Ok(RawCluster {
        name: object.get("name").and_then(Value::as_str).map(str::to_string),
        location: object
            .get("location")
            .and_then(Value::as_str)
            .map(str::to_string),
        signal: if autopilot_enabled {
            ModeSignal::AutopilotEnabledField
        } else {
            ModeSignal::NoAutopilotField
        },
        node_count,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::models::{ClusterMode, ClusterRecord, NodeCount};
    use crate::utils::command::testing::FakeRunner;
    use crate::utils::command::CommandOutput;
    use std::sync::Arc;

    fn clusters(outcome: ProjectOutcome) -> (Vec<ClusterRecord>, Vec<String>) {
        match outcome {
            ProjectOutcome::Success { clusters, rejected } => (clusters, rejected),
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_classifies_modes_and_counts() {
        let raw = r#"[
            {"name": "std-1", "location": "us-east1-b", "autopilot": {}, "currentNodeCount": 3},
            {"name": "ap-1", "location": "us-east1", "autopilot": {"enabled": true}, "currentNodeCount": "2"},
            {"name": "ap-empty", "autopilot": {"enabled": true}}
        ]"#;
        let (records, rejected) = clusters(parse_cluster_json(raw));

        assert!(rejected.is_empty());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].mode, ClusterMode::Standard);
        assert_eq!(records[0].node_count, NodeCount::Known(3));
        assert_eq!(records[1].mode, ClusterMode::Autopilot);
        assert_eq!(records[1].node_count, NodeCount::Known(2));
        assert_eq!(records[2].mode, ClusterMode::Autopilot);
        assert_eq!(records[2].node_count, NodeCount::Unknown);
    }

    #[test]
    fn test_enabled_key_presence_is_what_counts() {
        let (records, _) = clusters(parse_cluster_json(
            r#"[{"name": "odd", "autopilot": {"enabled": false}, "currentNodeCount": 1}]"#,
        ));
        assert_eq!(records[0].mode, ClusterMode::Autopilot);
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse_cluster_json("{not json"),
            ProjectOutcome::ParseError { .. }
        ));
        assert!(matches!(
            parse_cluster_json(r#"{"name": "x"}"#),
            ProjectOutcome::ParseError { ref detail } if detail.contains("an object")
        ));
    }

    #[test]
    fn test_empty_array_is_no_clusters() {
        assert_eq!(parse_cluster_json("[]"), ProjectOutcome::NoClusters);
    }

    #[test]
    fn test_bad_elements_do_not_sink_the_project() {
        let raw = r#"[
            "garbage",
            {"currentNodeCount": 4},
            {"name": "bad-count", "currentNodeCount": "many"},
            {"name": "good", "currentNodeCount": 5}
        ]"#;
        let (records, rejected) = clusters(parse_cluster_json(raw));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "good");
        assert_eq!(rejected.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_stdout_means_api_not_enabled() {
        let project = Project::new("legacy");
        let runner = FakeRunner::new().respond_with(
            GcloudClient::structured_cluster_args(&project),
            CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
            },
        );
        let lister = StructuredLister::new(GcloudClient::new("gcloud", Arc::new(runner)));

        assert!(matches!(
            lister.list_clusters(&project).await,
            ProjectOutcome::ApiNotEnabled { .. }
        ));
    }

    #[tokio::test]
    async fn test_runner_error_is_execution_error() {
        let lister = StructuredLister::new(GcloudClient::new("gcloud", Arc::new(FakeRunner::new())));

        assert!(matches!(
            lister.list_clusters(&Project::new("nowhere")).await,
            ProjectOutcome::ExecutionError { ref detail } if detail.contains("no scripted response")
        ));
    }
}
