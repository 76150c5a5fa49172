/// Per-project processing and node totals
use serde::Serialize;
use tracing::{info, warn};

use super::models::{ClusterMode, NodeCount, Project, ProjectOutcome};
use super::ClusterLister;

/// Running totals for one scan. Every counter only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub standard_node_total: u64,
    pub autopilot_node_total: u64,
    pub projects_scanned: usize,
    pub projects_failed: usize,
    pub standard_clusters: usize,
    pub autopilot_clusters: usize,
    pub clusters_without_node_count: usize,
}

impl Aggregate {
    /// Fold one finished project outcome into the totals
    pub fn accumulate(mut self, outcome: &ProjectOutcome) -> Self {
        self.projects_scanned += 1;
        if outcome.is_failure() {
            self.projects_failed += 1;
        }

        if let ProjectOutcome::Success { clusters, .. } = outcome {
            for cluster in clusters {
                let nodes = cluster.node_count.for_total();
                match cluster.mode {
                    ClusterMode::Standard => {
                        self.standard_clusters += 1;
                        self.standard_node_total += nodes;
                    }
                    ClusterMode::Autopilot => {
                        self.autopilot_clusters += 1;
                        self.autopilot_node_total += nodes;
                    }
                }
                if cluster.node_count == NodeCount::Unknown {
                    self.clusters_without_node_count += 1;
                }
            }
        }
        self
    }
}

/// One project and what its listing produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectReport {
    pub project: Project,
    #[serde(flatten)]
    pub outcome: ProjectOutcome,
}

/// Everything a finished scan produced, projects in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub projects: Vec<ProjectReport>,
    pub aggregate: Aggregate,
}

/// Drives a [`ClusterLister`] over projects one at a time
pub struct Aggregator<'a> {
    lister: &'a dyn ClusterLister,
}

impl<'a> Aggregator<'a> {
    pub fn new(lister: &'a dyn ClusterLister) -> Self {
        Self { lister }
    }

    /// List and classify one project's clusters, logging any skip with project context
    pub async fn process_project(&self, project: &Project) -> ProjectOutcome {
        info!("Scanning project {} ({})", project, self.lister.name());
        let outcome = self.lister.list_clusters(project).await;

        match &outcome {
            ProjectOutcome::Success { clusters, rejected } => info!(
                "Project {}: {} clusters classified, {} rejected",
                project,
                clusters.len(),
                rejected.len()
            ),
            ProjectOutcome::NoClusters => {
                info!("Project {} has no GKE clusters, skipping", project)
            }
            ProjectOutcome::ApiNotEnabled { detail } => warn!(
                "Kubernetes Engine API is not enabled in project {}, skipping: {}",
                project, detail
            ),
            ProjectOutcome::ParseError { detail } => warn!(
                "Could not parse cluster listing for project {}, skipping: {}",
                project, detail
            ),
            ProjectOutcome::ExecutionError { detail } => warn!(
                "Error listing clusters for project {}, skipping: {}",
                project, detail
            ),
        }
        outcome
    }

    /// Process every project sequentially; a failed project never stops the others
    pub async fn run(&self, projects: Vec<Project>) -> ScanReport {
        let mut aggregate = Aggregate::default();
        let mut reports = Vec::with_capacity(projects.len());

        for project in projects {
            let outcome = self.process_project(&project).await;
            aggregate = aggregate.accumulate(&outcome);
            reports.push(ProjectReport { project, outcome });
        }

        ScanReport {
            projects: reports,
            aggregate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcloud::GcloudClient;
    use crate::inventory::models::ClusterRecord;
    use crate::inventory::{StructuredLister, TabularLister};
    use crate::utils::command::testing::FakeRunner;
    use std::sync::Arc;

    fn record(name: &str, mode: ClusterMode, node_count: NodeCount) -> ClusterRecord {
        ClusterRecord {
            name: name.to_string(),
            location: None,
            mode,
            node_count,
        }
    }

    #[test]
    fn test_accumulate_counts_known_nodes_per_mode() {
        let outcome = ProjectOutcome::Success {
            clusters: vec![
                record("a", ClusterMode::Standard, NodeCount::Known(3)),
                record("b", ClusterMode::Standard, NodeCount::Unknown),
                record("c", ClusterMode::Autopilot, NodeCount::Known(2)),
                record("d", ClusterMode::Autopilot, NodeCount::Known(0)),
            ],
            rejected: vec!["cluster element has no name".to_string()],
        };

        let aggregate = Aggregate::default().accumulate(&outcome);
        assert_eq!(aggregate.standard_node_total, 3);
        assert_eq!(aggregate.autopilot_node_total, 2);
        assert_eq!(aggregate.standard_clusters, 2);
        assert_eq!(aggregate.autopilot_clusters, 2);
        assert_eq!(aggregate.clusters_without_node_count, 1);
        assert_eq!(aggregate.projects_scanned, 1);
        assert_eq!(aggregate.projects_failed, 0);
    }

    #[test]
    fn test_failures_only_bump_counters() {
        let aggregate = [
            ProjectOutcome::NoClusters,
            ProjectOutcome::ParseError {
                detail: "bad".to_string(),
            },
            ProjectOutcome::ExecutionError {
                detail: "boom".to_string(),
            },
        ]
        .iter()
        .fold(Aggregate::default(), Aggregate::accumulate);

        assert_eq!(aggregate.projects_scanned, 3);
        assert_eq!(aggregate.projects_failed, 2);
        assert_eq!(aggregate.standard_node_total, 0);
        assert_eq!(aggregate.autopilot_node_total, 0);
    }

    #[tokio::test]
    async fn test_api_disabled_project_is_skipped() {
        let a = Project::new("project-a");
        let b = Project::new("project-b");
        let runner = FakeRunner::new()
            .respond(
                GcloudClient::structured_cluster_args(&a),
                r#"[
                    {"name": "std", "autopilot": {}, "currentNodeCount": 3},
                    {"name": "ap", "autopilot": {"enabled": true}, "currentNodeCount": 2}
                ]"#,
            )
            .fail(
                GcloudClient::structured_cluster_args(&b),
                "ERROR: (gcloud.container.clusters.list) ResponseError: code=403, message=Kubernetes Engine API has not been used in project 42 before or it is disabled.",
            );
        let lister = StructuredLister::new(GcloudClient::new("gcloud", Arc::new(runner)));

        let report = Aggregator::new(&lister).run(vec![a, b]).await;

        assert_eq!(report.aggregate.standard_node_total, 3);
        assert_eq!(report.aggregate.autopilot_node_total, 2);
        assert_eq!(report.aggregate.projects_scanned, 2);
        assert_eq!(report.aggregate.projects_failed, 1);
        assert_eq!(report.projects[0].project.id(), "project-a");
        assert!(matches!(
            report.projects[1].outcome,
            ProjectOutcome::ApiNotEnabled { .. }
        ));
    }

    #[tokio::test]
    async fn test_parse_error_does_not_change_other_totals() {
        let good = Project::new("good");
        let broken = Project::new("broken");
        let later = Project::new("later");
        let runner = FakeRunner::new()
            .respond(
                GcloudClient::structured_cluster_args(&good),
                r#"[{"name": "g", "currentNodeCount": 6}]"#,
            )
            .respond(
                GcloudClient::structured_cluster_args(&broken),
                "WARNING: this is not json",
            )
            .respond(
                GcloudClient::structured_cluster_args(&later),
                r#"[{"name": "l", "autopilot": {"enabled": true}, "currentNodeCount": 1}]"#,
            );
        let lister = StructuredLister::new(GcloudClient::new("gcloud", Arc::new(runner)));

        let report = Aggregator::new(&lister)
            .run(vec![good, broken, later])
            .await;

        assert_eq!(report.aggregate.standard_node_total, 6);
        assert_eq!(report.aggregate.autopilot_node_total, 1);
        assert!(matches!(
            report.projects[1].outcome,
            ProjectOutcome::ParseError { .. }
        ));
        let order: Vec<&str> = report.projects.iter().map(|p| p.project.id()).collect();
        assert_eq!(order, vec!["good", "broken", "later"]);
    }

    /// Both acquisition strategies see the same clusters and must agree
    #[tokio::test]
    async fn test_strategies_agree_on_equivalent_fixtures() {
        let alpha = Project::new("alpha");
        let beta = Project::new("beta");

        let structured = FakeRunner::new()
            .respond(
                GcloudClient::structured_cluster_args(&alpha),
                r#"[
                    {"name": "web", "location": "us-central1-a", "autopilot": {}, "currentNodeCount": 3},
                    {"name": "jobs", "location": "us-central1", "autopilot": {"enabled": true}, "currentNodeCount": 2},
                    {"name": "idle", "location": "us-central1", "autopilot": {"enabled": true}}
                ]"#,
            )
            .respond(
                GcloudClient::structured_cluster_args(&beta),
                r#"[{"name": "etl", "location": "europe-west1-b", "currentNodeCount": 5}]"#,
            );

        let tabular = FakeRunner::new()
            .respond(
                GcloudClient::tabular_cluster_args(&alpha),
                "NAME: web\nLOCATION: us-central1-a\nNUM_NODES: 3\n\n\
                 NAME: jobs\nLOCATION: us-central1\nNUM_NODES: 2\n\n\
                 NAME: idle\nLOCATION: us-central1\n",
            )
            .respond(
                GcloudClient::node_pool_args("web", &alpha, Some("us-central1-a")),
                "default-pool\n",
            )
            .fail(
                GcloudClient::node_pool_args("jobs", &alpha, Some("us-central1")),
                "ERROR: node pools are not available on Autopilot clusters",
            )
            .fail(
                GcloudClient::node_pool_args("idle", &alpha, Some("us-central1")),
                "ERROR: node pools are not available on Autopilot clusters",
            )
            .respond(
                GcloudClient::tabular_cluster_args(&beta),
                "NAME: etl\nLOCATION: europe-west1-b\nNUM_NODES: 5\n",
            )
            .respond(
                GcloudClient::node_pool_args("etl", &beta, Some("europe-west1-b")),
                "pool-a\npool-b\n",
            );

        let structured = StructuredLister::new(GcloudClient::new("gcloud", Arc::new(structured)));
        let tabular = TabularLister::new(GcloudClient::new("gcloud", Arc::new(tabular)));

        let from_json = Aggregator::new(&structured)
            .run(vec![alpha.clone(), beta.clone()])
            .await;
        let from_table = Aggregator::new(&tabular).run(vec![alpha, beta]).await;

        assert_eq!(from_json, from_table);
        assert_eq!(from_json.aggregate.standard_node_total, 8);
        assert_eq!(from_json.aggregate.autopilot_node_total, 2);
        assert_eq!(from_json.aggregate.clusters_without_node_count, 1);
    }
}
