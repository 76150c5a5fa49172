/// gcloud command client
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::config::ProjectFormat;
use crate::inventory::Project;
use crate::utils::command::{CommandOutput, CommandRunner};

/// Tabular cluster listing: one `KEY: value` block per cluster
pub const TABULAR_CLUSTER_FORMAT: &str =
    "flattened(name:label=NAME,location:label=LOCATION,currentNodeCount:label=NUM_NODES)";

/// Thin client that knows gcloud's argument lines and nothing about their output
#[derive(Clone)]
pub struct GcloudClient {
    binary: String,
    runner: Arc<dyn CommandRunner>,
}

impl GcloudClient {
    /// Create a new gcloud client
    pub fn new(binary: impl Into<String>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            binary: binary.into(),
            runner,
        }
    }

    async fn call(&self, args: Vec<String>) -> Result<CommandOutput> {
        debug!("{} {}", self.binary, args.join(" "));
        self.runner.run(&self.binary, &args).await
    }

    pub fn project_list_args(format: ProjectFormat) -> Vec<String> {
        let format = match format {
            ProjectFormat::Json => "--format=json(projectId)",
            ProjectFormat::Text => "--format=flattened(projectId)",
        };
        vec!["projects".into(), "list".into(), format.into()]
    }

    pub fn structured_cluster_args(project: &Project) -> Vec<String> {
        vec![
            "container".into(),
            "clusters".into(),
            "list".into(),
            "--project".into(),
            project.id().into(),
            "--format=json".into(),
        ]
    }

    pub fn tabular_cluster_args(project: &Project) -> Vec<String> {
        vec![
            "container".into(),
            "clusters".into(),
            "list".into(),
            "--project".into(),
            project.id().into(),
            format!("--format={}", TABULAR_CLUSTER_FORMAT),
        ]
    }

    pub fn node_pool_args(cluster: &str, project: &Project, location: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "container".into(),
            "node-pools".into(),
            "list".into(),
            "--cluster".into(),
            cluster.into(),
            "--project".into(),
            project.id().into(),
        ];
        if let Some(location) = location {
            args.push("--location".into());
            args.push(location.into());
        }
        args.push("--format=value(name)".into());
        args
    }

    /// List every project visible to the active account
    pub async fn list_projects(&self, format: ProjectFormat) -> Result<CommandOutput> {
        self.call(Self::project_list_args(format)).await
    }

    /// List a project's clusters as JSON
    pub async fn list_clusters_json(&self, project: &Project) -> Result<CommandOutput> {
        self.call(Self::structured_cluster_args(project)).await
    }

    /// List a project's clusters as `KEY: value` blocks
    pub async fn list_clusters_table(&self, project: &Project) -> Result<CommandOutput> {
        self.call(Self::tabular_cluster_args(project)).await
    }

    /// List node pool names of one cluster
    pub async fn list_node_pools(
        &self,
        cluster: &str,
        project: &Project,
        location: Option<&str>,
    ) -> Result<CommandOutput> {
        self.call(Self::node_pool_args(cluster, project, location))
            .await
    }
}
