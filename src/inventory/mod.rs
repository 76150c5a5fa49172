/// GKE cluster inventory: listing, classification and aggregation
pub mod aggregate;
pub mod classify;
pub mod models;
pub mod structured;
pub mod tabular;

use async_trait::async_trait;
use tracing::info;

pub use aggregate::{Aggregator, ScanReport};
pub use models::{ClusterMode, NodeCount, Project, ProjectOutcome};
pub use structured::StructuredLister;
pub use tabular::TabularLister;

use crate::config::Strategy;
use crate::gcloud::{GcloudClient, ProjectListError, ProjectLister};
use crate::utils::command::CommandOutput;

/// Error-stream fragments gcloud prints when the Kubernetes Engine API is off
const API_DISABLED_MARKERS: &[&str] = &["has not been used", "SERVICE_DISABLED", "is disabled"];

/// Lists and classifies the clusters of one project.
///
/// Never fails: every problem is folded into the returned [`ProjectOutcome`]
/// so that one project cannot stop the scan of the others.
#[async_trait]
pub trait ClusterLister: Send + Sync {
    /// Short strategy name for logs
    fn name(&self) -> &'static str;

    async fn list_clusters(&self, project: &Project) -> ProjectOutcome;
}

/// Build the lister for the configured acquisition strategy
pub fn lister_for(strategy: Strategy, gcloud: GcloudClient) -> Box<dyn ClusterLister> {
    match strategy {
        Strategy::Structured => Box::new(StructuredLister::new(gcloud)),
        Strategy::Tabular => Box::new(TabularLister::new(gcloud)),
    }
}

/// List projects, then process each one in listing order
pub async fn scan(
    projects: &ProjectLister,
    lister: &dyn ClusterLister,
) -> Result<ScanReport, ProjectListError> {
    let projects = projects.list_projects().await?;
    info!("Found {} GCP projects", projects.len());

    Ok(Aggregator::new(lister).run(projects).await)
}

/// Outcome for a cluster listing that printed nothing on stdout
pub(crate) fn blank_listing_outcome(
    output: &CommandOutput,
    on_success: ProjectOutcome,
) -> ProjectOutcome {
    let stderr = output.stderr.trim();
    if API_DISABLED_MARKERS.iter().any(|m| stderr.contains(m)) {
        ProjectOutcome::ApiNotEnabled {
            detail: stderr.lines().next().unwrap_or_default().to_string(),
        }
    } else if output.success {
        on_success
    } else {
        ProjectOutcome::ExecutionError {
            detail: if stderr.is_empty() {
                "gcloud exited with a failure status".to_string()
            } else {
                stderr.to_string()
            },
        }
    }
}
