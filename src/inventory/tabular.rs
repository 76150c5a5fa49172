/// Tabular acquisition: `KEY: value` cluster blocks plus a node-pool query per cluster
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::classify::{classify, ClusterParseError, ModeSignal, RawCluster};
use super::models::{Project, ProjectOutcome};
use super::{blank_listing_outcome, ClusterLister};
use crate::gcloud::GcloudClient;

/// Fields found in one cluster block; absent keys stay `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterBlock {
    pub name: Option<String>,
    pub location: Option<String>,
    pub num_nodes: Option<String>,
}

impl ClusterBlock {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.num_nodes.is_none()
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "NAME" => Some(&mut self.name),
            "LOCATION" => Some(&mut self.location),
            "NUM_NODES" => Some(&mut self.num_nodes),
            _ => None,
        }
    }
}

static KEY_VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.*?)\s*$").expect("valid regex")
});

/// Split the listing into blocks separated by blank or `---` lines.
///
/// Only `NAME`, `LOCATION` and `NUM_NODES` are kept (keys compared without
/// case, values trimmed); an empty value counts as absent. A key that is
/// already set in the current block starts a new block. Returns `None`
/// when the text holds no recognized key at all.
pub fn parse_cluster_blocks(raw: &str) -> Option<Vec<ClusterBlock>> {
    let mut blocks = Vec::new();
    let mut current = ClusterBlock::default();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| c == '-') {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }

        let Some(caps) = KEY_VALUE_PATTERN.captures(line) else {
            continue;
        };
        let value = caps[2].to_string();
        if value.is_empty() {
            continue;
        }
        let key = caps[1].to_ascii_uppercase();
        let repeated = match current.field_mut(&key) {
            Some(slot) => slot.is_some(),
            None => continue,
        };
        if repeated {
            blocks.push(std::mem::take(&mut current));
        }
        if let Some(slot) = current.field_mut(&key) {
            *slot = Some(value);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    if blocks.is_empty() {
        None
    } else {
        Some(blocks)
    }
}

/// Infers mode by asking gcloud for each cluster's node pools.
///
/// Pool names on stdout mean Standard; an empty stdout with an error stream
/// means Autopilot. Anything else leaves the mode undetermined.
pub struct TabularLister {
    gcloud: GcloudClient,
}

impl TabularLister {
    pub fn new(gcloud: GcloudClient) -> Self {
        Self { gcloud }
    }

    async fn node_pool_signal(
        &self,
        cluster: &str,
        project: &Project,
        location: Option<&str>,
    ) -> ModeSignal {
        match self.gcloud.list_node_pools(cluster, project, location).await {
            Ok(output) if !output.stdout_is_blank() => {
                debug!(
                    "Cluster {} node pools: {}",
                    cluster,
                    output.stdout.split_whitespace().collect::<Vec<_>>().join(", ")
                );
                ModeSignal::NodePoolsListed
            }
            Ok(output) if output.has_stderr() => {
                debug!(
                    "Cluster {} node-pool query failed: {}",
                    cluster,
                    output.stderr.trim()
                );
                ModeSignal::NodePoolQueryFailed
            }
            Ok(_) => ModeSignal::Inconclusive,
            Err(e) => {
                warn!("Cluster {}: could not run node-pool query: {:#}", cluster, e);
                ModeSignal::Inconclusive
            }
        }
    }
}

#[async_trait]
impl ClusterLister for TabularLister {
    fn name(&self) -> &'static str {
        "tabular"
    }

    async fn list_clusters(&self, project: &Project) -> ProjectOutcome {
        let output = match self.gcloud.list_clusters_table(project).await {
            Ok(output) => output,
            Err(e) => {
                return ProjectOutcome::ExecutionError {
                    detail: format!("{:#}", e),
                }
            }
        };

        if output.stdout_is_blank() {
            return blank_listing_outcome(&output, ProjectOutcome::NoClusters);
        }

        let Some(blocks) = parse_cluster_blocks(&output.stdout) else {
            return ProjectOutcome::ParseError {
                detail: "no NAME, LOCATION or NUM_NODES fields in cluster listing".to_string(),
            };
        };

        let mut clusters = Vec::new();
        let mut rejected = Vec::new();
        for block in blocks {
            let Some(name) = block.name else {
                rejected.push(ClusterParseError::MissingName.to_string());
                continue;
            };
            let signal = self
                .node_pool_signal(&name, project, block.location.as_deref())
                .await;
            let raw = RawCluster {
                name: Some(name),
                location: block.location,
                signal,
                node_count: block.num_nodes,
            };
            match classify(raw) {
                Ok(record) => clusters.push(record),
                Err(e) => {
                    warn!("Project {}: skipping cluster: {}", project, e);
                    rejected.push(e.to_string());
                }
            }
        }

        ProjectOutcome::Success { clusters, rejected }
    }
}
