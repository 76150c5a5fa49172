/// Rendering of a finished scan
use anyhow::{Context, Result};
use std::fmt::Write;

use crate::inventory::{ClusterMode, NodeCount, ProjectOutcome, ScanReport};

/// Human-readable report, one section per project then the totals
pub fn render_text(report: &ScanReport) -> Result<String> {
    let mut out = String::new();
    write_text(&mut out, report).context("Failed to render scan report")?;
    Ok(out)
}

fn write_text(out: &mut String, report: &ScanReport) -> std::fmt::Result {
    if report.projects.is_empty() {
        writeln!(out, "Found 0 GCP projects, nothing to scan\n")?;
    } else {
        writeln!(out, "Found {} GCP projects\n", report.projects.len())?;
    }

    for entry in &report.projects {
        let project = &entry.project;
        writeln!(out, "###### Project Name: {} #########\n", project)?;

        match &entry.outcome {
            ProjectOutcome::Success { clusters, rejected } => {
                for cluster in clusters {
                    writeln!(out, "Cluster Name: {}", cluster.name)?;
                    match cluster.mode {
                        ClusterMode::Autopilot => {
                            writeln!(out, "{} is a GKE Autopilot cluster", cluster.name)?
                        }
                        ClusterMode::Standard => {
                            writeln!(out, "{} is a GKE Standard cluster", cluster.name)?
                        }
                    }
                    match cluster.node_count {
                        NodeCount::Known(n) => writeln!(out, "Current Node Count {}\n", n)?,
                        NodeCount::Unknown => {
                            writeln!(out, "Cluster {} has no nodes\n", cluster.name)?
                        }
                    }
                }
                for reason in rejected {
                    writeln!(
                        out,
                        "Skipped malformed cluster in project {}: {}\n",
                        project, reason
                    )?;
                }
            }
            ProjectOutcome::NoClusters => {
                writeln!(out, "Project {} has no GKE clusters. Skipping.\n", project)?
            }
            ProjectOutcome::ApiNotEnabled { .. } => writeln!(
                out,
                "Kubernetes Engine API has not been used in project {}\n",
                project
            )?,
            ProjectOutcome::ParseError { detail } => writeln!(
                out,
                "Could not parse cluster information for project {}: {}\n",
                project, detail
            )?,
            ProjectOutcome::ExecutionError { detail } => writeln!(
                out,
                "Error processing cluster information for project {}: {}\n",
                project, detail
            )?,
        }
    }

    let totals = &report.aggregate;
    writeln!(out, "##########################\n")?;
    writeln!(out, "Total GKE Standard Nodes: {}", totals.standard_node_total)?;
    writeln!(out, "Total GKE Autopilot Nodes: {}", totals.autopilot_node_total)?;
    Ok(())
}

/// Machine-readable report
pub fn render_json(report: &ScanReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize scan report")
}
