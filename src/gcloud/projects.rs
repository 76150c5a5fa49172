/// Project discovery
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::client::GcloudClient;
use crate::config::ProjectFormat;
use crate::inventory::Project;

/// Failures that end the whole run: without projects there is nothing to scan
#[derive(Debug, Error)]
pub enum ProjectListError {
    #[error("Error running gcloud projects list: {0}")]
    ExternalTool(String),

    #[error("Could not parse gcloud projects list output: {0}")]
    Parse(String),
}

#[derive(Deserialize)]
struct ProjectEntry {
    #[serde(rename = "projectId")]
    project_id: String,
}

/// Lists the projects to scan, in the order gcloud returns them
pub struct ProjectLister {
    gcloud: GcloudClient,
    format: ProjectFormat,
}

impl ProjectLister {
    pub fn new(gcloud: GcloudClient, format: ProjectFormat) -> Self {
        Self { gcloud, format }
    }

    /// Any output on the error stream is fatal, as is output that does not parse
    pub async fn list_projects(&self) -> Result<Vec<Project>, ProjectListError> {
        let output = self
            .gcloud
            .list_projects(self.format)
            .await
            .map_err(|e| ProjectListError::ExternalTool(format!("{:#}", e)))?;

        if output.has_stderr() {
            return Err(ProjectListError::ExternalTool(
                output.stderr.trim().to_string(),
            ));
        }
        if !output.success {
            return Err(ProjectListError::ExternalTool(
                "gcloud exited with a failure status".to_string(),
            ));
        }

        let projects = match self.format {
            ProjectFormat::Json => parse_project_json(&output.stdout)?,
            ProjectFormat::Text => parse_project_text(&output.stdout)?,
        };
        debug!("Parsed {} projects", projects.len());
        Ok(projects)
    }
}

/// Parse `[{"projectId": "..."}, ...]`; an entry without `projectId` fails the whole listing
pub fn parse_project_json(raw: &str) -> Result<Vec<Project>, ProjectListError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<ProjectEntry> =
        serde_json::from_str(raw).map_err(|e| ProjectListError::Parse(e.to_string()))?;
    Ok(entries
        .into_iter()
        .map(|entry| Project::new(entry.project_id))
        .collect())
}

/// Parse lines such as `projectId: my-project` or `project_id my-project`.
///
/// Lines without a project id token are skipped, but non-blank output that
/// yields no project at all is a parse error.
pub fn parse_project_text(raw: &str) -> Result<Vec<Project>, ProjectListError> {
    let mut projects = Vec::new();

    for (line_no, line) in raw.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        if !is_project_id_token(first) {
            continue;
        }
        match tokens.next() {
            Some(id) => projects.push(Project::new(id)),
            None => {
                return Err(ProjectListError::Parse(format!(
                    "line {} has a project id key but no value",
                    line_no + 1
                )))
            }
        }
    }

    if projects.is_empty() && !raw.trim().is_empty() {
        return Err(ProjectListError::Parse(
            "no project id lines found in non-empty output".to_string(),
        ));
    }
    Ok(projects)
}

fn is_project_id_token(token: &str) -> bool {
    let normalized: String = token
        .trim_end_matches(':')
        .chars()
        .filter(|c| *c != '_')
        .collect();
    normalized.eq_ignore_ascii_case("projectid")
}
