/// gcloud CLI access
pub mod client;
pub mod projects;

pub use client::GcloudClient;
pub use projects::{ProjectListError, ProjectLister};
