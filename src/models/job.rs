//! Job-search backend models.
//!
//! The backend is loose about its response shape: `requirements` comes
//! back as a comma-separated string and paging fields may be missing.
//! The `search_jobs` endpoint normalizes raw responses into `JobPage`
//! before anything is cached (see `endpoints::jobs`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub salary: String,
    #[serde(rename = "postedDate")]
    pub posted_date: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
}

/// One page of search results, after normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    #[serde(rename = "totalResults")]
    pub total_results: u64,
    pub page: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSearchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}
