//! Commit models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Commit stored in database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Commit {
    pub id: Uuid,
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub repo_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Commit row ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommit {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

/// Response for listing stored commits of a repository.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommitListResponse {
    pub commits: Vec<Commit>,
}

/// Response for fetching commits from GitHub.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FetchCommitsResponse {
    pub message: String,
    /// Commits returned by GitHub in this fetch
    pub fetched: usize,
    /// Commits that were not yet stored
    pub inserted: u64,
}
