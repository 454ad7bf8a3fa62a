//! Commit file models: the stored JSON blob and the detail response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Change status of a file within a commit.
///
/// GitHub also reports `copied`, `changed` and `unchanged`; those carry a
/// diff like any modification and are folded into `Modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Renamed,
    #[serde(other)]
    Modified,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
            Self::Modified => "modified",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSON blob stored in `commit_files.content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    pub status: FileStatus,
    pub additions: u32,
    pub deletions: u32,
    pub changes: u32,
    /// Never empty once a file has been through sync
    pub patch: String,
    #[serde(default)]
    pub raw_url: Option<String>,
    /// Upstream filename before path normalization
    pub filename: String,
}

impl FileContent {
    pub fn to_json(&self) -> AppResult<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| AppError::Database(format!("Failed to encode file content: {}", e)))
    }

    pub fn from_json(value: serde_json::Value) -> AppResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::Database(format!("Corrupt commit file content: {}", e)))
    }
}

/// A commit file as the sync routine sees it.
///
/// `id` is `None` only when the file could not be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitFile {
    pub id: Option<Uuid>,
    pub sha: String,
    pub path: String,
    pub content: FileContent,
}

/// One file in a commit details response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommitFileResponse {
    pub id: Option<Uuid>,
    pub sha: String,
    pub path: String,
    /// added, removed, renamed or modified
    #[schema(value_type = String)]
    pub status: FileStatus,
    pub additions: u32,
    pub deletions: u32,
    pub changes: u32,
    pub patch: String,
}

impl From<CommitFile> for CommitFileResponse {
    fn from(f: CommitFile) -> Self {
        Self {
            id: f.id,
            sha: f.sha,
            path: f.path,
            status: f.content.status,
            additions: f.content.additions,
            deletions: f.content.deletions,
            changes: f.content.changes,
            patch: f.content.patch,
        }
    }
}

/// Commit metadata attached to a details response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
    /// Sum of `changes` across all files
    pub total_changes: u64,
}

impl CommitInfo {
    pub fn new(
        sha: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        date: DateTime<Utc>,
        files: &[CommitFile],
    ) -> Self {
        Self {
            sha: sha.into(),
            message: message.into(),
            author: author.into(),
            date,
            total_changes: files.iter().map(|f| u64::from(f.content.changes)).sum(),
        }
    }
}

/// Response for commit details and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitDetailsResponse {
    pub message: String,
    pub files: Vec<CommitFileResponse>,
    pub commit_info: CommitInfo,
}
