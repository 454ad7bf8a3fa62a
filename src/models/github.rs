//! Typed schemas for the GitHub REST payloads DevScan consumes.
//!
//! Required fields are required here too: a payload missing them fails to
//! parse and surfaces as a malformed upstream response instead of being
//! papered over with defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::commit_file::FileStatus;
use crate::error::{AppError, AppResult};

/// Repository entry from `GET /user/repos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GitHubRepo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub private: bool,
    pub fork: bool,
}

impl GitHubRepo {
    /// Upstream id in the string form the store keys on.
    pub fn github_id(&self) -> String {
        self.id.to_string()
    }
}

/// Name/date pair GitHub attaches to a commit's author and committer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitActor {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// The `commit` object nested in commit payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitCommitData {
    pub message: String,
    pub author: Option<GitActor>,
    pub committer: Option<GitActor>,
}

impl GitCommitData {
    /// Author display name, "Unknown" when GitHub has none.
    pub fn author_name(&self) -> String {
        self.author
            .as_ref()
            .and_then(|a| a.name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Authored date, falling back to the committer date.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.author
            .as_ref()
            .and_then(|a| a.date)
            .or_else(|| self.committer.as_ref().and_then(|c| c.date))
    }
}

/// Commit entry from `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubCommitSummary {
    pub sha: String,
    pub commit: GitCommitData,
}

impl GitHubCommitSummary {
    /// Reject entries the store cannot represent.
    pub fn validate(&self) -> AppResult<DateTime<Utc>> {
        validate_sha(&self.sha)?;
        self.commit.date().ok_or_else(|| {
            AppError::UpstreamUnavailable(format!(
                "malformed response: commit {} has no author or committer date",
                self.sha
            ))
        })
    }
}

/// One changed file inside a commit detail payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubCommitFile {
    pub filename: String,
    pub status: FileStatus,
    pub additions: u32,
    pub deletions: u32,
    pub changes: u32,
    /// Absent for binary or oversized diffs
    pub patch: Option<String>,
    pub raw_url: Option<String>,
    pub previous_filename: Option<String>,
}

/// Commit detail from `GET /repos/{owner}/{repo}/commits/{sha}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubCommitDetail {
    pub sha: String,
    pub commit: GitCommitData,
    /// GitHub omits the list entirely for empty commits
    #[serde(default)]
    pub files: Vec<GitHubCommitFile>,
}

impl GitHubCommitDetail {
    /// Reject payloads with unusable identity fields.
    pub fn validate(&self) -> AppResult<()> {
        validate_sha(&self.sha)?;
        if let Some(file) = self.files.iter().find(|f| f.filename.trim().is_empty()) {
            return Err(AppError::UpstreamUnavailable(format!(
                "malformed response: commit {} lists a file with an empty filename ({:?})",
                self.sha, file.status
            )));
        }
        Ok(())
    }
}

fn validate_sha(sha: &str) -> AppResult<()> {
    if sha.trim().is_empty() {
        return Err(AppError::UpstreamUnavailable(
            "malformed response: empty commit sha".to_string(),
        ));
    }
    Ok(())
}

/// Parse a GitHub JSON body into its typed schema.
pub fn parse_payload<T>(body: &[u8], what: &str) -> AppResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|e| {
        AppError::UpstreamUnavailable(format!("malformed response for {}: {}", what, e))
    })
}
