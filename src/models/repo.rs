//! Repository models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Pagination;
use super::github::GitHubRepo;
use crate::error::{AppError, AppResult};

/// Repository stored in database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Repo {
    pub id: Uuid,
    pub github_id: String,
    pub name: String,
    pub full_name: String,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub auto_audit: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable repository fields as mirrored from GitHub.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRepo {
    pub github_id: String,
    pub name: String,
    pub full_name: String,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub private: bool,
    pub fork: bool,
}

impl From<&GitHubRepo> for NewRepo {
    fn from(r: &GitHubRepo) -> Self {
        Self {
            github_id: r.github_id(),
            name: r.name.clone(),
            full_name: r.full_name.clone(),
            html_url: r.html_url.clone(),
            description: r.description.clone(),
            language: r.language.clone(),
            private: r.private,
            fork: r.fork,
        }
    }
}

/// Request body for saving a single repository.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveRepoRequest {
    /// GitHub repository id, as number or string
    #[serde(deserialize_with = "string_or_number")]
    #[schema(value_type = String)]
    pub github_id: String,
    pub name: String,
    pub full_name: String,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
}

impl SaveRepoRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.github_id.trim().is_empty()
            || self.name.trim().is_empty()
            || self.full_name.trim().is_empty()
        {
            return Err(AppError::InvalidInput(
                "githubId, name and fullName are required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_new_repo(self) -> NewRepo {
        NewRepo {
            github_id: self.github_id.trim().to_string(),
            name: self.name,
            full_name: self.full_name,
            html_url: self.html_url,
            description: self.description,
            language: self.language,
            private: self.private,
            fork: self.fork,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

/// Request body for toggling auto-audit.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuditToggleRequest {
    #[serde(alias = "autoAudit")]
    pub auto_audit: bool,
}

/// Paginated list of stored repositories.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RepoListResponse {
    pub data: Vec<Repo>,
    pub pagination: Pagination,
}

/// Paginated list of repositories straight from GitHub.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GitHubRepoListResponse {
    pub data: Vec<GitHubRepo>,
    pub pagination: Pagination,
}

/// Response for a repository sync.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncReposResponse {
    pub message: String,
    pub count: usize,
}
