//! Domain models for DevScan.

use utoipa::ToSchema;

pub mod analysis;
pub mod commit;
pub mod commit_file;
pub mod github;
pub mod repo;
pub mod user;

// Re-export commonly used types
pub use analysis::{AnalyzeCommitRequest, AnalyzeRequest, AnalyzeResponse, CorrectedExample};
pub use commit::{Commit, CommitListResponse, FetchCommitsResponse, NewCommit};
pub use commit_file::{
    CommitDetailsResponse, CommitFile, CommitFileResponse, CommitInfo, FileContent, FileStatus,
};
pub use github::{GitHubCommitDetail, GitHubCommitFile, GitHubCommitSummary, GitHubRepo};
pub use repo::{
    AuditToggleRequest, GitHubRepoListResponse, NewRepo, Repo, RepoListResponse, SaveRepoRequest,
    SyncReposResponse,
};
pub use user::{SessionClaims, User, UserResponse};

/// Pagination parameters.
#[derive(Debug, Clone, Default, serde::Deserialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    9
}

impl PaginationParams {
    /// Requested page, 1-based.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(default_page()).max(1)
    }

    /// Calculate the offset for database queries.
    pub fn offset(&self) -> u64 {
        self.page()
            .saturating_sub(1)
            .saturating_mul(self.clamped_limit())
    }

    /// Clamp limit to maximum allowed value.
    pub fn clamped_limit(&self) -> u64 {
        self.limit.unwrap_or(default_limit()).clamp(1, 100)
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, ToSchema)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if total == 0 || limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}
