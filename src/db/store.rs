//! Store seams used by the sync services.
//!
//! `DbPool` is the production implementation; tests swap in an in-memory
//! store.

use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Commit, CommitFile, FileContent, NewCommit, NewRepo, Repo};

use super::DbPool;

/// A stored commit plus what is needed to query GitHub about it.
#[derive(Debug, Clone)]
pub struct CommitContext {
    pub commit: Commit,
    /// `owner/name` of the owning repository
    pub repo_full_name: String,
    /// GitHub token of the repository owner, if one is on file
    pub owner_token: Option<SecretString>,
}

/// Persistence used by commit file sync.
#[async_trait]
pub trait CommitFileStore: Send + Sync {
    async fn find_commit_context(&self, sha: &str) -> AppResult<Option<CommitContext>>;

    /// Stored files for `sha`, ordered by path.
    async fn list_files(&self, sha: &str) -> AppResult<Vec<CommitFile>>;

    /// Create a row; `AppError::Conflict` when `(sha, path)` already exists.
    async fn create_file(&self, commit_id: Uuid, file: &CommitFile) -> AppResult<CommitFile>;

    /// Update the row keyed by `(sha, path)`; `None` when there is none.
    async fn update_file(
        &self,
        sha: &str,
        path: &str,
        content: &FileContent,
    ) -> AppResult<Option<CommitFile>>;
}

/// Persistence used by repository and commit history sync.
#[async_trait]
pub trait RepoStore: Send + Sync {
    /// Upsert by GitHub id, preserving `auto_audit` and owner on conflict.
    async fn upsert_repos(&self, owner_id: Uuid, repos: &[NewRepo]) -> AppResult<u64>;

    async fn find_owned_repo(&self, owner_id: Uuid, github_id: &str) -> AppResult<Option<Repo>>;

    /// Insert commits; SHAs already stored are skipped.
    async fn insert_commits(&self, repo_id: Uuid, commits: &[NewCommit]) -> AppResult<u64>;
}

#[async_trait]
impl CommitFileStore for DbPool {
    async fn find_commit_context(&self, sha: &str) -> AppResult<Option<CommitContext>> {
        DbPool::find_commit_context(self, sha).await
    }

    async fn list_files(&self, sha: &str) -> AppResult<Vec<CommitFile>> {
        self.list_commit_files(sha).await
    }

    async fn create_file(&self, commit_id: Uuid, file: &CommitFile) -> AppResult<CommitFile> {
        self.insert_commit_file(commit_id, file).await
    }

    async fn update_file(
        &self,
        sha: &str,
        path: &str,
        content: &FileContent,
    ) -> AppResult<Option<CommitFile>> {
        self.update_commit_file(sha, path, content).await
    }
}

#[async_trait]
impl RepoStore for DbPool {
    async fn upsert_repos(&self, owner_id: Uuid, repos: &[NewRepo]) -> AppResult<u64> {
        DbPool::upsert_repos(self, owner_id, repos).await
    }

    async fn find_owned_repo(&self, owner_id: Uuid, github_id: &str) -> AppResult<Option<Repo>> {
        DbPool::find_owned_repo(self, owner_id, github_id).await
    }

    async fn insert_commits(&self, repo_id: Uuid, commits: &[NewCommit]) -> AppResult<u64> {
        DbPool::insert_commits(self, repo_id, commits).await
    }
}
