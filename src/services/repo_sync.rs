//! Repository mirror and commit history import.

use std::collections::HashMap;

use secrecy::SecretString;
use tracing::{info, warn};

use crate::db::RepoStore;
use crate::error::{AppError, AppResult};
use crate::models::github::GitHubRepo;
use crate::models::{NewCommit, NewRepo, User};
use crate::services::github_api::SourceApi;

/// Stop paginating after this many pages even if GitHub keeps answering.
const MAX_REPO_PAGES: u32 = 100;

/// Outcome of a commit history import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Commits GitHub returned
    pub fetched: usize,
    /// Commits not previously stored
    pub inserted: u64,
}

/// The user's own GitHub token, required for repository listing.
pub fn user_token(user: &User) -> AppResult<&SecretString> {
    user.access_token.as_ref().ok_or(AppError::CredentialMissing)
}

/// Every repository visible to the token, walking pages until an empty one.
pub async fn list_all_repos(
    source: &dyn SourceApi,
    token: &SecretString,
) -> AppResult<Vec<GitHubRepo>> {
    let mut all = Vec::new();
    for page in 1..=MAX_REPO_PAGES {
        let batch = source.list_repos(token, page).await?;
        if batch.is_empty() {
            return Ok(all);
        }
        all.extend(batch);
    }

    warn!(
        "Stopped listing repositories after {} pages ({} repositories)",
        MAX_REPO_PAGES,
        all.len()
    );
    Ok(all)
}

/// Mirror the user's repositories into the store. Returns how many distinct
/// repositories GitHub reported.
pub async fn sync_repositories(
    source: &dyn SourceApi,
    store: &dyn RepoStore,
    user: &User,
) -> AppResult<usize> {
    let token = user_token(user)?;
    let repos = list_all_repos(source, token).await?;

    let rows = dedup_by_github_id(repos.iter().map(NewRepo::from));
    for chunk in rows.chunks(100) {
        store.upsert_repos(user.id, chunk).await?;
    }

    info!(
        user = %user.username,
        count = rows.len(),
        "Repositories synced from GitHub"
    );
    Ok(rows.len())
}

/// Offset pagination can return a repository on two pages when the listing
/// shifts mid-walk. A single upsert statement cannot touch one row twice, so
/// the later copy replaces the earlier one in place.
fn dedup_by_github_id(rows: impl IntoIterator<Item = NewRepo>) -> Vec<NewRepo> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<NewRepo> = Vec::new();
    for row in rows {
        match index.get(&row.github_id) {
            Some(&at) => unique[at] = row,
            None => {
                index.insert(row.github_id.clone(), unique.len());
                unique.push(row);
            }
        }
    }
    unique
}

/// Import the most recent commits of one of the user's stored repositories.
///
/// SHAs already stored are left untouched.
pub async fn fetch_commit_history(
    source: &dyn SourceApi,
    store: &dyn RepoStore,
    user: &User,
    service_token: Option<&SecretString>,
    github_id: &str,
    per_page: u32,
) -> AppResult<FetchOutcome> {
    let repo = store
        .find_owned_repo(user.id, github_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Repository {}", github_id)))?;

    let token = user
        .access_token
        .as_ref()
        .or(service_token)
        .ok_or(AppError::CredentialMissing)?;

    let summaries = source
        .list_commits(&repo.full_name, per_page, token)
        .await?;

    let commits = summaries
        .iter()
        .map(|s| {
            let date = s.validate()?;
            Ok(NewCommit {
                sha: s.sha.clone(),
                message: s.commit.message.clone(),
                author: s.commit.author_name(),
                date,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let inserted = store.insert_commits(repo.id, &commits).await?;

    info!(
        repo = %repo.full_name,
        fetched = commits.len(),
        inserted,
        "Commit history imported"
    );

    Ok(FetchOutcome {
        fetched: commits.len(),
        inserted,
    })
}
