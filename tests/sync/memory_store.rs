//! In-memory implementation of the store seams.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use devscan_lib::db::{CommitContext, CommitFileStore, RepoStore};
use devscan_lib::error::{AppError, AppResult};
use devscan_lib::models::{Commit, CommitFile, FileContent, NewCommit, NewRepo, Repo};
use secrecy::SecretString;
use uuid::Uuid;

#[derive(Default)]
struct State {
    repos: Vec<Repo>,
    commits: Vec<Commit>,
    files: Vec<CommitFile>,
    owner_tokens: HashMap<Uuid, String>,
    creates: usize,
    updates: usize,
}

/// Mutex-guarded store enforcing the same uniqueness rules as the schema:
/// unique repo `github_id`, unique commit `sha`, unique file `(sha, path)`.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

pub fn fixed_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 21, 12, 0, 0).unwrap()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a repository owned by `owner_id`, with the owner's token.
    pub fn seed_repo(
        &self,
        owner_id: Uuid,
        github_id: &str,
        full_name: &str,
        owner_token: Option<&str>,
    ) -> Repo {
        let name = full_name.rsplit('/').next().unwrap_or(full_name).to_string();
        let repo = Repo {
            id: Uuid::new_v4(),
            github_id: github_id.to_string(),
            name,
            full_name: full_name.to_string(),
            html_url: None,
            description: None,
            language: None,
            private: false,
            fork: false,
            auto_audit: false,
            owner_id,
            created_at: fixed_date(),
            updated_at: fixed_date(),
        };

        let mut state = self.state.lock().unwrap();
        if let Some(token) = owner_token {
            state.owner_tokens.insert(owner_id, token.to_string());
        }
        state.repos.push(repo.clone());
        repo
    }

    pub fn seed_commit(&self, repo: &Repo, sha: &str, message: &str) -> Commit {
        let commit = Commit {
            id: Uuid::new_v4(),
            sha: sha.to_string(),
            message: message.to_string(),
            author: "DevScan Bot".to_string(),
            date: fixed_date(),
            repo_id: repo.id,
            created_at: fixed_date(),
        };
        self.state.lock().unwrap().commits.push(commit.clone());
        commit
    }

    pub fn seed_file(&self, file: CommitFile) {
        let mut state = self.state.lock().unwrap();
        let stored = CommitFile {
            id: Some(Uuid::new_v4()),
            ..file
        };
        state.files.push(stored);
    }

    pub fn files(&self, sha: &str) -> Vec<CommitFile> {
        let state = self.state.lock().unwrap();
        let mut files: Vec<CommitFile> =
            state.files.iter().filter(|f| f.sha == sha).cloned().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    pub fn repos(&self) -> Vec<Repo> {
        self.state.lock().unwrap().repos.clone()
    }

    pub fn commits(&self, repo_id: Uuid) -> Vec<Commit> {
        self.state
            .lock()
            .unwrap()
            .commits
            .iter()
            .filter(|c| c.repo_id == repo_id)
            .cloned()
            .collect()
    }

    pub fn set_auto_audit(&self, github_id: &str, enabled: bool) {
        let mut state = self.state.lock().unwrap();
        for repo in state.repos.iter_mut().filter(|r| r.github_id == github_id) {
            repo.auto_audit = enabled;
        }
    }

    /// `(creates, updates)` that succeeded.
    pub fn write_counts(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.creates, state.updates)
    }
}

#[async_trait]
impl CommitFileStore for MemoryStore {
    async fn find_commit_context(&self, sha: &str) -> AppResult<Option<CommitContext>> {
        let state = self.state.lock().unwrap();
        let Some(commit) = state.commits.iter().find(|c| c.sha == sha).cloned() else {
            return Ok(None);
        };
        let repo = state
            .repos
            .iter()
            .find(|r| r.id == commit.repo_id)
            .ok_or_else(|| AppError::Database("commit without repository".to_string()))?;

        Ok(Some(CommitContext {
            repo_full_name: repo.full_name.clone(),
            owner_token: state
                .owner_tokens
                .get(&repo.owner_id)
                .map(|t| SecretString::from(t.clone())),
            commit,
        }))
    }

    async fn list_files(&self, sha: &str) -> AppResult<Vec<CommitFile>> {
        Ok(self.files(sha))
    }

    async fn create_file(&self, _commit_id: Uuid, file: &CommitFile) -> AppResult<CommitFile> {
        let mut state = self.state.lock().unwrap();
        if state
            .files
            .iter()
            .any(|f| f.sha == file.sha && f.path == file.path)
        {
            return Err(AppError::Conflict(format!(
                "Commit file {} {}",
                file.sha, file.path
            )));
        }

        let stored = CommitFile {
            id: Some(Uuid::new_v4()),
            ..file.clone()
        };
        state.files.push(stored.clone());
        state.creates += 1;
        Ok(stored)
    }

    async fn update_file(
        &self,
        sha: &str,
        path: &str,
        content: &FileContent,
    ) -> AppResult<Option<CommitFile>> {
        let mut state = self.state.lock().unwrap();
        let Some(row) = state
            .files
            .iter_mut()
            .find(|f| f.sha == sha && f.path == path)
        else {
            return Ok(None);
        };
        row.content = content.clone();
        let updated = row.clone();
        state.updates += 1;
        Ok(Some(updated))
    }
}

#[async_trait]
impl RepoStore for MemoryStore {
    async fn upsert_repos(&self, owner_id: Uuid, repos: &[NewRepo]) -> AppResult<u64> {
        // Same rule as a single ON CONFLICT DO UPDATE statement
        let mut ids = HashSet::new();
        if !repos.iter().all(|r| ids.insert(r.github_id.as_str())) {
            return Err(AppError::Database(
                "ON CONFLICT DO UPDATE command cannot affect row a second time".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        for new in repos {
            match state.repos.iter_mut().find(|r| r.github_id == new.github_id) {
                Some(existing) => {
                    existing.name = new.name.clone();
                    existing.full_name = new.full_name.clone();
                    existing.html_url = new.html_url.clone();
                    existing.description = new.description.clone();
                    existing.language = new.language.clone();
                    existing.private = new.private;
                    existing.fork = new.fork;
                    existing.updated_at = Utc::now();
                }
                None => state.repos.push(Repo {
                    id: Uuid::new_v4(),
                    github_id: new.github_id.clone(),
                    name: new.name.clone(),
                    full_name: new.full_name.clone(),
                    html_url: new.html_url.clone(),
                    description: new.description.clone(),
                    language: new.language.clone(),
                    private: new.private,
                    fork: new.fork,
                    auto_audit: false,
                    owner_id,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }),
            }
        }
        Ok(repos.len() as u64)
    }

    async fn find_owned_repo(&self, owner_id: Uuid, github_id: &str) -> AppResult<Option<Repo>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .repos
            .iter()
            .find(|r| r.owner_id == owner_id && r.github_id == github_id)
            .cloned())
    }

    async fn insert_commits(&self, repo_id: Uuid, commits: &[NewCommit]) -> AppResult<u64> {
        let mut state = self.state.lock().unwrap();
        let mut inserted = 0;
        for new in commits {
            if state.commits.iter().any(|c| c.sha == new.sha) {
                continue;
            }
            state.commits.push(Commit {
                id: Uuid::new_v4(),
                sha: new.sha.clone(),
                message: new.message.clone(),
                author: new.author.clone(),
                date: new.date,
                repo_id,
                created_at: Utc::now(),
            });
            inserted += 1;
        }
        Ok(inserted)
    }
}
