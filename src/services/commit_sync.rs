//! Commit file synchronization.
//!
//! Reconciles the files GitHub reports for a commit with the rows stored
//! for it. The store is keyed by `(sha, path)`; every write is
//! create-then-update-on-conflict, so concurrent callers racing on one SHA
//! converge on a single row per file without any in-process locking.

use std::collections::{HashMap, HashSet};

use futures_util::StreamExt;
use futures_util::stream;
use secrecy::SecretString;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{CommitContext, CommitFileStore};
use crate::error::{AppError, AppResult};
use crate::models::github::GitHubCommitFile;
use crate::models::{CommitFile, CommitInfo, FileContent, FileStatus};
use crate::services::github_api::SourceApi;

/// Whether stored rows may answer the request on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Return stored rows when any exist; contact GitHub only on a miss.
    StoreFirst,
    /// Always consult GitHub and back-fill missing rows.
    Refresh,
}

/// Where a details result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsSource {
    Store,
    Upstream,
}

/// Tunables for a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub file_concurrency: usize,
    pub patch_preview_chars: usize,
    /// Used when the repository owner has no token on file
    pub service_token: Option<SecretString>,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            file_concurrency: config.sync.file_concurrency.max(1),
            patch_preview_chars: config.sync.patch_preview_chars,
            service_token: config.github_api.service_token.clone(),
        }
    }
}

/// Result of a sync run: path-ordered files plus commit metadata.
#[derive(Debug, Clone)]
pub struct CommitDetails {
    pub files: Vec<CommitFile>,
    pub info: CommitInfo,
    pub source: DetailsSource,
}

/// Return the files of commit `sha`, fetching and persisting them as needed.
pub async fn sync_commit_files(
    source: &dyn SourceApi,
    store: &dyn CommitFileStore,
    options: &SyncOptions,
    sha: &str,
    mode: SyncMode,
) -> AppResult<CommitDetails> {
    let ctx = store
        .find_commit_context(sha)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Commit {}", sha)))?;

    let stored = store.list_files(sha).await?;

    if mode == SyncMode::StoreFirst && !stored.is_empty() {
        debug!(sha = %sha, files = stored.len(), "Commit files served from store");
        let info = CommitInfo::new(
            sha,
            ctx.commit.message.clone(),
            ctx.commit.author.clone(),
            ctx.commit.date,
            &stored,
        );
        return Ok(CommitDetails {
            files: stored,
            info,
            source: DetailsSource::Store,
        });
    }

    let token = resolve_token(&ctx, options)?;

    let detail = source
        .get_commit_detail(&ctx.repo_full_name, sha, &token)
        .await?;

    let message = detail.commit.message.clone();
    let author = detail.commit.author_name();
    let date = detail.commit.date().unwrap_or(ctx.commit.date);

    if detail.files.is_empty() {
        info!(sha = %sha, "GitHub reports no file changes for commit");
        return Ok(CommitDetails {
            info: CommitInfo::new(sha, message, author, date, &[]),
            files: Vec::new(),
            source: DetailsSource::Upstream,
        });
    }

    let preview_chars = options.patch_preview_chars;
    let normalized: Vec<CommitFile> = stream::iter(detail.files)
        .map(|file| normalize_file(source, &token, sha, file, preview_chars))
        .buffer_unordered(options.file_concurrency)
        .collect()
        .await;

    let mut known: HashMap<String, CommitFile> = stored
        .into_iter()
        .map(|f| (f.path.clone(), f))
        .collect();

    let mut files = Vec::with_capacity(normalized.len());
    let mut fresh = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for file in normalized {
        if let Some(existing) = known.remove(&file.path) {
            files.push(existing);
        } else if seen.insert(file.path.clone()) {
            fresh.push(file);
        }
    }

    let fresh_count = fresh.len();
    let commit_id = ctx.commit.id;
    let persisted: Vec<CommitFile> = stream::iter(fresh)
        .map(|file| persist_file(store, commit_id, file))
        .buffer_unordered(options.file_concurrency)
        .collect()
        .await;
    files.extend(persisted);

    files.sort_by(|a, b| a.path.cmp(&b.path));

    info!(
        sha = %sha,
        files = files.len(),
        new_files = fresh_count,
        "Commit files reconciled with GitHub"
    );

    let info = CommitInfo::new(sha, message, author, date, &files);
    Ok(CommitDetails {
        files,
        info,
        source: DetailsSource::Upstream,
    })
}

fn resolve_token(ctx: &CommitContext, options: &SyncOptions) -> AppResult<SecretString> {
    ctx.owner_token
        .clone()
        .or_else(|| options.service_token.clone())
        .ok_or(AppError::CredentialMissing)
}

/// Create the row, falling back to an update when `(sha, path)` already
/// exists. A file that cannot be written either way is returned without an id.
async fn persist_file(store: &dyn CommitFileStore, commit_id: Uuid, file: CommitFile) -> CommitFile {
    match store.create_file(commit_id, &file).await {
        Ok(row) => return row,
        Err(AppError::Conflict(_)) => {
            debug!(sha = %file.sha, path = %file.path, "Commit file already stored, updating");
        }
        Err(e) => {
            warn!(sha = %file.sha, path = %file.path, "Commit file create failed, trying update: {}", e);
        }
    }

    match store.update_file(&file.sha, &file.path, &file.content).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            error!(sha = %file.sha, path = %file.path, "Commit file could not be created or updated");
            file
        }
        Err(e) => {
            error!(sha = %file.sha, path = %file.path, "Commit file update failed: {}", e);
            file
        }
    }
}

/// Turn one upstream file into a commit file with a guaranteed non-empty patch.
async fn normalize_file(
    source: &dyn SourceApi,
    token: &SecretString,
    sha: &str,
    file: GitHubCommitFile,
    preview_chars: usize,
) -> CommitFile {
    let path = normalize_path(&file.filename);
    let mut patch = file.patch.clone().unwrap_or_default();

    if patch.trim().is_empty()
        && let Some(raw_url) = file.raw_url.as_deref().filter(|u| !u.is_empty())
    {
        patch = match source.get_raw_blob(raw_url, token).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) if !text.trim().is_empty() => {
                    preview_patch(&path, file.status, &text, preview_chars)
                }
                Ok(_) => String::new(),
                Err(_) => inaccessible_patch(&path),
            },
            Err(e) => {
                debug!(sha = %sha, path = %path, "Raw content fetch failed: {}", e);
                inaccessible_patch(&path)
            }
        };
    }

    if patch.trim().is_empty() {
        patch = placeholder_patch(&path, file.status);
    }

    CommitFile {
        id: None,
        sha: sha.to_string(),
        path,
        content: FileContent {
            status: file.status,
            additions: file.additions,
            deletions: file.deletions,
            changes: file.changes,
            patch,
            raw_url: file.raw_url,
            filename: file.filename,
        },
    }
}

/// Forward-slash form of a path as reported by GitHub.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Patch text built from raw file content when GitHub sent no diff.
pub fn preview_patch(path: &str, status: FileStatus, text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    let truncated = text.chars().nth(max_chars).is_some();
    format!(
        "// File: {}\n// Status: {}\n\n{}{}",
        path,
        status,
        head,
        if truncated {
            "\n// ... (content truncated)"
        } else {
            ""
        }
    )
}

fn inaccessible_patch(path: &str) -> String {
    format!("// Binary or inaccessible file: {}", path)
}

/// Placeholder when neither a diff nor readable content is available.
pub fn placeholder_patch(path: &str, status: FileStatus) -> String {
    match status {
        FileStatus::Added => format!("// NEW FILE: {}", path),
        FileStatus::Removed => format!("// DELETED FILE: {}", path),
        FileStatus::Renamed => format!("// RENAMED FILE: {}", path),
        FileStatus::Modified => format!(
            "// Modified file with no text diff - possibly binary: {}",
            path
        ),
    }
}
