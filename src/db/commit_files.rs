//! Database queries for commit files.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::commit_file::{self, ActiveModel, Entity as CommitFileEntity};
use crate::error::AppResult;
use crate::models::{CommitFile, FileContent};

use super::DbPool;

impl DbPool {
    /// List stored files of a commit, ordered by path.
    pub async fn list_commit_files(&self, sha: &str) -> AppResult<Vec<CommitFile>> {
        let rows = CommitFileEntity::find()
            .filter(commit_file::Column::Sha.eq(sha))
            .order_by_asc(commit_file::Column::Path)
            .all(self.connection())
            .await?;

        rows.into_iter().map(model_to_commit_file).collect()
    }

    /// Insert a commit file row.
    ///
    /// A row already present for `(sha, path)` yields `AppError::Conflict`.
    pub async fn insert_commit_file(
        &self,
        commit_id: Uuid,
        file: &CommitFile,
    ) -> AppResult<CommitFile> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            sha: Set(file.sha.clone()),
            path: Set(file.path.clone()),
            content: Set(file.content.to_json()?),
            commit_id: Set(commit_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(self.connection()).await?;
        model_to_commit_file(inserted)
    }

    /// Replace the content of the row keyed by `(sha, path)`.
    pub async fn update_commit_file(
        &self,
        sha: &str,
        path: &str,
        content: &FileContent,
    ) -> AppResult<Option<CommitFile>> {
        let existing = CommitFileEntity::find()
            .filter(commit_file::Column::Sha.eq(sha))
            .filter(commit_file::Column::Path.eq(path))
            .one(self.connection())
            .await?;

        let Some(m) = existing else {
            return Ok(None);
        };

        let mut active: ActiveModel = m.into();
        active.content = Set(content.to_json()?);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.connection()).await?;

        model_to_commit_file(updated).map(Some)
    }
}

fn model_to_commit_file(m: commit_file::Model) -> AppResult<CommitFile> {
    Ok(CommitFile {
        id: Some(m.id),
        sha: m.sha,
        path: m.path,
        content: FileContent::from_json(m.content)?,
    })
}
