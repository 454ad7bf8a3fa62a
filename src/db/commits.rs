//! Database queries for commits.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use secrecy::SecretString;
use uuid::Uuid;

use crate::entity::commit::{self, ActiveModel, Entity as CommitEntity};
use crate::entity::repo::Entity as RepoEntity;
use crate::entity::user::Entity as UserEntity;
use crate::error::{AppError, AppResult};
use crate::models::{Commit, NewCommit};

use super::{CommitContext, DbPool};

impl DbPool {
    /// Insert commits, skipping any SHA already stored.
    pub async fn insert_commits(&self, repo_id: Uuid, commits: &[NewCommit]) -> AppResult<u64> {
        if commits.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let models = commits.iter().map(|c| ActiveModel {
            id: Set(Uuid::new_v4()),
            sha: Set(c.sha.clone()),
            message: Set(c.message.clone()),
            author: Set(c.author.clone()),
            date: Set(c.date),
            repo_id: Set(repo_id),
            created_at: Set(now),
        });

        let inserted = CommitEntity::insert_many(models)
            .on_conflict(OnConflict::column(commit::Column::Sha).do_nothing().to_owned())
            .exec_without_returning(self.connection())
            .await?;

        Ok(inserted)
    }

    /// List commits of a repository, newest first.
    pub async fn list_commits_by_repo(&self, repo_id: Uuid) -> AppResult<Vec<Commit>> {
        let rows = CommitEntity::find()
            .filter(commit::Column::RepoId.eq(repo_id))
            .order_by_desc(commit::Column::Date)
            .all(self.connection())
            .await?;

        Ok(rows.into_iter().map(model_to_commit).collect())
    }

    /// Load a commit together with its repository and the repo owner's token.
    pub async fn find_commit_context(&self, sha: &str) -> AppResult<Option<CommitContext>> {
        let found = CommitEntity::find()
            .filter(commit::Column::Sha.eq(sha))
            .find_also_related(RepoEntity)
            .one(self.connection())
            .await?;

        let Some((commit_model, repo_model)) = found else {
            return Ok(None);
        };

        let repo_model = repo_model.ok_or_else(|| {
            AppError::Database(format!("Commit {} has no repository", commit_model.sha))
        })?;

        let owner = UserEntity::find_by_id(repo_model.owner_id)
            .one(self.connection())
            .await?;

        Ok(Some(CommitContext {
            commit: model_to_commit(commit_model),
            repo_full_name: repo_model.full_name,
            owner_token: owner
                .and_then(|u| u.access_token)
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
        }))
    }
}

pub(crate) fn model_to_commit(m: commit::Model) -> Commit {
    Commit {
        id: m.id,
        sha: m.sha,
        message: m.message,
        author: m.author,
        date: m.date,
        repo_id: m.repo_id,
        created_at: m.created_at,
    }
}
