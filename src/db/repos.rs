//! Database queries for repositories.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entity::repo::{self, ActiveModel, Entity as RepoEntity};
use crate::error::AppResult;
use crate::models::{NewRepo, Repo};

use super::DbPool;

/// Columns refreshed from GitHub on every sync. `auto_audit` and the owner
/// are never overwritten.
const MIRRORED_COLUMNS: [repo::Column; 8] = [
    repo::Column::Name,
    repo::Column::FullName,
    repo::Column::HtmlUrl,
    repo::Column::Description,
    repo::Column::Language,
    repo::Column::Private,
    repo::Column::Fork,
    repo::Column::UpdatedAt,
];

fn new_active_model(owner_id: Uuid, repo: &NewRepo, auto_audit: bool) -> ActiveModel {
    let now = Utc::now();
    ActiveModel {
        id: Set(Uuid::new_v4()),
        github_id: Set(repo.github_id.clone()),
        name: Set(repo.name.clone()),
        full_name: Set(repo.full_name.clone()),
        html_url: Set(repo.html_url.clone()),
        description: Set(repo.description.clone()),
        language: Set(repo.language.clone()),
        private: Set(repo.private),
        fork: Set(repo.fork),
        auto_audit: Set(auto_audit),
        owner_id: Set(owner_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

impl DbPool {
    /// Insert or refresh repositories by GitHub id.
    ///
    /// New rows start with `auto_audit = false`.
    pub async fn upsert_repos(&self, owner_id: Uuid, repos: &[NewRepo]) -> AppResult<u64> {
        if repos.is_empty() {
            return Ok(0);
        }

        let models = repos
            .iter()
            .map(|r| new_active_model(owner_id, r, false))
            .collect::<Vec<_>>();

        let affected = RepoEntity::insert_many(models)
            .on_conflict(
                OnConflict::column(repo::Column::GithubId)
                    .update_columns(MIRRORED_COLUMNS)
                    .to_owned(),
            )
            .exec_without_returning(self.connection())
            .await?;

        Ok(affected)
    }

    /// Insert a single repository. Fails with `Conflict` when the GitHub id
    /// is already stored.
    pub async fn insert_repo(
        &self,
        owner_id: Uuid,
        repo: &NewRepo,
        auto_audit: bool,
    ) -> AppResult<Repo> {
        let model = new_active_model(owner_id, repo, auto_audit)
            .insert(self.connection())
            .await?;
        Ok(model_to_repo(model))
    }

    /// Get a repository by GitHub id.
    pub async fn find_repo_by_github_id(&self, github_id: &str) -> AppResult<Option<Repo>> {
        let result = RepoEntity::find()
            .filter(repo::Column::GithubId.eq(github_id))
            .one(self.connection())
            .await?;
        Ok(result.map(model_to_repo))
    }

    /// Get a repository by GitHub id, scoped to its owner.
    pub async fn find_owned_repo(&self, owner_id: Uuid, github_id: &str) -> AppResult<Option<Repo>> {
        let result = RepoEntity::find()
            .filter(repo::Column::GithubId.eq(github_id))
            .filter(repo::Column::OwnerId.eq(owner_id))
            .one(self.connection())
            .await?;
        Ok(result.map(model_to_repo))
    }

    /// List an owner's repositories, newest first.
    pub async fn list_repos_by_owner(
        &self,
        owner_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> AppResult<(Vec<Repo>, u64)> {
        let total = RepoEntity::find()
            .filter(repo::Column::OwnerId.eq(owner_id))
            .count(self.connection())
            .await?;

        let rows = RepoEntity::find()
            .filter(repo::Column::OwnerId.eq(owner_id))
            .order_by_desc(repo::Column::CreatedAt)
            .order_by_asc(repo::Column::FullName)
            .offset(offset)
            .limit(limit)
            .all(self.connection())
            .await?;

        Ok((rows.into_iter().map(model_to_repo).collect(), total))
    }

    /// Set the auto-audit flag on repositories matching `name` (short or
    /// `owner/name` form). Returns the number of rows changed.
    pub async fn set_auto_audit(&self, owner_id: Uuid, name: &str, enabled: bool) -> AppResult<u64> {
        let result = RepoEntity::update_many()
            .col_expr(repo::Column::AutoAudit, Expr::value(enabled))
            .filter(repo::Column::OwnerId.eq(owner_id))
            .filter(
                Condition::any()
                    .add(repo::Column::FullName.eq(name))
                    .add(repo::Column::Name.eq(name)),
            )
            .exec(self.connection())
            .await?;
        Ok(result.rows_affected)
    }

    /// Delete one repository of an owner. Commits and files cascade.
    pub async fn delete_repo(&self, owner_id: Uuid, github_id: &str) -> AppResult<bool> {
        let result = RepoEntity::delete_many()
            .filter(repo::Column::GithubId.eq(github_id))
            .filter(repo::Column::OwnerId.eq(owner_id))
            .exec(self.connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Delete every repository of an owner.
    pub async fn delete_all_repos(&self, owner_id: Uuid) -> AppResult<u64> {
        let result = RepoEntity::delete_many()
            .filter(repo::Column::OwnerId.eq(owner_id))
            .exec(self.connection())
            .await?;
        Ok(result.rows_affected)
    }
}

pub(crate) fn model_to_repo(m: repo::Model) -> Repo {
    Repo {
        id: m.id,
        github_id: m.github_id,
        name: m.name,
        full_name: m.full_name,
        html_url: m.html_url,
        description: m.description,
        language: m.language,
        private: m.private,
        fork: m.fork,
        auto_audit: m.auto_audit,
        owner_id: m.owner_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
