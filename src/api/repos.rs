//! Repository API handlers.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::auth::SessionUser;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuditToggleRequest, GitHubRepoListResponse, Pagination, PaginationParams, Repo,
    RepoListResponse, SaveRepoRequest, SyncReposResponse,
};
use crate::services::github_api::GitHubClient;
use crate::services::repo_sync;

/// Response for saving a single repository.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveRepoResponse {
    pub message: String,
    pub repo: Repo,
}

/// Response for toggling auto-audit.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditToggleResponse {
    pub message: String,
    pub auto_audit: bool,
}

/// Response for repository deletion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteReposResponse {
    pub message: String,
    pub deleted: u64,
}

/// List the caller's repositories straight from GitHub.
#[utoipa::path(
    get,
    path = "/api/v1/repos",
    tag = "Repositories",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Results per page (default 9, max 100)")
    ),
    responses(
        (status = 200, description = "Repositories on GitHub", body = GitHubRepoListResponse),
        (status = 401, description = "Not signed in or no GitHub token", body = crate::error::ErrorResponse),
        (status = 502, description = "GitHub unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_github_repos(
    session: SessionUser,
    pool: web::Data<DbPool>,
    github: web::Data<GitHubClient>,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    let user = session.load(&pool).await?;
    let token = repo_sync::user_token(&user)?;
    let repos = repo_sync::list_all_repos(github.get_ref(), token).await?;

    let total = repos.len() as u64;
    let data = repos
        .into_iter()
        .skip(query.offset() as usize)
        .take(query.clamped_limit() as usize)
        .collect();

    Ok(HttpResponse::Ok().json(GitHubRepoListResponse {
        data,
        pagination: Pagination::new(query.page(), query.clamped_limit(), total),
    }))
}

/// List the caller's stored repositories.
#[utoipa::path(
    get,
    path = "/api/v1/repos/all-db",
    tag = "Repositories",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<u64>, Query, description = "Results per page (default 9, max 100)")
    ),
    responses(
        (status = 200, description = "Stored repositories", body = RepoListResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_stored_repos(
    session: SessionUser,
    pool: web::Data<DbPool>,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    let (data, total) = pool
        .list_repos_by_owner(session.user_id, query.offset(), query.clamped_limit())
        .await?;

    Ok(HttpResponse::Ok().json(RepoListResponse {
        data,
        pagination: Pagination::new(query.page(), query.clamped_limit(), total),
    }))
}

/// Mirror all of the caller's GitHub repositories into the store.
#[utoipa::path(
    post,
    path = "/api/v1/repos/sync",
    tag = "Repositories",
    responses(
        (status = 200, description = "Repositories synced", body = SyncReposResponse),
        (status = 401, description = "Not signed in or no GitHub token", body = crate::error::ErrorResponse),
        (status = 502, description = "GitHub unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn sync_repos(
    session: SessionUser,
    pool: web::Data<DbPool>,
    github: web::Data<GitHubClient>,
) -> AppResult<HttpResponse> {
    let user = session.load(&pool).await?;
    let count = repo_sync::sync_repositories(github.get_ref(), pool.get_ref(), &user).await?;

    Ok(HttpResponse::Ok().json(SyncReposResponse {
        message: format!("Synced {} repositories successfully", count),
        count,
    }))
}

/// Save one repository with auto-audit enabled.
#[utoipa::path(
    post,
    path = "/api/v1/repos/save",
    tag = "Repositories",
    request_body = SaveRepoRequest,
    responses(
        (status = 201, description = "Repository saved", body = SaveRepoResponse),
        (status = 400, description = "Invalid body or repository already saved", body = crate::error::ErrorResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorResponse),
    )
)]
pub async fn save_repo(
    session: SessionUser,
    pool: web::Data<DbPool>,
    body: web::Json<SaveRepoRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    body.validate()?;
    let new_repo = body.into_new_repo();

    let already_saved = || AppError::InvalidInput("Repository already saved".to_string());

    if pool
        .find_repo_by_github_id(&new_repo.github_id)
        .await?
        .is_some()
    {
        return Err(already_saved());
    }

    let repo = match pool.insert_repo(session.user_id, &new_repo, true).await {
        Ok(repo) => repo,
        Err(AppError::Conflict(_)) => return Err(already_saved()),
        Err(e) => return Err(e),
    };

    info!(repo = %repo.full_name, user = %session.username, "Repository saved");

    Ok(HttpResponse::Created().json(SaveRepoResponse {
        message: "Repository saved successfully".to_string(),
        repo,
    }))
}

/// Enable or disable automated audits for a repository.
#[utoipa::path(
    patch,
    path = "/api/v1/repos/{full_name}/audit",
    tag = "Repositories",
    params(
        ("full_name" = String, Path, description = "Repository name or owner/name")
    ),
    request_body = AuditToggleRequest,
    responses(
        (status = 200, description = "Flag updated", body = AuditToggleResponse),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn set_auto_audit(
    session: SessionUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<AuditToggleRequest>,
) -> AppResult<HttpResponse> {
    let name = path.into_inner();
    let enabled = body.auto_audit;

    let updated = pool.set_auto_audit(session.user_id, &name, enabled).await?;
    if updated == 0 {
        return Err(AppError::NotFound(format!("Repository {}", name)));
    }

    Ok(HttpResponse::Ok().json(AuditToggleResponse {
        message: "Repository updated successfully".to_string(),
        auto_audit: enabled,
    }))
}

/// Delete all of the caller's stored repositories.
#[utoipa::path(
    delete,
    path = "/api/v1/repos/clear",
    tag = "Repositories",
    responses(
        (status = 200, description = "Repositories deleted", body = DeleteReposResponse),
    )
)]
pub async fn clear_repos(
    session: SessionUser,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let deleted = pool.delete_all_repos(session.user_id).await?;
    info!(user = %session.username, deleted, "Stored repositories cleared");

    Ok(HttpResponse::Ok().json(DeleteReposResponse {
        message: "All repositories deleted".to_string(),
        deleted,
    }))
}

/// Delete one stored repository.
#[utoipa::path(
    delete,
    path = "/api/v1/repos/{github_id}",
    tag = "Repositories",
    params(
        ("github_id" = String, Path, description = "GitHub repository id")
    ),
    responses(
        (status = 200, description = "Repository deleted", body = DeleteReposResponse),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_repo(
    session: SessionUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let github_id = path.into_inner();
    if !pool.delete_repo(session.user_id, &github_id).await? {
        return Err(AppError::NotFound(format!("Repository {}", github_id)));
    }

    Ok(HttpResponse::Ok().json(DeleteReposResponse {
        message: "Repository deleted".to_string(),
        deleted: 1,
    }))
}

/// Get one stored repository.
#[utoipa::path(
    get,
    path = "/api/v1/repos/{github_id}",
    tag = "Repositories",
    params(
        ("github_id" = String, Path, description = "GitHub repository id")
    ),
    responses(
        (status = 200, description = "Repository", body = Repo),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_repo(
    session: SessionUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let github_id = path.into_inner();
    let repo = pool
        .find_owned_repo(session.user_id, &github_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Repository {}", github_id)))?;

    Ok(HttpResponse::Ok().json(repo))
}

/// Configure repository routes. Static segments are registered before
/// `{github_id}` so they are not captured by it.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/repos").route(web::get().to(list_github_repos)))
        .service(web::resource("/repos/all-db").route(web::get().to(list_stored_repos)))
        .service(web::resource("/repos/sync").route(web::post().to(sync_repos)))
        .service(web::resource("/repos/save").route(web::post().to(save_repo)))
        .service(web::resource("/repos/clear").route(web::delete().to(clear_repos)))
        .service(
            web::resource("/repos/{full_name:.+}/audit").route(web::patch().to(set_auto_audit)),
        )
        .service(
            web::resource("/repos/{github_id}")
                .route(web::get().to(get_repo))
                .route(web::delete().to(delete_repo)),
        );
}
