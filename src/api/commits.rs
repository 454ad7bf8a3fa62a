//! Commit history and commit details handlers.

use actix_web::{HttpResponse, web};
use tracing::info;

use crate::api::analysis;
use crate::auth::SessionUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{CommitDetailsResponse, CommitListResponse, FetchCommitsResponse};
use crate::services::commit_sync::{
    self, CommitDetails, DetailsSource, SyncMode, SyncOptions,
};
use crate::services::github_api::GitHubClient;
use crate::services::repo_sync;

/// Import recent commits of a stored repository from GitHub.
#[utoipa::path(
    get,
    path = "/api/v1/commits/fetch/{github_id}",
    tag = "Commits",
    params(
        ("github_id" = String, Path, description = "GitHub repository id")
    ),
    responses(
        (status = 200, description = "Commits imported", body = FetchCommitsResponse),
        (status = 401, description = "Not signed in or no GitHub token", body = crate::error::ErrorResponse),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse),
        (status = 502, description = "GitHub unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn fetch_commits(
    session: SessionUser,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    github: web::Data<GitHubClient>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let github_id = path.into_inner();
    let user = session.load(&pool).await?;

    let outcome = repo_sync::fetch_commit_history(
        github.get_ref(),
        pool.get_ref(),
        &user,
        config.github_api.service_token.as_ref(),
        &github_id,
        config.sync.commits_per_page,
    )
    .await?;

    Ok(HttpResponse::Ok().json(FetchCommitsResponse {
        message: "Commits fetched successfully".to_string(),
        fetched: outcome.fetched,
        inserted: outcome.inserted,
    }))
}

/// List stored commits of a repository, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/commits/{github_id}",
    tag = "Commits",
    params(
        ("github_id" = String, Path, description = "GitHub repository id")
    ),
    responses(
        (status = 200, description = "Stored commits", body = CommitListResponse),
        (status = 404, description = "Repository not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_commits(
    session: SessionUser,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let github_id = path.into_inner();
    let repo = pool
        .find_owned_repo(session.user_id, &github_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Repository {}", github_id)))?;

    let commits = pool.list_commits_by_repo(repo.id).await?;
    Ok(HttpResponse::Ok().json(CommitListResponse { commits }))
}

/// Per-file changes of a commit. Served from the store when it has them.
#[utoipa::path(
    get,
    path = "/api/v1/commits/{sha}/details",
    tag = "Commits",
    params(
        ("sha" = String, Path, description = "Commit SHA")
    ),
    responses(
        (status = 200, description = "Commit changes", body = CommitDetailsResponse),
        (status = 401, description = "No usable GitHub token", body = crate::error::ErrorResponse),
        (status = 404, description = "Commit not found", body = crate::error::ErrorResponse),
        (status = 502, description = "GitHub unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_commit_details(
    _session: SessionUser,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    github: web::Data<GitHubClient>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let sha = path.into_inner();
    let details = commit_sync::sync_commit_files(
        github.get_ref(),
        pool.get_ref(),
        &SyncOptions::from_config(&config),
        &sha,
        SyncMode::StoreFirst,
    )
    .await?;

    Ok(HttpResponse::Ok().json(details_response(details)))
}

/// Re-read a commit from GitHub and back-fill any missing files.
#[utoipa::path(
    post,
    path = "/api/v1/commits/{sha}/refresh",
    tag = "Commits",
    params(
        ("sha" = String, Path, description = "Commit SHA")
    ),
    responses(
        (status = 200, description = "Commit changes", body = CommitDetailsResponse),
        (status = 401, description = "No usable GitHub token", body = crate::error::ErrorResponse),
        (status = 404, description = "Commit not found", body = crate::error::ErrorResponse),
        (status = 502, description = "GitHub unavailable", body = crate::error::ErrorResponse),
    )
)]
pub async fn refresh_commit_details(
    session: SessionUser,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    github: web::Data<GitHubClient>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let sha = path.into_inner();
    info!(sha = %sha, user = %session.username, "Refreshing commit details");

    let details = commit_sync::sync_commit_files(
        github.get_ref(),
        pool.get_ref(),
        &SyncOptions::from_config(&config),
        &sha,
        SyncMode::Refresh,
    )
    .await?;

    Ok(HttpResponse::Ok().json(details_response(details)))
}

fn details_response(details: CommitDetails) -> CommitDetailsResponse {
    let message = match details.source {
        DetailsSource::Store => "Commit changes retrieved from database",
        DetailsSource::Upstream => "Commit details fetched successfully",
    };

    CommitDetailsResponse {
        message: message.to_string(),
        files: details.files.into_iter().map(Into::into).collect(),
        commit_info: details.info,
    }
}

/// Configure commit and analysis routes.
///
/// `/commits/fetch/..` and `/commits/analyze` must be registered before
/// `/commits/{github_id}` so they are not captured by it.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/commits/fetch/{github_id}").route(web::get().to(fetch_commits)),
    )
    .service(web::resource("/commits/analyze").route(web::post().to(analysis::analyze_code)))
    .service(web::resource("/commits/{sha}/details").route(web::get().to(get_commit_details)))
    .service(
        web::resource("/commits/{sha}/refresh").route(web::post().to(refresh_commit_details)),
    )
    .service(
        web::resource("/commits/{sha}/analyze").route(web::post().to(analysis::analyze_commit)),
    )
    .service(web::resource("/commits/{github_id}").route(web::get().to(list_commits)));
}
