//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "DevScan API",
        version = "0.1.0",
        description = "GitHub repository and commit sync with AI-assisted code review"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Repository endpoints
        api::repos::list_github_repos,
        api::repos::list_stored_repos,
        api::repos::sync_repos,
        api::repos::save_repo,
        api::repos::set_auto_audit,
        api::repos::clear_repos,
        api::repos::delete_repo,
        api::repos::get_repo,
        // Commit endpoints
        api::commits::fetch_commits,
        api::commits::list_commits,
        api::commits::get_commit_details,
        api::commits::refresh_commit_details,
        // Analysis endpoints
        api::analysis::analyze_code,
        api::analysis::analyze_commit,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            models::Pagination,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Auth
            models::UserResponse,
            // Repositories
            models::Repo,
            models::GitHubRepo,
            models::RepoListResponse,
            models::GitHubRepoListResponse,
            models::SyncReposResponse,
            models::SaveRepoRequest,
            models::AuditToggleRequest,
            api::repos::SaveRepoResponse,
            api::repos::AuditToggleResponse,
            api::repos::DeleteReposResponse,
            // Commits
            models::Commit,
            models::CommitListResponse,
            models::FetchCommitsResponse,
            models::CommitFileResponse,
            models::CommitInfo,
            models::CommitDetailsResponse,
            // Analysis
            models::AnalyzeRequest,
            models::AnalyzeCommitRequest,
            models::AnalyzeResponse,
            models::CorrectedExample,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Repositories", description = "GitHub repository listing and mirroring"),
        (name = "Commits", description = "Commit history and per-file changes"),
        (name = "Analysis", description = "AI code analysis relay")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the session cookie security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Cookie(
                        utoipa::openapi::security::ApiKeyValue::new(
                            crate::services::github_oauth::SESSION_COOKIE,
                        ),
                    ),
                ),
            );
        }
    }
}
