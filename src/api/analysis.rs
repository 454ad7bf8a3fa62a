//! AI analysis relay handlers.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use tracing::info;

use crate::auth::SessionUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::analysis::COMMIT_ANALYSIS_TYPE;
use crate::models::{AnalyzeCommitRequest, AnalyzeRequest, AnalyzeResponse};
use crate::services::analysis::{AnalysisClient, AnalysisOutcome, build_commit_context};
use crate::services::commit_sync::{self, SyncMode, SyncOptions};
use crate::services::github_api::GitHubClient;

/// Relay a code snippet to the analysis service.
#[utoipa::path(
    post,
    path = "/api/v1/commits/analyze",
    tag = "Analysis",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis completed", body = AnalyzeResponse),
        (status = 400, description = "No code supplied", body = crate::error::ErrorResponse),
        (status = 408, description = "Analysis took too long", body = crate::error::ErrorResponse),
        (status = 502, description = "Analysis failed", body = crate::error::ErrorResponse),
        (status = 503, description = "Analysis service unreachable", body = crate::error::ErrorResponse),
    )
)]
pub async fn analyze_code(
    _session: SessionUser,
    client: web::Data<AnalysisClient>,
    body: web::Json<AnalyzeRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let analysis_type = request.analysis_type().to_string();
    let code = request.code.as_deref().unwrap_or_default();

    let outcome = client.analyze(code, &analysis_type).await?;

    Ok(HttpResponse::Ok().json(analysis_response(outcome, analysis_type, request.sha)))
}

/// Analyze every changed file of a commit in one request.
#[utoipa::path(
    post,
    path = "/api/v1/commits/{sha}/analyze",
    tag = "Analysis",
    params(
        ("sha" = String, Path, description = "Commit SHA")
    ),
    request_body = AnalyzeCommitRequest,
    responses(
        (status = 200, description = "Analysis completed", body = AnalyzeResponse),
        (status = 400, description = "Commit has no file changes", body = crate::error::ErrorResponse),
        (status = 404, description = "Commit not found", body = crate::error::ErrorResponse),
        (status = 408, description = "Analysis took too long", body = crate::error::ErrorResponse),
        (status = 503, description = "Analysis service unreachable", body = crate::error::ErrorResponse),
    )
)]
pub async fn analyze_commit(
    session: SessionUser,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    github: web::Data<GitHubClient>,
    client: web::Data<AnalysisClient>,
    path: web::Path<String>,
    body: Option<web::Json<AnalyzeCommitRequest>>,
) -> AppResult<HttpResponse> {
    let sha = path.into_inner();
    let analysis_type = body
        .and_then(|b| b.into_inner().analysis_type)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| COMMIT_ANALYSIS_TYPE.to_string());

    let details = commit_sync::sync_commit_files(
        github.get_ref(),
        pool.get_ref(),
        &SyncOptions::from_config(&config),
        &sha,
        SyncMode::StoreFirst,
    )
    .await?;

    if details.files.is_empty() {
        return Err(AppError::InvalidInput(
            "Commit has no file changes to analyze".to_string(),
        ));
    }

    info!(
        sha = %sha,
        files = details.files.len(),
        user = %session.username,
        "Analyzing commit"
    );

    let context = build_commit_context(&details.info, &details.files);
    let outcome = client.analyze(&context, &analysis_type).await?;

    Ok(HttpResponse::Ok().json(analysis_response(outcome, analysis_type, Some(sha))))
}

fn analysis_response(
    outcome: AnalysisOutcome,
    analysis_type: String,
    sha: Option<String>,
) -> AnalyzeResponse {
    AnalyzeResponse {
        message: "Code analysis completed".to_string(),
        analysis: outcome.analysis,
        analysis_type,
        sha,
        timestamp: Utc::now(),
        corrected_examples: outcome.corrected_examples,
    }
}
