//! AI analysis relay models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Analysis type used when the caller does not name one.
pub const DEFAULT_ANALYSIS_TYPE: &str = "audit";

/// Analysis type used for whole-commit analysis.
pub const COMMIT_ANALYSIS_TYPE: &str = "commit";

/// Request body for `POST /commits/analyze`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Code or diff text to analyze
    pub code: Option<String>,
    /// Commit the text belongs to, echoed back for correlation
    pub sha: Option<String>,
    /// Prompt flavour understood by the analysis service
    pub analysis_type: Option<String>,
}

impl AnalyzeRequest {
    pub fn analysis_type(&self) -> &str {
        self.analysis_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_ANALYSIS_TYPE)
    }
}

/// Request body for `POST /commits/{sha}/analyze`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeCommitRequest {
    /// Overrides the default `commit` analysis type
    pub analysis_type: Option<String>,
}

/// A corrected code snippet keyed by issue number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CorrectedExample {
    pub issue: u32,
    pub code: String,
}

/// Relay response returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub message: String,
    pub analysis: String,
    pub analysis_type: String,
    pub sha: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub corrected_examples: Vec<CorrectedExample>,
}

/// Body posted to the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAnalyzeRequest<'a> {
    pub code: &'a str,
    pub analysis_type: &'a str,
}

/// Body returned by the analysis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAnalyzeResponse {
    pub analysis: String,
    #[serde(default)]
    pub corrected_examples: Option<Vec<CorrectedExample>>,
}
