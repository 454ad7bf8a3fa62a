//! Relay to the external AI analysis service.
//!
//! One attempt per call. The request timeout grows with the input size and
//! is clamped to the configured bounds. Failures are mapped to distinct
//! error classes so the client can tell a slow model from a missing one.

use std::fmt::Write as _;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use crate::config::AnalysisSettings;
use crate::error::{AppError, AppResult};
use crate::models::analysis::{ServiceAnalyzeRequest, ServiceAnalyzeResponse};
use crate::models::{CommitFile, CommitInfo, CorrectedExample};

const FILE_SEPARATOR_WIDTH: usize = 80;
const SECTION_SEPARATOR_WIDTH: usize = 72;

static CORRECTED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```corrected-code-(\d+)[^\n]*\n([\s\S]*?)```")
        .expect("corrected-code pattern is valid")
});

/// Analysis text plus any corrected snippets.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub analysis: String,
    pub corrected_examples: Vec<CorrectedExample>,
}

/// HTTP client for the analysis service.
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    analyze_url: String,
    min_timeout: Duration,
    max_timeout: Duration,
    chars_per_sec: u64,
}

impl AnalysisClient {
    pub fn new(settings: &AnalysisSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AppError::AnalysisFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            analyze_url: format!("{}/analyze", settings.service_url.trim_end_matches('/')),
            min_timeout: settings.min_timeout,
            max_timeout: settings.max_timeout,
            chars_per_sec: settings.chars_per_sec,
        })
    }

    /// Timeout applied to an input of `chars` characters.
    pub fn timeout_for(&self, chars: usize) -> Duration {
        scaled_timeout(chars, self.min_timeout, self.max_timeout, self.chars_per_sec)
    }

    /// Send `code` for analysis.
    pub async fn analyze(&self, code: &str, analysis_type: &str) -> AppResult<AnalysisOutcome> {
        if code.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Code is required for analysis".to_string(),
            ));
        }

        let chars = code.chars().count();
        let timeout = self.timeout_for(chars);
        info!(
            analysis_type = %analysis_type,
            chars,
            timeout_secs = timeout.as_secs(),
            "Sending code to analysis service"
        );

        let response = self
            .http
            .post(&self.analyze_url)
            .timeout(timeout)
            .json(&ServiceAnalyzeRequest {
                code,
                analysis_type,
            })
            .send()
            .await
            .map_err(|e| relay_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Analysis service returned HTTP {}", status);
            return Err(AppError::AnalysisFailed(format!(
                "analysis service returned HTTP {}",
                status
            )));
        }

        let body: ServiceAnalyzeResponse = response.json().await.map_err(|e| relay_error(&e))?;

        let corrected_examples = match body.corrected_examples {
            Some(examples) if !examples.is_empty() => examples,
            _ => extract_corrected_examples(&body.analysis),
        };

        Ok(AnalysisOutcome {
            analysis: body.analysis,
            corrected_examples,
        })
    }
}

/// `min + chars / chars_per_sec`, clamped to `[min, max]`.
pub fn scaled_timeout(chars: usize, min: Duration, max: Duration, chars_per_sec: u64) -> Duration {
    let extra_secs = if chars_per_sec == 0 {
        0
    } else {
        chars as u64 / chars_per_sec
    };
    (min + Duration::from_secs(extra_secs)).clamp(min, max.max(min))
}

fn relay_error(err: &reqwest::Error) -> AppError {
    if err.is_timeout() {
        warn!("Analysis request timed out: {}", err);
        AppError::Timeout
    } else if err.is_connect() {
        warn!("Analysis service unreachable: {}", err);
        AppError::ServiceUnavailable
    } else {
        AppError::AnalysisFailed(err.to_string())
    }
}

/// Pull ```` ```corrected-code-N ```` fenced blocks out of analysis text.
pub fn extract_corrected_examples(analysis: &str) -> Vec<CorrectedExample> {
    CORRECTED_BLOCK
        .captures_iter(analysis)
        .filter_map(|caps| {
            let issue = caps.get(1)?.as_str().parse::<u32>().ok()?;
            let code = caps.get(2)?.as_str().trim().to_string();
            Some(CorrectedExample { issue, code })
        })
        .collect()
}

/// Assemble a whole commit into one analysis context.
pub fn build_commit_context(info: &CommitInfo, files: &[CommitFile]) -> String {
    let additions: u64 = files.iter().map(|f| u64::from(f.content.additions)).sum();
    let deletions: u64 = files.iter().map(|f| u64::from(f.content.deletions)).sum();

    let mut out = String::new();
    let _ = writeln!(out, "Commit: {}", info.message);
    let _ = writeln!(out, "Author: {}", info.author);
    let _ = writeln!(out, "Date: {}", info.date.format("%Y-%m-%d"));
    let _ = writeln!(out, "Total Files Changed: {}", files.len());
    let _ = writeln!(out, "Total Additions: +{}", additions);
    let _ = writeln!(out, "Total Deletions: -{}", deletions);
    out.push('\n');
    out.push_str(
        "Analysis: Please review all these files together and identify issues across the entire commit.\n",
    );

    let file_rule = "=".repeat(FILE_SEPARATOR_WIDTH);
    let section_rule = "-".repeat(SECTION_SEPARATOR_WIDTH);
    for (i, file) in files.iter().enumerate() {
        out.push('\n');
        let _ = writeln!(out, "{}", file_rule);
        let _ = writeln!(out, "File {}: {} ({})", i + 1, file.path, file.content.status);
        let _ = writeln!(out, "{}", section_rule);
        let _ = writeln!(
            out,
            "Additions: +{} | Deletions: -{} | Changes: {}",
            file.content.additions, file.content.deletions, file.content.changes
        );
        let _ = writeln!(out, "{}", section_rule);
        let _ = writeln!(out, "{}", file.content.patch);
    }

    out
}
