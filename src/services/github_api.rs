//! GitHub REST client.
//!
//! All JSON calls go through one retrying GET. Only network failures and
//! non-2xx statuses other than 401/404 are retried, with exponential
//! backoff bounded by `DEVSCAN_GITHUB_MAX_ATTEMPTS`. Raw blob downloads are
//! a single attempt with their own short timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

use crate::config::GitHubApiSettings;
use crate::error::{AppError, AppResult};
use crate::models::github::{
    GitHubCommitDetail, GitHubCommitSummary, GitHubRepo, parse_payload,
};
use crate::models::user::{GitHubEmail, GitHubUserInfo};

/// Sent with every request; GitHub rejects requests without a User-Agent.
pub const USER_AGENT: &str = "devscan";
const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: (&str, &str) = ("X-GitHub-Api-Version", "2022-11-28");
const MAX_BACKOFF: Duration = Duration::from_secs(5);
/// Page size for repository listing (GitHub maximum).
pub const REPOS_PER_PAGE: u32 = 100;

/// Upstream source of repositories, commits and file contents.
#[async_trait]
pub trait SourceApi: Send + Sync {
    /// One page (1-based) of the token owner's repositories.
    async fn list_repos(&self, token: &SecretString, page: u32) -> AppResult<Vec<GitHubRepo>>;

    /// Most recent commits of `owner/name`.
    async fn list_commits(
        &self,
        full_name: &str,
        per_page: u32,
        token: &SecretString,
    ) -> AppResult<Vec<GitHubCommitSummary>>;

    /// Commit metadata plus per-file diffs.
    async fn get_commit_detail(
        &self,
        full_name: &str,
        sha: &str,
        token: &SecretString,
    ) -> AppResult<GitHubCommitDetail>;

    /// Raw file bytes from a `raw_url`.
    async fn get_raw_blob(&self, url: &str, token: &SecretString) -> AppResult<Vec<u8>>;
}

/// reqwest-backed `SourceApi`.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    max_attempts: usize,
    retry_base_ms: u64,
    raw_fetch_timeout: Duration,
}

impl GitHubClient {
    pub fn new(settings: &GitHubApiSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| {
                AppError::UpstreamUnavailable(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            max_attempts: settings.max_attempts.max(1),
            retry_base_ms: settings.retry_base_ms,
            raw_fetch_timeout: settings.raw_fetch_timeout,
        })
    }

    /// Profile of the token owner (`GET /user`).
    pub async fn get_authenticated_user(&self, token: &SecretString) -> AppResult<GitHubUserInfo> {
        let url = format!("{}/user", self.api_url);
        let body = self.get_with_retry(&url, token, "GitHub user").await?;
        parse_payload(&body, "GitHub user")
    }

    /// Primary verified email of the token owner, if the scope allows it.
    pub async fn get_primary_email(&self, token: &SecretString) -> AppResult<Option<String>> {
        let url = format!("{}/user/emails", self.api_url);
        let body = self.get_with_retry(&url, token, "GitHub user emails").await?;
        let emails: Vec<GitHubEmail> = parse_payload(&body, "GitHub user emails")?;
        Ok(emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email))
    }

    fn backoff(&self) -> impl Iterator<Item = Duration> + use<> {
        // from_millis(2) doubles each step; factor scales the first step to retry_base_ms
        ExponentialBackoff::from_millis(2)
            .factor(self.retry_base_ms.div_ceil(2).max(1))
            .max_delay(MAX_BACKOFF)
            .take(self.max_attempts - 1)
    }

    async fn get_with_retry(&self, url: &str, token: &SecretString, what: &str) -> AppResult<Vec<u8>> {
        let mut attempt = 0usize;
        RetryIf::spawn(
            self.backoff(),
            || {
                attempt += 1;
                debug!(url = %url, attempt, "GitHub GET");
                self.get_once(url, token, None, what)
            },
            |e: &AppError| {
                let retry = e.is_retryable();
                if retry {
                    warn!("{} failed, retrying: {}", what, e);
                }
                retry
            },
        )
        .await
    }

    async fn get_once(
        &self,
        url: &str,
        token: &SecretString,
        timeout: Option<Duration>,
        what: &str,
    ) -> AppResult<Vec<u8>> {
        let mut request = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, GITHUB_JSON)
            .header(API_VERSION_HEADER.0, API_VERSION_HEADER.1);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| transport_error(what, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(what, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(what, &e))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl SourceApi for GitHubClient {
    async fn list_repos(&self, token: &SecretString, page: u32) -> AppResult<Vec<GitHubRepo>> {
        let url = format!(
            "{}/user/repos?per_page={}&visibility=all&page={}",
            self.api_url, REPOS_PER_PAGE, page
        );
        let body = self.get_with_retry(&url, token, "GitHub repositories").await?;
        parse_payload(&body, "GitHub repositories")
    }

    async fn list_commits(
        &self,
        full_name: &str,
        per_page: u32,
        token: &SecretString,
    ) -> AppResult<Vec<GitHubCommitSummary>> {
        let url = format!(
            "{}/repos/{}/commits?per_page={}",
            self.api_url,
            repo_path(full_name),
            per_page
        );
        let what = format!("Repository {}", full_name);
        let body = self.get_with_retry(&url, token, &what).await?;
        parse_payload(&body, &what)
    }

    async fn get_commit_detail(
        &self,
        full_name: &str,
        sha: &str,
        token: &SecretString,
    ) -> AppResult<GitHubCommitDetail> {
        let url = format!(
            "{}/repos/{}/commits/{}",
            self.api_url,
            repo_path(full_name),
            urlencoding::encode(sha)
        );
        let what = format!("Commit {}", sha);
        let body = self.get_with_retry(&url, token, &what).await?;
        let detail: GitHubCommitDetail = parse_payload(&body, &what)?;
        detail.validate()?;
        Ok(detail)
    }

    async fn get_raw_blob(&self, url: &str, token: &SecretString) -> AppResult<Vec<u8>> {
        self.get_once(url, token, Some(self.raw_fetch_timeout), "Raw file")
            .await
    }
}

/// Percent-encode each segment of `owner/name`.
fn repo_path(full_name: &str) -> String {
    full_name
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn status_error(what: &str, status: StatusCode) -> AppError {
    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED => {
            AppError::Unauthorized("GitHub rejected the access token".to_string())
        }
        other => AppError::UpstreamUnavailable(format!("{} returned HTTP {}", what, other)),
    }
}

fn transport_error(what: &str, err: &reqwest::Error) -> AppError {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    AppError::UpstreamUnavailable(format!("{} {}: {}", what, kind, err))
}
