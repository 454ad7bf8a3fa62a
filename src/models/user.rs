//! User models for GitHub OAuth authentication.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User stored in database.
///
/// The GitHub access token stays wrapped so it never reaches logs or
/// response bodies.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub github_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub access_token: Option<SecretString>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// User info response (returned by /auth/me).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub github_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    /// Whether a GitHub token is on file for API calls
    pub github_connected: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            github_id: u.github_id,
            username: u.username,
            display_name: u.display_name,
            avatar_url: u.avatar_url,
            email: u.email,
            github_connected: u.access_token.is_some(),
        }
    }
}

/// GitHub user info from API.
#[derive(Debug, Deserialize)]
pub struct GitHubUserInfo {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

/// GitHub email entry from `/user/emails`.
#[derive(Debug, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub user_id: String,
    pub username: String,
}
