//! Actix-web extractor for the session cookie.
//!
//! The cookie carries an HS256 JWT issued at OAuth login. Only the claims
//! are checked here; handlers that need the stored GitHub token load the
//! user row themselves.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::services::github_oauth::{SESSION_COOKIE, verify_session_token};

/// Authenticated caller, taken from a valid session cookie.
///
/// ```ignore
/// async fn handler(session: SessionUser) -> impl Responder {
///     // session.user_id is the DevScan user id
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub username: String,
}

impl SessionUser {
    /// Load the full user row, including the GitHub token.
    pub async fn load(&self, pool: &DbPool) -> AppResult<User> {
        crate::db::users::find_by_id(pool.connection(), self.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Session user no longer exists".to_string()))
    }
}

impl FromRequest for SessionUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<SessionUser, AppError> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| AppError::Unauthorized("Internal configuration error".to_string()))?;

    let token = req
        .cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

    let claims = verify_session_token(&token, &config.github_oauth.session_secret)
        .map_err(AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&claims.user_id)
        .map_err(|_| AppError::Unauthorized("Malformed session".to_string()))?;

    Ok(SessionUser {
        user_id,
        username: claims.username,
    })
}
