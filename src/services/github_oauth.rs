//! GitHub OAuth routes for web UI authentication.
//!
//! The session is a single HS256 JWT in the `devscan_session` HttpOnly
//! cookie. The GitHub access token obtained at login is stored on the user
//! row and used for all later GitHub API calls on the user's behalf.
//!
//! Endpoints:
//! 1. GET /auth/github: redirect to GitHub (with CSRF `state`)
//! 2. GET /auth/github/callback: verify state, exchange code, upsert user, set session
//! 3. GET /auth/me: current user from the session cookie, or `null`
//! 4. POST /auth/logout: clear the session cookie

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::user::{SessionClaims, UserResponse};
use crate::services::github_api::GitHubClient;

/// Session cookie name (JWT).
pub const SESSION_COOKIE: &str = "devscan_session";
/// OAuth CSRF state cookie: holds the random `state` sent to GitHub,
/// checked on callback.
const OAUTH_STATE_COOKIE: &str = "devscan_oauth_state";
/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "devscan";
const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
/// Private repositories need `repo`; the profile and email need the rest.
const OAUTH_SCOPE: &str = "repo read:user user:email";
const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Configure OAuth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(github_login)
        .service(github_callback)
        .service(get_current_user)
        .service(logout);
}

fn build_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::UpstreamUnavailable(format!("failed to build HTTP client: {}", e)))
}

/// Generate a cryptographically random string.
fn generate_random_hex() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

fn session_cookie<'c>(name: &'c str, value: String, is_production: bool) -> Cookie<'c> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(is_production);
    cookie
}

fn oauth_disabled() -> AppError {
    AppError::InvalidInput("GitHub OAuth is not configured".to_string())
}

// ============================================================================
// Endpoints
// ============================================================================

/// Redirect to GitHub OAuth authorization page.
///
/// GET /api/v1/auth/github
#[get("/auth/github")]
pub async fn github_login(config: web::Data<Config>) -> AppResult<HttpResponse> {
    let oauth = &config.github_oauth;
    if !oauth.enabled {
        return Err(oauth_disabled());
    }

    let client_id = oauth.client_id.as_ref().ok_or_else(|| {
        AppError::InvalidInput("GitHub OAuth client ID not configured".to_string())
    })?;

    let state = generate_random_hex();

    let authorize_url = format!(
        "{}?client_id={}&redirect_uri={}&state={}&scope={}",
        GITHUB_AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(&oauth.redirect_url),
        urlencoding::encode(&state),
        urlencoding::encode(OAUTH_SCOPE),
    );

    let state_cookie =
        session_cookie(OAUTH_STATE_COOKIE, state, config.environment.is_production());

    Ok(HttpResponse::Found()
        .cookie(state_cookie)
        .append_header(("Location", authorize_url))
        .finish())
}

/// Handle GitHub OAuth callback.
///
/// GET /api/v1/auth/github/callback?code=...&state=...
#[get("/auth/github/callback")]
pub async fn github_callback(
    req: HttpRequest,
    query: web::Query<CallbackQuery>,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
    github: web::Data<GitHubClient>,
) -> AppResult<HttpResponse> {
    let oauth = &config.github_oauth;
    if !oauth.enabled {
        return Err(oauth_disabled());
    }

    // --- CSRF state verification ---
    let expected_state = req
        .cookie(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            warn!("OAuth callback: missing state cookie");
            AppError::Unauthorized("OAuth state verification failed".to_string())
        })?;

    let provided_state = query.state.as_deref().unwrap_or("");
    if provided_state.is_empty() || provided_state != expected_state {
        warn!("OAuth callback: state mismatch");
        return Err(AppError::Unauthorized(
            "OAuth state verification failed".to_string(),
        ));
    }

    let client_id = oauth.client_id.as_ref().ok_or_else(|| {
        AppError::InvalidInput("GitHub OAuth client ID not configured".to_string())
    })?;
    let client_secret = oauth.client_secret.as_ref().ok_or_else(|| {
        AppError::InvalidInput("GitHub OAuth client secret not configured".to_string())
    })?;

    // --- Exchange code for access token ---
    let token_response: TokenResponse = build_http_client()?
        .post(GITHUB_TOKEN_URL)
        .header("Accept", "application/json")
        .json(&serde_json::json!({
            "client_id": client_id,
            "client_secret": client_secret.expose_secret(),
            "code": query.code,
            "redirect_uri": oauth.redirect_url,
        }))
        .send()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to exchange code: {}", e);
            AppError::Unauthorized("GitHub authentication failed".to_string())
        })?
        .json()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to parse token response: {}", e);
            AppError::Unauthorized("GitHub authentication failed".to_string())
        })?;

    if let Some(ref err) = token_response.error {
        warn!("OAuth: GitHub returned error: {}", err);
        return Err(AppError::Unauthorized(
            "GitHub authentication failed".to_string(),
        ));
    }

    let gh_access_token: SecretString = token_response
        .access_token
        .filter(|t| !t.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            warn!("OAuth: no access_token in response");
            AppError::Unauthorized("GitHub authentication failed".to_string())
        })?;

    // --- Fetch user info ---
    let user_info = github
        .get_authenticated_user(&gh_access_token)
        .await
        .map_err(|e| {
            warn!("OAuth: failed to fetch user info: {}", e);
            AppError::Unauthorized("GitHub authentication failed".to_string())
        })?;

    // Private profile emails are only visible through /user/emails
    let email = match user_info.email.clone() {
        Some(email) => Some(email),
        None => github
            .get_primary_email(&gh_access_token)
            .await
            .unwrap_or_else(|e| {
                warn!("OAuth: could not read user emails: {}", e);
                None
            }),
    };

    // --- Upsert user in DB (with token) ---
    let user = crate::db::users::upsert_from_github(
        pool.connection(),
        &user_info,
        email.as_deref(),
        &gh_access_token,
    )
    .await?;

    info!(
        "GitHub OAuth login: user='{}' (id={})",
        user.username, user.id
    );

    // --- Issue session ---
    let is_prod = config.environment.is_production();
    let token = create_session_token(
        user.id,
        &user.username,
        &oauth.session_secret,
        oauth.session_ttl_secs,
    )?;

    let mut session = session_cookie(SESSION_COOKIE, token, is_prod);
    session.set_max_age(actix_web::cookie::time::Duration::seconds(
        oauth.session_ttl_secs as i64,
    ));

    Ok(HttpResponse::Found()
        .cookie(session)
        .cookie(session_cookie(OAUTH_STATE_COOKIE, String::new(), is_prod))
        .append_header(("Location", oauth.frontend_url.clone()))
        .finish())
}

/// Get current authenticated user from the session cookie.
///
/// GET /api/v1/auth/me
#[get("/auth/me")]
pub async fn get_current_user(
    req: HttpRequest,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let null_user = || HttpResponse::Ok().json(serde_json::json!({ "user": null }));

    let token = match req.cookie(SESSION_COOKIE) {
        Some(c) if !c.value().is_empty() => c.value().to_string(),
        _ => return Ok(null_user()),
    };

    let claims = match verify_session_token(&token, &config.github_oauth.session_secret) {
        Ok(c) => c,
        Err(_) => return Ok(null_user()),
    };

    let Ok(user_id) = Uuid::parse_str(&claims.user_id) else {
        return Ok(null_user());
    };

    match crate::db::users::find_by_id(pool.connection(), user_id).await? {
        Some(u) => {
            let response: UserResponse = u.into();
            Ok(HttpResponse::Ok().json(serde_json::json!({ "user": response })))
        }
        None => Ok(null_user()),
    }
}

/// Logout: clear the session cookie.
///
/// POST /api/v1/auth/logout
#[post("/auth/logout")]
pub async fn logout(config: web::Data<Config>) -> HttpResponse {
    let is_prod = config.environment.is_production();
    let mut clear = session_cookie(SESSION_COOKIE, String::new(), is_prod);
    clear.make_removal();

    HttpResponse::Ok()
        .cookie(clear)
        .json(serde_json::json!({ "message": "Logged out" }))
}

// ============================================================================
// Session JWT
// ============================================================================

/// Create a signed session token for `user_id`.
pub fn create_session_token(
    user_id: Uuid,
    username: &str,
    secret: &SecretString,
    ttl_secs: u64,
) -> AppResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(ttl_secs as i64);

    let claims = SessionClaims {
        sub: user_id.to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
        user_id: user_id.to_string(),
        username: username.to_string(),
    };

    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| AppError::InvalidInput(format!("Failed to create session token: {}", e)))
}

/// Verify a session JWT and return claims.
pub fn verify_session_token(token: &str, secret: &SecretString) -> Result<SessionClaims, String> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_aud = false;

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| format!("Invalid session token: {}", e))?;

    Ok(token_data.claims)
}

// ============================================================================
// Types
// ============================================================================

#[derive(serde::Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: Option<String>,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}
