//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::entity::user::{self, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::user::{GitHubUserInfo, User};

/// Find or create a user by GitHub ID. Refreshes profile and token on each login.
pub async fn upsert_from_github(
    db: &DatabaseConnection,
    info: &GitHubUserInfo,
    email: Option<&str>,
    access_token: &SecretString,
) -> AppResult<User> {
    let github_id = info.id.to_string();
    let now = Utc::now();

    let existing = UserEntity::find()
        .filter(user::Column::GithubId.eq(github_id.as_str()))
        .one(db)
        .await?;

    if let Some(m) = existing {
        let mut active: user::ActiveModel = m.into();
        active.username = Set(info.login.clone());
        active.display_name = Set(info.name.clone());
        active.avatar_url = Set(info.avatar_url.clone());
        active.email = Set(email.map(|s| s.to_string()));
        active.access_token = Set(Some(access_token.expose_secret().to_string()));
        active.last_login_at = Set(Some(now));
        let updated = active.update(db).await?;
        return Ok(model_to_user(updated));
    }

    let id = Uuid::new_v4();
    let model = user::ActiveModel {
        id: Set(id),
        github_id: Set(github_id),
        username: Set(info.login.clone()),
        display_name: Set(info.name.clone()),
        avatar_url: Set(info.avatar_url.clone()),
        email: Set(email.map(|s| s.to_string())),
        access_token: Set(Some(access_token.expose_secret().to_string())),
        last_login_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    UserEntity::insert(model).exec(db).await?;

    // Fetch back the inserted user
    let inserted = UserEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Database("Failed to fetch newly inserted user".to_string()))?;

    Ok(model_to_user(inserted))
}

/// Find a user by ID.
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<User>> {
    let result = UserEntity::find_by_id(id).one(db).await?;
    Ok(result.map(model_to_user))
}

/// Find a user by GitHub ID.
pub async fn find_by_github_id(db: &DatabaseConnection, github_id: &str) -> AppResult<Option<User>> {
    let result = UserEntity::find()
        .filter(user::Column::GithubId.eq(github_id))
        .one(db)
        .await?;
    Ok(result.map(model_to_user))
}

pub(crate) fn model_to_user(m: user::Model) -> User {
    User {
        id: m.id,
        github_id: m.github_id,
        username: m.username,
        display_name: m.display_name,
        avatar_url: m.avatar_url,
        email: m.email,
        access_token: m
            .access_token
            .filter(|t| !t.is_empty())
            .map(SecretString::from),
        last_login_at: m.last_login_at,
        created_at: m.created_at,
    }
}
