//! Migration: Create repos table.
//!
//! Repositories mirrored from GitHub, upserted by the GitHub repository id.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE repos (
                    id UUID PRIMARY KEY,
                    github_id VARCHAR(32) NOT NULL,
                    name VARCHAR(255) NOT NULL,
                    full_name VARCHAR(512) NOT NULL,
                    html_url VARCHAR(1024),
                    description TEXT,
                    language VARCHAR(100),
                    private BOOLEAN NOT NULL DEFAULT FALSE,
                    fork BOOLEAN NOT NULL DEFAULT FALSE,
                    auto_audit BOOLEAN NOT NULL DEFAULT FALSE,
                    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                -- Upsert key
                CREATE UNIQUE INDEX idx_repos_github_id ON repos(github_id);

                -- Owner listing and bulk delete
                CREATE INDEX idx_repos_owner_id ON repos(owner_id);

                CREATE TRIGGER update_repos_updated_at
                    BEFORE UPDATE ON repos
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_repos_updated_at ON repos;
                DROP TABLE IF EXISTS repos CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
