//! Migration: Create commits table.

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
                CREATE TABLE commits (
                    id UUID PRIMARY KEY,
                    sha VARCHAR(64) NOT NULL,
                    message TEXT NOT NULL,
                    author VARCHAR(255) NOT NULL,
                    date TIMESTAMPTZ NOT NULL,
                    repo_id UUID NOT NULL REFERENCES repos(id) ON DELETE CASCADE,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE UNIQUE INDEX idx_commits_sha ON commits(sha);

                -- Per-repo history, newest first
                CREATE INDEX idx_commits_repo_date ON commits(repo_id, date DESC);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS commits CASCADE;")
            .await?;

        Ok(())
    }
}
