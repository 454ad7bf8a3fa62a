//! Migration: Create commit_files table.
//!
//! One row per (sha, normalized path). The unique index is what makes
//! concurrent create-then-update reconciliation safe.

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
                CREATE TABLE commit_files (
                    id UUID PRIMARY KEY,
                    sha VARCHAR(64) NOT NULL,
                    path TEXT NOT NULL,

                    -- {status, additions, deletions, changes, patch, raw_url, filename}
                    content JSONB NOT NULL,

                    commit_id UUID NOT NULL REFERENCES commits(id) ON DELETE CASCADE,

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE UNIQUE INDEX idx_commit_files_sha_path ON commit_files(sha, path);

                CREATE INDEX idx_commit_files_commit_id ON commit_files(commit_id);

                CREATE TRIGGER update_commit_files_updated_at
                    BEFORE UPDATE ON commit_files
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
                DROP TRIGGER IF EXISTS update_commit_files_updated_at ON commit_files;
                DROP TABLE IF EXISTS commit_files CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
